use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::errors::EngineError;
use crate::positions;
use crate::profile::ProfileSnapshot;
use crate::provider::RawRow;
use crate::roster_cache::{CANONICAL_ID_COLUMN, RosterCache};
use crate::team_directory;

/// Name columns checked by the exact and fallback passes, in match order.
pub const NAME_COLUMNS: [&str; 6] = [
    "display_name",
    "full_name",
    "football_name",
    "short_name",
    "name",
    "merge_name",
];

/// Immutable search input: a required name plus optional narrowing filters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchCriteria {
    name: String,
    team: Option<String>,
    draft_year: Option<u16>,
    draft_team: Option<String>,
    position: Option<String>,
}

impl SearchCriteria {
    /// Rejects empty or whitespace-only names up front; input errors never
    /// touch the caches.
    pub fn new(name: &str) -> Result<Self, EngineError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(EngineError::InvalidQuery(
                "player name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            name: trimmed.to_string(),
            team: None,
            draft_year: None,
            draft_team: None,
            position: None,
        })
    }

    pub fn with_team(mut self, team: &str) -> Self {
        self.team = Some(team.trim().to_string());
        self
    }

    pub fn with_draft_year(mut self, year: u16) -> Self {
        self.draft_year = Some(year);
        self
    }

    pub fn with_draft_team(mut self, team: &str) -> Self {
        self.draft_team = Some(team.trim().to_string());
        self
    }

    pub fn with_position(mut self, position: &str) -> Self {
        self.position = Some(position.trim().to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// How to handle a query that still matches several players after filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmbiguityMode {
    /// Pick the single most notable candidate deterministically.
    AutoSelect,
    /// Fail with the full candidate list so the caller can refine.
    Fail,
}

/// One surviving roster row, summarized for disambiguation and error
/// reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub canonical_id: String,
    pub display_name: String,
    pub position: Option<String>,
    pub team: Option<String>,
    pub active: bool,
    pub experience: i64,
    pub last_active_season: i64,
    pub draft_pick: Option<i64>,
}

impl Candidate {
    fn from_row(row: &RawRow) -> Option<Self> {
        let canonical_id = row.text(CANONICAL_ID_COLUMN)?.to_string();
        let display_name = row
            .first_text(&NAME_COLUMNS)
            .unwrap_or("Unknown Player")
            .to_string();
        Some(Self {
            canonical_id,
            display_name,
            position: row.text("position").map(str::to_string),
            team: row
                .first_text(&["latest_team", "team"])
                .map(str::to_string),
            active: row.text("status").is_some_and(|s| s == "ACT"),
            experience: row
                .first_integer(&["years_of_experience", "years_exp"])
                .unwrap_or(0),
            last_active_season: row
                .first_integer(&["last_season", "draft_year", "rookie_season"])
                .unwrap_or(0),
            draft_pick: row.first_integer(&["draft_pick", "draft_pick_alt"]),
        })
    }

    /// Deterministic notability order, most notable first: active status,
    /// then career experience, then most recent active season, then draft
    /// capital (lower pick wins, undrafted last), then canonical id
    /// ascending so identical inputs always reproduce the same pick.
    fn notability_cmp(&self, other: &Candidate) -> Ordering {
        other
            .active
            .cmp(&self.active)
            .then_with(|| other.experience.cmp(&self.experience))
            .then_with(|| other.last_active_season.cmp(&self.last_active_season))
            .then_with(|| draft_capital(self.draft_pick).cmp(&draft_capital(other.draft_pick)))
            .then_with(|| self.canonical_id.cmp(&other.canonical_id))
    }
}

fn draft_capital(pick: Option<i64>) -> i64 {
    pick.unwrap_or(i64::MAX)
}

/// Resolves a search query to exactly one player profile against the
/// combined roster/crosswalk view.
pub struct PlayerFinder {
    cache: Arc<RosterCache>,
}

impl PlayerFinder {
    pub fn new(cache: Arc<RosterCache>) -> Self {
        Self { cache }
    }

    /// Resolve with automatic disambiguation of multi-candidate matches.
    pub fn resolve(&self, criteria: &SearchCriteria) -> Result<ProfileSnapshot, EngineError> {
        self.resolve_with(criteria, AmbiguityMode::AutoSelect)
    }

    pub fn resolve_with(
        &self,
        criteria: &SearchCriteria,
        mode: AmbiguityMode,
    ) -> Result<ProfileSnapshot, EngineError> {
        // Normalize team filters before touching any data: an unknown team is
        // an input error, not a failed match.
        let team_code = criteria
            .team
            .as_deref()
            .map(team_directory::normalize)
            .transpose()?;
        let draft_team_code = criteria
            .draft_team
            .as_deref()
            .map(team_directory::normalize)
            .transpose()?;

        let dataset = self.cache.combined()?;

        let mut matched: Vec<&RawRow> = exact_name_matches(&dataset, &criteria.name);
        if matched.is_empty() {
            // The fallback only activates when the exact pass finds nothing;
            // it never widens or narrows a successful exact match.
            matched = token_fallback_matches(&dataset, &criteria.name);
        }

        let mut candidates = dedup_by_canonical_id(matched);

        if let Some(code) = team_code {
            candidates.retain(|row| team_column_matches(row, &["latest_team", "team"], code));
        }
        if let Some(code) = draft_team_code {
            candidates.retain(|row| team_column_matches(row, &["draft_team", "draft_team_alt"], code));
        }
        if let Some(year) = criteria.draft_year {
            candidates.retain(|row| {
                row.first_integer(&["draft_year", "draft_year_alt"]) == Some(i64::from(year))
            });
        }
        if let Some(position) = criteria.position.as_deref() {
            candidates.retain(|row| {
                positions::filter_matches(position, row.text("position"), row.text("position_group"))
            });
        }

        if candidates.is_empty() {
            // Filters that eliminate every name match are still a not-found
            // failure; the unfiltered set is never silently restored.
            return Err(EngineError::PlayerNotFound);
        }

        if candidates.len() == 1 {
            return ProfileSnapshot::from_row(candidates[0]);
        }

        let mut scored: Vec<(Candidate, &RawRow)> = candidates
            .iter()
            .filter_map(|row| Candidate::from_row(row).map(|c| (c, *row)))
            .collect();
        scored.sort_by(|a, b| a.0.notability_cmp(&b.0));

        match mode {
            AmbiguityMode::AutoSelect => {
                let (winner, row) = &scored[0];
                debug!(
                    id = winner.canonical_id.as_str(),
                    name = winner.display_name.as_str(),
                    candidates = scored.len(),
                    "auto-selected most notable candidate"
                );
                ProfileSnapshot::from_row(row)
            }
            AmbiguityMode::Fail => {
                Err(EngineError::AmbiguousQuery(
                    scored.into_iter().map(|(c, _)| c).collect(),
                ))
            }
        }
    }
}

fn exact_name_matches<'a>(dataset: &'a [RawRow], name: &str) -> Vec<&'a RawRow> {
    dataset
        .iter()
        .filter(|row| {
            NAME_COLUMNS
                .iter()
                .filter_map(|column| row.text(column))
                .any(|value| value.eq_ignore_ascii_case(name))
        })
        .collect()
}

/// Lowercase alphanumeric name tokens.
fn tokenize(value: &str) -> BTreeSet<String> {
    value
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_ascii_lowercase())
        .collect()
}

/// Token match: the candidate's combined name tokens are a superset of the
/// query tokens, or (for multi-token queries) miss exactly one. Covers legal
/// name changes after the roster snapshot, e.g. a newly hyphenated surname.
fn token_fallback_matches<'a>(dataset: &'a [RawRow], name: &str) -> Vec<&'a RawRow> {
    let query_tokens = tokenize(name);
    if query_tokens.is_empty() {
        return Vec::new();
    }
    dataset
        .iter()
        .filter(|row| {
            let mut candidate_tokens: BTreeSet<String> = BTreeSet::new();
            for column in NAME_COLUMNS {
                if let Some(value) = row.text(column) {
                    candidate_tokens.extend(tokenize(value));
                }
            }
            let missing = query_tokens.difference(&candidate_tokens).count();
            missing == 0 || (missing == 1 && query_tokens.len() > 1)
        })
        .collect()
}

/// A join against several crosswalk sources can legally repeat an entity;
/// keep the first row per canonical id and drop rows without one.
fn dedup_by_canonical_id(rows: Vec<&RawRow>) -> Vec<&RawRow> {
    let mut seen: HashSet<&str> = HashSet::new();
    rows.into_iter()
        .filter(|row| match row.text(CANONICAL_ID_COLUMN) {
            Some(id) => seen.insert(id),
            None => false,
        })
        .collect()
}

fn team_column_matches(row: &RawRow, columns: &[&str], code: &str) -> bool {
    columns.iter().any(|column| {
        row.text(column).is_some_and(|value| {
            match team_directory::normalize(value) {
                Ok(candidate_code) => candidate_code == code,
                Err(_) => value.eq_ignore_ascii_case(code),
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_splits_on_punctuation() {
        let tokens = tokenize("Amon-Ra St. Brown");
        let expected: BTreeSet<String> = ["amon", "ra", "st", "brown"]
            .into_iter()
            .map(str::to_string)
            .collect();
        assert_eq!(tokens, expected);
    }

    #[test]
    fn empty_names_are_rejected() {
        assert!(matches!(
            SearchCriteria::new("   "),
            Err(EngineError::InvalidQuery(_))
        ));
        assert!(SearchCriteria::new("Josh Allen").is_ok());
    }

    #[test]
    fn notability_order_is_total_and_deterministic() {
        let base = Candidate {
            canonical_id: "00-002".to_string(),
            display_name: "A".to_string(),
            position: None,
            team: None,
            active: true,
            experience: 5,
            last_active_season: 2025,
            draft_pick: Some(7),
        };
        let retired = Candidate {
            active: false,
            ..base.clone()
        };
        assert_eq!(base.notability_cmp(&retired), Ordering::Less);

        let rookie = Candidate {
            experience: 1,
            ..base.clone()
        };
        assert_eq!(base.notability_cmp(&rookie), Ordering::Less);

        let undrafted = Candidate {
            draft_pick: None,
            ..base.clone()
        };
        assert_eq!(base.notability_cmp(&undrafted), Ordering::Less);

        // Full tie falls back to canonical id ascending.
        let twin = Candidate {
            canonical_id: "00-001".to_string(),
            ..base.clone()
        };
        assert_eq!(twin.notability_cmp(&base), Ordering::Less);
    }
}
