use std::collections::BTreeMap;

use anyhow::anyhow;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::errors::EngineError;
use crate::provider::RawRow;
use crate::roster_cache::CANONICAL_ID_COLUMN;

const UNKNOWN: &str = "unknown";

/// Cross-platform identifier sources carried by the crosswalk table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum IdSource {
    Gsis,
    Espn,
    Pfr,
    Pff,
    Sportradar,
    Esb,
    Otc,
}

impl IdSource {
    pub const ALL: [IdSource; 7] = [
        IdSource::Gsis,
        IdSource::Espn,
        IdSource::Pfr,
        IdSource::Pff,
        IdSource::Sportradar,
        IdSource::Esb,
        IdSource::Otc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IdSource::Gsis => "gsis_id",
            IdSource::Espn => "espn_id",
            IdSource::Pfr => "pfr_id",
            IdSource::Pff => "pff_id",
            IdSource::Sportradar => "sportradar_id",
            IdSource::Esb => "esb_id",
            IdSource::Otc => "otc_id",
        }
    }
}

/// Immutable snapshot of a resolved player's identity and biography.
///
/// Built once per resolution from the joined roster/crosswalk row. The
/// `external_ids` map always carries every `IdSource` key; an id the
/// crosswalk doesn't know is `None`, never a missing entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileSnapshot {
    pub canonical_id: String,
    pub full_name: String,
    pub short_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub college: Option<String>,
    pub position: Option<String>,
    pub position_group: Option<String>,
    pub height: Option<i64>,
    pub weight: Option<i64>,
    pub draft_year: Option<u16>,
    pub draft_round: Option<u16>,
    pub draft_pick: Option<u16>,
    pub draft_team: Option<String>,
    pub rookie_season: Option<u16>,
    pub last_season: Option<u16>,
    pub external_ids: BTreeMap<IdSource, Option<String>>,
}

impl ProfileSnapshot {
    /// Validated factory over a joined roster/crosswalk row. Crosswalk columns
    /// that collided with roster columns carry an `_alt` suffix; the first
    /// non-empty value wins.
    pub fn from_row(row: &RawRow) -> Result<Self, EngineError> {
        let canonical_id = row
            .first_text(&[CANONICAL_ID_COLUMN, "gsis_id_alt"])
            .ok_or_else(|| EngineError::Provider(anyhow!("roster row is missing the canonical id")))?
            .to_string();

        let full_name = row
            .first_text(&["full_name", "display_name", "name"])
            .unwrap_or("Unknown Player")
            .to_string();

        let mut external_ids = BTreeMap::new();
        for source in IdSource::ALL {
            let column = source.as_str();
            let alt = format!("{column}_alt");
            let value = row
                .first_text(&[column, alt.as_str()])
                .map(|v| v.to_string());
            external_ids.insert(source, value);
        }

        Ok(Self {
            canonical_id,
            full_name,
            short_name: own(row.first_text(&["short_name", "football_name"])),
            birth_date: parse_date(row.first_text(&["birth_date", "birthdate"])),
            college: own(row.first_text(&["college_name", "college"])),
            position: own(row.first_text(&["position", "position_alt"])),
            position_group: own(row.first_text(&["position_group"])),
            height: row.first_integer(&["height", "height_alt"]),
            weight: row.first_integer(&["weight", "weight_alt"]),
            draft_year: small(row.first_integer(&["draft_year", "draft_year_alt"])),
            draft_round: small(row.first_integer(&["draft_round", "draft_round_alt"])),
            draft_pick: small(row.first_integer(&["draft_pick", "draft_pick_alt"])),
            draft_team: own(row.first_text(&["draft_team", "draft_team_alt"])),
            rookie_season: small(row.first_integer(&["rookie_season", "rookie_year"])),
            last_season: small(row.first_integer(&["last_season", "last_year"])),
            external_ids,
        })
    }

    /// Flat attribute list for display or serialization. Every field appears;
    /// absent values render as the explicit "unknown" marker.
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        let mut out = vec![
            ("canonical_id", self.canonical_id.clone()),
            ("full_name", self.full_name.clone()),
            ("short_name", text_or_unknown(self.short_name.as_deref())),
            (
                "birth_date",
                self.birth_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| UNKNOWN.to_string()),
            ),
            ("college", text_or_unknown(self.college.as_deref())),
            ("position", text_or_unknown(self.position.as_deref())),
            ("position_group", text_or_unknown(self.position_group.as_deref())),
            ("height", num_or_unknown(self.height)),
            ("weight", num_or_unknown(self.weight)),
            ("draft_year", num_or_unknown(self.draft_year.map(i64::from))),
            ("draft_round", num_or_unknown(self.draft_round.map(i64::from))),
            ("draft_pick", num_or_unknown(self.draft_pick.map(i64::from))),
            ("draft_team", text_or_unknown(self.draft_team.as_deref())),
            ("rookie_season", num_or_unknown(self.rookie_season.map(i64::from))),
            ("last_season", num_or_unknown(self.last_season.map(i64::from))),
        ];
        for source in IdSource::ALL {
            let value = self
                .external_ids
                .get(&source)
                .and_then(|v| v.as_deref());
            out.push((source.as_str(), text_or_unknown(value)));
        }
        out
    }

    /// First and last seasons the player was active, clamped to the given
    /// bounds. Falls back to the draft year when the roster lacks a rookie
    /// season, and to the full range when nothing is known.
    pub fn active_span(&self, earliest: u16, latest: u16) -> (u16, u16) {
        let start = self
            .rookie_season
            .or(self.draft_year)
            .unwrap_or(earliest)
            .clamp(earliest, latest);
        let end = self.last_season.unwrap_or(latest).clamp(start, latest);
        (start, end)
    }
}

fn own(value: Option<&str>) -> Option<String> {
    value.map(|v| v.to_string())
}

fn small(value: Option<i64>) -> Option<u16> {
    value.and_then(|v| u16::try_from(v).ok())
}

fn text_or_unknown(value: Option<&str>) -> String {
    value.unwrap_or(UNKNOWN).to_string()
}

fn num_or_unknown(value: Option<i64>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    let raw = value?;
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            debug!(value = raw, "unparseable birth date");
            None
        }
    }
}
