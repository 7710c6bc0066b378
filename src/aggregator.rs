use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::errors::EngineError;
use crate::positions;
use crate::profile::ProfileSnapshot;
use crate::provider::{DataProvider, RawRow};
use crate::season_stats::{
    self, GameContext, MasterTable, SeasonStatRecord, StatFamily, aggregate_weekly_rows,
};

/// Which columns `career_totals` and `master_table` keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnScope {
    /// The column set that matters for the player's position side.
    PositionAware,
    /// The full union of columns regardless of position.
    Full,
}

/// How postseason rows appear in the master table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostseasonHandling {
    /// One row per season, regular season and postseason summed null-safely.
    Combined,
    /// One row per season and game context.
    Separate,
    /// Regular-season rows only.
    Exclude,
}

/// Options for `StatsAggregator::master_table`.
#[derive(Debug, Clone, PartialEq)]
pub struct MasterTableOptions {
    /// Seasons to cover; defaults to the player's full active span.
    pub seasons: Option<Vec<u16>>,
    /// Merge the tracking family for seasons inside its supported range.
    pub include_tracking: bool,
    pub postseason: PostseasonHandling,
    pub columns: ColumnScope,
}

impl Default for MasterTableOptions {
    fn default() -> Self {
        Self {
            seasons: None,
            include_tracking: true,
            postseason: PostseasonHandling::Combined,
            columns: ColumnScope::Full,
        }
    }
}

/// Career sums across every fetched season of one family.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CareerTotals {
    pub player_id: String,
    pub games_played: u32,
    pub totals: BTreeMap<String, f64>,
}

/// Prefix applied to tracking-family columns when they merge into the master
/// table, so both families can carry e.g. an `attempts` column.
pub const TRACKING_COLUMN_PREFIX: &str = "tracking_";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct StatsCacheKey {
    family: StatFamily,
    seasons: Vec<u16>,
}

/// Per-player fetch/validate/cache/aggregate engine over the stat families.
///
/// One instance serves one resolved player from one caller thread. Every
/// fetch is idempotent: results cache by (family, season set) and identical
/// calls return the cached records without another provider hit. Failed
/// loads never insert or overwrite a cache entry.
pub struct StatsAggregator {
    provider: Arc<dyn DataProvider>,
    profile: ProfileSnapshot,
    cache: HashMap<StatsCacheKey, Vec<SeasonStatRecord>>,
}

impl StatsAggregator {
    pub fn new(provider: Arc<dyn DataProvider>, profile: ProfileSnapshot) -> Self {
        Self {
            provider,
            profile,
            cache: HashMap::new(),
        }
    }

    pub fn profile(&self) -> &ProfileSnapshot {
        &self.profile
    }

    /// Whether the player lines up on defense; drives the position-aware
    /// column sets.
    pub fn is_defensive(&self) -> bool {
        positions::is_defensive(
            self.profile.position.as_deref(),
            self.profile.position_group.as_deref(),
        )
    }

    /// Box-score columns that matter for this player's position side.
    /// Callers wanting everything use `ColumnScope::Full` instead.
    pub fn relevant_columns(&self) -> &'static [&'static str] {
        positions::relevant_stat_columns(self.is_defensive())
    }

    /// The player's active seasons clamped to a family's supported range.
    /// Empty when the player's span predates the family entirely.
    pub fn default_seasons(&self, family: StatFamily) -> Vec<u16> {
        let (earliest, latest) = family.season_range();
        let (start, end) = self.profile.active_span(
            season_stats::EARLIEST_BASIC_SEASON,
            season_stats::latest_season(),
        );
        let start = start.max(earliest);
        let end = end.min(latest);
        if start > end {
            return Vec::new();
        }
        (start..=end).collect()
    }

    /// Fetch and aggregate the requested seasons for one family.
    ///
    /// Validation is all-or-nothing: if any requested season falls outside
    /// the family's supported range the whole call fails, naming every
    /// offending season, and nothing is fetched or cached. Tracking-family
    /// rows match by display name (the source lacks the canonical id), so
    /// two players sharing a name can collide; every matched row is kept and
    /// the caller applies further filtering if needed.
    pub fn fetch_seasons(
        &mut self,
        seasons: &[u16],
        family: StatFamily,
    ) -> Result<Vec<SeasonStatRecord>, EngineError> {
        let key = self.validate(seasons, family)?;
        if key.seasons.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit.clone());
        }
        let records = self.load_records(&key)?;
        self.cache.insert(key, records.clone());
        Ok(records)
    }

    /// Bypass the cache and replace the entry wholesale. On failure the
    /// previously cached records stay intact and readable.
    pub fn refresh_seasons(
        &mut self,
        seasons: &[u16],
        family: StatFamily,
    ) -> Result<Vec<SeasonStatRecord>, EngineError> {
        let key = self.validate(seasons, family)?;
        if key.seasons.is_empty() {
            return Ok(Vec::new());
        }
        let records = self.load_records(&key)?;
        self.cache.insert(key, records.clone());
        Ok(records)
    }

    /// Sum every fetched season of a family into career totals.
    ///
    /// Uses whatever records are already cached for the family, fetching the
    /// player's default span first when nothing is. The column set comes
    /// from the player's position via a static lookup unless the caller
    /// asks for the full union.
    pub fn career_totals(
        &mut self,
        family: StatFamily,
        scope: ColumnScope,
    ) -> Result<CareerTotals, EngineError> {
        let mut seen: BTreeMap<(u16, GameContext), SeasonStatRecord> = BTreeMap::new();
        for (key, records) in &self.cache {
            if key.family != family {
                continue;
            }
            for record in records {
                seen.entry((record.season, record.context))
                    .or_insert_with(|| record.clone());
            }
        }
        if seen.is_empty() {
            let span = self.default_seasons(family);
            if !span.is_empty() {
                for record in self.fetch_seasons(&span, family)? {
                    seen.insert((record.season, record.context), record);
                }
            }
        }

        let defensive = self.is_defensive();
        let mut totals: BTreeMap<String, f64> = BTreeMap::new();
        let mut games_played = 0u32;
        for record in seen.values() {
            games_played += record.games_played;
            match scope {
                ColumnScope::PositionAware => {
                    for (label, column) in positions::career_total_columns(defensive) {
                        if let Some(value) = record.value(column) {
                            *totals.entry((*label).to_string()).or_insert(0.0) += value;
                        }
                    }
                }
                ColumnScope::Full => {
                    for (column, value) in record.iter() {
                        *totals.entry(column.to_string()).or_insert(0.0) += value;
                    }
                }
            }
        }
        Ok(CareerTotals {
            player_id: self.profile.canonical_id.clone(),
            games_played,
            totals,
        })
    }

    /// Build the unioned season-by-season table.
    ///
    /// Fetches the basic family for the requested seasons (the player's full
    /// active span when unspecified), optionally merges the tracking family
    /// for seasons inside its range, and applies the requested postseason
    /// handling. Every requested season yields a row; a season without data
    /// appears with zero games and every column null, and seasons before the
    /// tracking range keep their tracking columns null.
    pub fn master_table(
        &mut self,
        options: &MasterTableOptions,
    ) -> Result<MasterTable, EngineError> {
        let mut seasons = match &options.seasons {
            Some(explicit) => explicit.clone(),
            None => self.default_seasons(StatFamily::Basic),
        };
        seasons.sort_unstable();
        seasons.dedup();
        if seasons.is_empty() {
            return Ok(MasterTable::empty());
        }

        let basic = self.fetch_seasons(&seasons, StatFamily::Basic)?;
        let mut rows: Vec<SeasonStatRecord> = match options.postseason {
            PostseasonHandling::Exclude => basic
                .into_iter()
                .filter(|record| record.context == GameContext::RegularSeason)
                .collect(),
            PostseasonHandling::Separate => basic,
            PostseasonHandling::Combined => season_stats::combine_contexts(basic),
        };

        for &season in &seasons {
            if !rows.iter().any(|record| record.season == season) {
                rows.push(SeasonStatRecord::empty(
                    &self.profile.canonical_id,
                    season,
                    GameContext::RegularSeason,
                ));
            }
        }
        rows.sort_by_key(|record| (record.season, record.context));

        let kind = positions::tracking_kind_for(self.profile.position.as_deref());
        if options.include_tracking {
            let tracking_family = StatFamily::Tracking(kind);
            let in_range: Vec<u16> = seasons
                .iter()
                .copied()
                .filter(|&season| tracking_family.supports(season))
                .collect();
            if !in_range.is_empty() {
                let tracking = self.fetch_seasons(&in_range, tracking_family)?;
                // Postseason tracking rows are sparse; the combined view
                // carries the regular-season tracking values.
                let mut by_key: HashMap<(u16, GameContext), &SeasonStatRecord> = HashMap::new();
                for record in &tracking {
                    by_key.entry((record.season, record.context)).or_insert(record);
                }
                for row in &mut rows {
                    let lookup = match options.postseason {
                        PostseasonHandling::Separate => (row.season, row.context),
                        _ => (row.season, GameContext::RegularSeason),
                    };
                    if let Some(tracked) = by_key.get(&lookup) {
                        row.merge_prefixed(tracked, TRACKING_COLUMN_PREFIX);
                    }
                }
            }
        }

        let columns = self.master_columns(&rows, options.columns, kind);
        debug!(
            player = self.profile.canonical_id.as_str(),
            rows = rows.len(),
            columns = columns.len(),
            "master table assembled"
        );
        Ok(MasterTable::new(columns, rows))
    }

    /// Stable stat-column order: position-aware lists keep their defined
    /// order; the full union sorts lexicographically.
    fn master_columns(
        &self,
        rows: &[SeasonStatRecord],
        scope: ColumnScope,
        kind: crate::provider::TrackingKind,
    ) -> Vec<String> {
        let mut present: BTreeMap<&str, ()> = BTreeMap::new();
        for row in rows {
            for column in row.columns() {
                present.insert(column, ());
            }
        }
        match scope {
            ColumnScope::Full => present.keys().map(|c| (*c).to_string()).collect(),
            ColumnScope::PositionAware => {
                let mut out = Vec::new();
                for column in positions::relevant_stat_columns(self.is_defensive()) {
                    if present.contains_key(column) {
                        out.push((*column).to_string());
                    }
                }
                for column in positions::relevant_tracking_columns(kind) {
                    let prefixed = format!("{TRACKING_COLUMN_PREFIX}{column}");
                    if present.contains_key(prefixed.as_str()) {
                        out.push(prefixed);
                    }
                }
                out
            }
        }
    }

    fn validate(
        &self,
        seasons: &[u16],
        family: StatFamily,
    ) -> Result<StatsCacheKey, EngineError> {
        let (valid, invalid) = family.split_seasons(seasons);
        if !invalid.is_empty() {
            let (earliest, latest) = family.season_range();
            return Err(EngineError::SeasonNotAvailable {
                family,
                invalid,
                earliest,
                latest,
            });
        }
        Ok(StatsCacheKey {
            family,
            seasons: valid,
        })
    }

    fn load_records(&self, key: &StatsCacheKey) -> Result<Vec<SeasonStatRecord>, EngineError> {
        let rows = match key.family {
            StatFamily::Basic => self.provider.load_season_stats(&key.seasons)?,
            StatFamily::Tracking(kind) => {
                self.provider.load_tracking_stats(&key.seasons, kind)?
            }
        };
        let mine: Vec<&RawRow> = match key.family {
            StatFamily::Basic => rows
                .iter()
                .filter(|row| {
                    row.text("player_id")
                        .is_some_and(|id| id == self.profile.canonical_id)
                })
                .collect(),
            StatFamily::Tracking(_) => rows
                .iter()
                .filter(|row| {
                    row.first_text(&["player_display_name", "player_name"])
                        .is_some_and(|name| name.eq_ignore_ascii_case(&self.profile.full_name))
                })
                .collect(),
        };
        let records = aggregate_weekly_rows(&self.profile.canonical_id, &mine, key.family);
        debug!(
            player = self.profile.canonical_id.as_str(),
            family = %key.family,
            weekly_rows = mine.len(),
            records = records.len(),
            "season records aggregated"
        );
        Ok(records)
    }
}
