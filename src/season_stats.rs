use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::provider::{RawRow, TrackingKind, value_as_number};

/// First season covered by the basic box-score family.
pub const EARLIEST_BASIC_SEASON: u16 = 1999;

/// First season covered by the advanced tracking family.
pub const EARLIEST_TRACKING_SEASON: u16 = 2016;

const DEFAULT_LATEST_SEASON: u16 = 2025;

/// Latest completed or in-progress season. Compile-time default, overridable
/// with `NFLSCOPE_LATEST_SEASON` for embedders tracking a new season before a
/// release; read once per process.
pub fn latest_season() -> u16 {
    static LATEST: OnceCell<u16> = OnceCell::new();
    *LATEST.get_or_init(|| {
        std::env::var("NFLSCOPE_LATEST_SEASON")
            .ok()
            .and_then(|val| val.parse::<u16>().ok())
            .unwrap_or(DEFAULT_LATEST_SEASON)
    })
}

/// A distinct source/category of statistics with its own supported season
/// range and column set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StatFamily {
    Basic,
    Tracking(TrackingKind),
}

impl StatFamily {
    /// Inclusive supported season range.
    pub fn season_range(&self) -> (u16, u16) {
        match self {
            StatFamily::Basic => (EARLIEST_BASIC_SEASON, latest_season()),
            StatFamily::Tracking(_) => (EARLIEST_TRACKING_SEASON, latest_season()),
        }
    }

    pub fn supports(&self, season: u16) -> bool {
        let (earliest, latest) = self.season_range();
        (earliest..=latest).contains(&season)
    }

    /// Requested seasons split into supported and unsupported, both sorted
    /// and deduplicated.
    pub fn split_seasons(&self, seasons: &[u16]) -> (Vec<u16>, Vec<u16>) {
        let mut valid = Vec::new();
        let mut invalid = Vec::new();
        for &season in seasons {
            if self.supports(season) {
                valid.push(season);
            } else {
                invalid.push(season);
            }
        }
        valid.sort_unstable();
        valid.dedup();
        invalid.sort_unstable();
        invalid.dedup();
        (valid, invalid)
    }
}

impl fmt::Display for StatFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatFamily::Basic => write!(f, "basic"),
            StatFamily::Tracking(kind) => write!(f, "tracking ({})", kind.as_str()),
        }
    }
}

/// Regular season vs. postseason rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum GameContext {
    RegularSeason,
    Postseason,
}

impl GameContext {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "REG" => Some(GameContext::RegularSeason),
            "POST" => Some(GameContext::Postseason),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GameContext::RegularSeason => "REG",
            GameContext::Postseason => "POST",
        }
    }
}

/// One aggregated row per (player, season, game context).
///
/// `values` holds only the columns that applied: an absent column IS the
/// null, so sums over records are null-safe by construction. Records are
/// never mutated after the aggregation that builds them; a re-fetch builds
/// replacements.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonStatRecord {
    pub player_id: String,
    pub season: u16,
    pub context: GameContext,
    pub games_played: u32,
    values: BTreeMap<String, f64>,
}

impl SeasonStatRecord {
    pub(crate) fn empty(player_id: &str, season: u16, context: GameContext) -> Self {
        Self {
            player_id: player_id.to_string(),
            season,
            context,
            games_played: 0,
            values: BTreeMap::new(),
        }
    }

    /// Column value, None when the column didn't apply to this season.
    pub fn value(&self, column: &str) -> Option<f64> {
        self.values.get(column).copied()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub(crate) fn insert_value(&mut self, column: &str, value: f64) {
        self.values.insert(column.to_string(), value);
    }

    /// Copy another record's columns into this one under a prefix.
    pub(crate) fn merge_prefixed(&mut self, other: &SeasonStatRecord, prefix: &str) {
        for (column, value) in other.iter() {
            self.values.insert(format!("{prefix}{column}"), value);
        }
    }

    /// Null-safe additive merge: present + absent = present.
    pub(crate) fn absorb(&mut self, other: &SeasonStatRecord) {
        self.games_played += other.games_played;
        for (column, value) in other.iter() {
            *self.values.entry(column.to_string()).or_insert(0.0) += value;
        }
    }
}

/// Identity/bookkeeping columns never treated as stats.
const META_COLUMNS: &[&str] = &[
    "season",
    "week",
    "player_id",
    "player_name",
    "player_display_name",
    "player_position",
    "position",
    "position_group",
    "team",
    "team_abbr",
    "recent_team",
    "opponent_team",
    "game_id",
    "season_type",
    "headshot_url",
];

/// Tracking columns that sum across weeks; everything else in that family is
/// a per-week average and gets the mean.
const TRACKING_COUNTING_COLUMNS: &[&str] =
    &["attempts", "completions", "carries", "targets", "receptions"];

/// Rate-shaped column suffixes. Summing a weekly rate produces a meaningless
/// value, so the basic-family aggregation drops these; callers derive season
/// rates from the summed numerator/denominator columns instead.
const RATE_SUFFIXES: &[&str] = &["_pct", "_percentage", "_rate", "_rating"];

pub(crate) fn is_meta_column(name: &str) -> bool {
    META_COLUMNS.contains(&name)
}

pub(crate) fn is_rate_column(name: &str) -> bool {
    RATE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

fn is_tracking_counting_column(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    TRACKING_COUNTING_COLUMNS
        .iter()
        .any(|keyword| lower.contains(keyword))
}

/// Roll weekly rows up to one record per (season, game context).
///
/// Basic family: numeric columns sum, rate-shaped columns are dropped.
/// Tracking family: counting columns sum, the rest average across weeks.
/// Rows missing a parseable season are skipped.
pub fn aggregate_weekly_rows(
    player_id: &str,
    rows: &[&RawRow],
    family: StatFamily,
) -> Vec<SeasonStatRecord> {
    struct Bucket {
        games: u32,
        sums: BTreeMap<String, f64>,
        counts: BTreeMap<String, u32>,
    }

    let mut buckets: BTreeMap<(u16, GameContext), Bucket> = BTreeMap::new();

    for row in rows {
        let Some(season) = row.integer("season").and_then(|s| u16::try_from(s).ok()) else {
            continue;
        };
        let context = row
            .text("season_type")
            .and_then(GameContext::from_label)
            .unwrap_or(GameContext::RegularSeason);

        let bucket = buckets.entry((season, context)).or_insert_with(|| Bucket {
            games: 0,
            sums: BTreeMap::new(),
            counts: BTreeMap::new(),
        });
        bucket.games += 1;

        for (column, cell) in row.iter() {
            if is_meta_column(column) {
                continue;
            }
            if matches!(family, StatFamily::Basic) && is_rate_column(column) {
                continue;
            }
            let Some(value) = value_as_number(cell) else {
                continue;
            };
            *bucket.sums.entry(column.to_string()).or_insert(0.0) += value;
            *bucket.counts.entry(column.to_string()).or_insert(0) += 1;
        }
    }

    buckets
        .into_iter()
        .map(|((season, context), bucket)| {
            let mut record = SeasonStatRecord::empty(player_id, season, context);
            record.games_played = bucket.games;
            for (column, sum) in bucket.sums {
                let value = match family {
                    StatFamily::Basic => sum,
                    StatFamily::Tracking(_) => {
                        if is_tracking_counting_column(&column) {
                            sum
                        } else {
                            sum / f64::from(bucket.counts[&column])
                        }
                    }
                };
                record.insert_value(&column, value);
            }
            record
        })
        .collect()
}

/// Collapse per-context records into one record per season (contexts summed
/// null-safely).
pub fn combine_contexts(records: Vec<SeasonStatRecord>) -> Vec<SeasonStatRecord> {
    let mut by_season: BTreeMap<u16, SeasonStatRecord> = BTreeMap::new();
    for record in records {
        match by_season.get_mut(&record.season) {
            Some(existing) => existing.absorb(&record),
            None => {
                let mut merged =
                    SeasonStatRecord::empty(&record.player_id, record.season, GameContext::RegularSeason);
                merged.absorb(&record);
                by_season.insert(record.season, merged);
            }
        }
    }
    by_season.into_values().collect()
}

/// Season-by-season table merged across stat families: one row per season
/// (or per season+context), column set = the union of family columns, with
/// nulls where a family didn't cover a season. Guarantees a stable column
/// ordering and a single-header-row shape for display or export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MasterTable {
    columns: Vec<String>,
    rows: Vec<SeasonStatRecord>,
}

impl MasterTable {
    pub(crate) fn new(columns: Vec<String>, rows: Vec<SeasonStatRecord>) -> Self {
        Self { columns, rows }
    }

    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Stat columns in their stable output order (lead columns excluded).
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[SeasonStatRecord] {
        &self.rows
    }

    /// Full header: fixed lead columns, then the stat columns.
    pub fn header(&self) -> Vec<String> {
        let mut out = vec![
            "season".to_string(),
            "context".to_string(),
            "games_played".to_string(),
        ];
        out.extend(self.columns.iter().cloned());
        out
    }

    /// Header row followed by one row of cells per season; null cells render
    /// empty. Suitable for tabular display or delimited export.
    pub fn to_string_rows(&self) -> Vec<Vec<String>> {
        let mut out = Vec::with_capacity(self.rows.len() + 1);
        out.push(self.header());
        for row in &self.rows {
            let mut cells = vec![
                row.season.to_string(),
                row.context.label().to_string(),
                row.games_played.to_string(),
            ];
            for column in &self.columns {
                cells.push(row.value(column).map(format_cell).unwrap_or_default());
            }
            out.push(cells);
        }
        out
    }
}

fn format_cell(value: f64) -> String {
    format!("{value}")
}
