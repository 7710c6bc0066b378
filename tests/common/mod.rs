#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::{Result, bail};
use serde_json::Value;

use nflscope::provider::{DataProvider, RawRow, TrackingKind};

/// In-memory provider over fixture rows, with call counters so tests can
/// assert cache behavior and a failure toggle for outage scenarios.
pub struct MemoryProvider {
    pub roster: Vec<RawRow>,
    pub crosswalk: Vec<RawRow>,
    pub weekly: Mutex<Vec<RawRow>>,
    pub tracking: Mutex<Vec<RawRow>>,
    pub stats_calls: AtomicUsize,
    pub tracking_calls: AtomicUsize,
    pub fail_stats: AtomicBool,
}

impl MemoryProvider {
    pub fn new(roster: Vec<RawRow>, crosswalk: Vec<RawRow>) -> Self {
        Self {
            roster,
            crosswalk,
            weekly: Mutex::new(Vec::new()),
            tracking: Mutex::new(Vec::new()),
            stats_calls: AtomicUsize::new(0),
            tracking_calls: AtomicUsize::new(0),
            fail_stats: AtomicBool::new(false),
        }
    }

    pub fn with_weekly(self, rows: Vec<RawRow>) -> Self {
        *self.weekly.lock().unwrap() = rows;
        self
    }

    pub fn with_tracking(self, rows: Vec<RawRow>) -> Self {
        *self.tracking.lock().unwrap() = rows;
        self
    }

    pub fn stats_calls(&self) -> usize {
        self.stats_calls.load(Ordering::SeqCst)
    }

    pub fn tracking_calls(&self) -> usize {
        self.tracking_calls.load(Ordering::SeqCst)
    }

    pub fn set_fail_stats(&self, fail: bool) {
        self.fail_stats.store(fail, Ordering::SeqCst);
    }

    pub fn replace_weekly(&self, rows: Vec<RawRow>) {
        *self.weekly.lock().unwrap() = rows;
    }
}

impl DataProvider for MemoryProvider {
    fn load_roster(&self) -> Result<Vec<RawRow>> {
        Ok(self.roster.clone())
    }

    fn load_id_crosswalk(&self) -> Result<Vec<RawRow>> {
        Ok(self.crosswalk.clone())
    }

    fn load_season_stats(&self, seasons: &[u16]) -> Result<Vec<RawRow>> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_stats.load(Ordering::SeqCst) {
            bail!("synthetic provider outage");
        }
        let rows = self.weekly.lock().unwrap();
        Ok(filter_by_season(&rows, seasons))
    }

    fn load_tracking_stats(&self, seasons: &[u16], _kind: TrackingKind) -> Result<Vec<RawRow>> {
        self.tracking_calls.fetch_add(1, Ordering::SeqCst);
        let rows = self.tracking.lock().unwrap();
        Ok(filter_by_season(&rows, seasons))
    }
}

fn filter_by_season(rows: &[RawRow], seasons: &[u16]) -> Vec<RawRow> {
    rows.iter()
        .filter(|row| {
            row.integer("season")
                .and_then(|s| u16::try_from(s).ok())
                .is_some_and(|s| seasons.contains(&s))
        })
        .cloned()
        .collect()
}

pub fn row(pairs: &[(&str, Value)]) -> RawRow {
    let mut out = RawRow::new();
    for (key, value) in pairs {
        out.set(*key, value.clone());
    }
    out
}

pub fn roster_row(
    id: &str,
    name: &str,
    position: &str,
    group: &str,
    team: &str,
    status: &str,
) -> RawRow {
    let mut out = RawRow::new();
    out.set("gsis_id", id);
    out.set("display_name", name);
    out.set("position", position);
    out.set("position_group", group);
    out.set("latest_team", team);
    out.set("status", status);
    out
}

pub fn weekly_row(
    player_id: &str,
    name: &str,
    season: u16,
    week: u16,
    season_type: &str,
    stats: &[(&str, f64)],
) -> RawRow {
    let mut out = RawRow::new();
    out.set("player_id", player_id);
    out.set("player_display_name", name);
    out.set("season", season);
    out.set("week", week);
    out.set("season_type", season_type);
    out.set("team", "BUF");
    for (column, value) in stats {
        out.set(*column, *value);
    }
    out
}

pub fn tracking_row(
    name: &str,
    season: u16,
    week: u16,
    stats: &[(&str, f64)],
) -> RawRow {
    let mut out = RawRow::new();
    out.set("player_display_name", name);
    out.set("player_position", "QB");
    out.set("season", season);
    out.set("week", week);
    out.set("season_type", "REG");
    out.set("team_abbr", "BUF");
    for (column, value) in stats {
        out.set(*column, *value);
    }
    out
}

/// The Buffalo quarterback, drafted 7th overall in 2018.
pub fn josh_allen_qb() -> RawRow {
    let mut out = roster_row("00-0034857", "Josh Allen", "QB", "QB", "BUF", "ACT");
    out.set("draft_year", 2018);
    out.set("draft_round", 1);
    out.set("draft_pick", 7);
    out.set("draft_team", "BUF");
    out.set("rookie_season", 2018);
    out.set("last_season", 2025);
    out.set("years_of_experience", 8);
    out.set("college", "Wyoming");
    out.set("birth_date", "1996-05-21");
    out.set("height", 77);
    out.set("weight", 237);
    out
}

/// The Jacksonville edge rusher sharing the name, drafted 7th in 2019.
pub fn josh_allen_lb() -> RawRow {
    let mut out = roster_row("00-0035236", "Josh Allen", "OLB", "LB", "JAX", "ACT");
    out.set("draft_year", 2019);
    out.set("draft_round", 1);
    out.set("draft_pick", 7);
    out.set("draft_team", "JAX");
    out.set("rookie_season", 2019);
    out.set("last_season", 2025);
    out.set("years_of_experience", 7);
    out.set("college", "Kentucky");
    out
}

pub fn crosswalk_row(id: &str, espn: &str, pfr: &str) -> RawRow {
    let mut out = RawRow::new();
    out.set("gsis_id", id);
    out.set("espn_id", espn);
    out.set("pfr_id", pfr);
    out
}
