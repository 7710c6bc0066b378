use std::collections::HashMap;

use once_cell::sync::OnceCell;

use crate::provider::TrackingKind;

/// Canonical position codes and the free-text aliases that map to them.
const POSITION_ALIASES: &[(&str, &[&str])] = &[
    ("QB", &["QUARTERBACK"]),
    ("RB", &["RUNNING BACK", "TAILBACK", "HALFBACK", "HB", "HBK"]),
    ("FB", &["FULLBACK", "FBK"]),
    ("WR", &["WIDE RECEIVER"]),
    ("TE", &["TIGHT END"]),
    ("OL", &["OFFENSIVE LINE", "LINEMAN", "OLINE"]),
    ("OT", &["OFFENSIVE TACKLE", "TACKLE", "T"]),
    ("OG", &["OFFENSIVE GUARD", "GUARD", "G"]),
    ("OC", &["CENTER", "C"]),
    ("DL", &["DEFENSIVE LINE", "DEFENSIVE LINEMAN", "DLINE"]),
    ("DE", &["DEFENSIVE END"]),
    ("DT", &["DEFENSIVE TACKLE"]),
    ("NT", &["NOSE TACKLE"]),
    ("EDGE", &["PASS RUSHER"]),
    ("LB", &["LINEBACKER"]),
    ("ILB", &["INSIDE LINEBACKER", "MIDDLE LINEBACKER", "MLB"]),
    ("OLB", &["OUTSIDE LINEBACKER", "WLB", "SLB"]),
    ("DB", &["DEFENSIVE BACK"]),
    ("CB", &["CORNERBACK"]),
    ("S", &["SAFETY", "SAF"]),
    ("FS", &["FREE SAFETY"]),
    ("SS", &["STRONG SAFETY"]),
    ("K", &["KICKER", "PLACEKICKER"]),
    ("P", &["PUNTER"]),
    ("PR", &["PUNT RETURNER"]),
    ("KR", &["KICK RETURNER"]),
    ("LS", &["LONG SNAPPER"]),
];

const DEFENSIVE_POSITIONS: &[&str] = &[
    "DB", "LB", "DL", "CB", "S", "DE", "DT", "OLB", "ILB", "MLB", "FS", "SS", "NT", "EDGE",
];

const DEFENSIVE_GROUPS: &[&str] = &["DB", "LB", "DL"];

static ALIAS_LOOKUP: OnceCell<HashMap<String, &'static str>> = OnceCell::new();

fn alias_lookup() -> &'static HashMap<String, &'static str> {
    ALIAS_LOOKUP.get_or_init(|| {
        let mut map = HashMap::new();
        for (canonical, aliases) in POSITION_ALIASES {
            map.insert(normalize_key(canonical), *canonical);
            for alias in *aliases {
                map.insert(normalize_key(alias), *canonical);
            }
        }
        map
    })
}

/// Uppercase alphanumeric-only form for alias comparisons.
fn normalize_key(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_uppercase()
}

/// Map a raw position label ("quarterback", "SAF", "hb") to its canonical
/// code. Unrecognized labels return None.
pub fn canonicalize(raw: &str) -> Option<&'static str> {
    let key = normalize_key(raw);
    if key.is_empty() {
        return None;
    }
    alias_lookup().get(&key).copied()
}

/// Whether a player lines up on defense, judged from position then group.
pub fn is_defensive(position: Option<&str>, position_group: Option<&str>) -> bool {
    if let Some(pos) = position {
        let canon = canonicalize(pos).unwrap_or("");
        if DEFENSIVE_POSITIONS.contains(&canon) || DEFENSIVE_POSITIONS.contains(&pos.to_uppercase().as_str()) {
            return true;
        }
    }
    if let Some(group) = position_group {
        if DEFENSIVE_GROUPS.contains(&group.to_uppercase().as_str()) {
            return true;
        }
    }
    false
}

/// Career-total labels and the box-score column each one sums.
pub fn career_total_columns(defensive: bool) -> &'static [(&'static str, &'static str)] {
    if defensive {
        &[
            ("tackles_solo", "def_tackles_solo"),
            ("tackle_assists", "def_tackle_assists"),
            ("tackles_for_loss", "def_tackles_for_loss"),
            ("sacks", "def_sacks"),
            ("interceptions", "def_interceptions"),
            ("passes_defended", "def_pass_defended"),
            ("fumbles_forced", "def_fumbles_forced"),
            ("fumble_recoveries", "fumble_recovery_opp"),
            ("defensive_tds", "def_tds"),
            ("safeties", "def_safeties"),
        ]
    } else {
        &[
            ("passing_yards", "passing_yards"),
            ("passing_tds", "passing_tds"),
            ("interceptions_thrown", "interceptions"),
            ("rushing_yards", "rushing_yards"),
            ("rushing_tds", "rushing_tds"),
            ("receiving_yards", "receiving_yards"),
            ("receiving_tds", "receiving_tds"),
            ("receptions", "receptions"),
            ("targets", "targets"),
            ("fantasy_points", "fantasy_points"),
        ]
    }
}

/// Box-score columns worth showing for the position side.
pub fn relevant_stat_columns(defensive: bool) -> &'static [&'static str] {
    if defensive {
        &[
            "def_tackles_solo",
            "def_tackle_assists",
            "def_sacks",
            "def_interceptions",
            "def_pass_defended",
            "def_fumbles_forced",
            "def_tds",
        ]
    } else {
        &[
            "passing_yards",
            "passing_tds",
            "rushing_yards",
            "rushing_tds",
            "receiving_yards",
            "receptions",
            "fantasy_points",
        ]
    }
}

/// Which tracking stat type fits a position.
pub fn tracking_kind_for(position: Option<&str>) -> TrackingKind {
    let canon = position.and_then(canonicalize);
    match canon {
        Some("RB") | Some("FB") => TrackingKind::Rushing,
        Some("WR") | Some("TE") => TrackingKind::Receiving,
        _ => TrackingKind::Passing,
    }
}

/// Tracking columns worth showing for a stat type.
pub fn relevant_tracking_columns(kind: TrackingKind) -> &'static [&'static str] {
    match kind {
        TrackingKind::Passing => &[
            "attempts",
            "completions",
            "pass_yards",
            "pass_touchdowns",
            "interceptions",
            "avg_time_to_throw",
            "avg_completed_air_yards",
            "avg_intended_air_yards",
            "avg_air_yards_differential",
            "max_completed_air_distance",
            "aggressiveness",
            "completion_percentage_above_expectation",
        ],
        TrackingKind::Rushing => &[
            "carries",
            "rush_yards",
            "rush_touchdowns",
            "efficiency",
            "percent_attempts_gte_eight_defenders",
            "avg_time_to_los",
            "rush_yards_over_expected",
            "rush_yards_over_expected_per_att",
            "rush_pct_over_expected",
        ],
        TrackingKind::Receiving => &[
            "receptions",
            "targets",
            "receiving_yards",
            "receiving_touchdowns",
            "avg_cushion",
            "avg_separation",
            "avg_intended_air_yards",
            "percent_share_of_intended_air_yards",
            "catch_percentage",
            "avg_yac",
            "avg_expected_yac",
            "avg_yac_above_expectation",
        ],
    }
}

/// Whether a filter label matches a player's position or position group,
/// accepting any known alias on either side.
pub fn filter_matches(filter: &str, position: Option<&str>, position_group: Option<&str>) -> bool {
    let want_canon = canonicalize(filter);
    for have in [position, position_group].into_iter().flatten() {
        if have.eq_ignore_ascii_case(filter.trim()) {
            return true;
        }
        if let (Some(want), Some(got)) = (want_canon, canonicalize(have)) {
            if want == got {
                return true;
            }
        }
    }
    false
}
