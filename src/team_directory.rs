use std::collections::HashMap;

use once_cell::sync::OnceCell;

use crate::errors::EngineError;

/// One franchise: the current canonical code plus every name and abbreviation
/// variant that has referred to it, including relocated/rebranded identities.
/// Historical variants map to the *current* code.
struct TeamRecord {
    code: &'static str,
    variants: &'static [&'static str],
}

const TEAM_CATALOG: &[TeamRecord] = &[
    TeamRecord {
        code: "ARI",
        variants: &[
            "ARZ",
            "CRD",
            "Arizona",
            "Cardinals",
            "Arizona Cardinals",
            "Phoenix Cardinals",
        ],
    },
    TeamRecord {
        code: "ATL",
        variants: &["Atlanta", "Falcons", "Atlanta Falcons"],
    },
    TeamRecord {
        code: "BAL",
        variants: &["BLT", "RAV", "Baltimore", "Ravens", "Baltimore Ravens"],
    },
    TeamRecord {
        code: "BUF",
        variants: &["Buffalo", "Bills", "Buffalo Bills"],
    },
    TeamRecord {
        code: "CAR",
        variants: &["Carolina", "Panthers", "Carolina Panthers"],
    },
    TeamRecord {
        code: "CHI",
        variants: &["Chicago", "Bears", "Chicago Bears"],
    },
    TeamRecord {
        code: "CIN",
        variants: &["Cincinnati", "Bengals", "Cincinnati Bengals"],
    },
    TeamRecord {
        code: "CLE",
        variants: &["CLV", "Cleveland", "Browns", "Cleveland Browns"],
    },
    TeamRecord {
        code: "DAL",
        variants: &["Dallas", "Cowboys", "Dallas Cowboys"],
    },
    TeamRecord {
        code: "DEN",
        variants: &["Denver", "Broncos", "Denver Broncos"],
    },
    TeamRecord {
        code: "DET",
        variants: &["Detroit", "Lions", "Detroit Lions"],
    },
    TeamRecord {
        code: "GB",
        variants: &["GNB", "Green Bay", "Packers", "Green Bay Packers"],
    },
    TeamRecord {
        code: "HOU",
        variants: &["HST", "Houston", "Texans", "Houston Texans"],
    },
    TeamRecord {
        code: "IND",
        variants: &["CLT", "Indianapolis", "Colts", "Indianapolis Colts"],
    },
    TeamRecord {
        code: "JAX",
        variants: &["JAC", "Jacksonville", "Jaguars", "Jacksonville Jaguars"],
    },
    TeamRecord {
        code: "KC",
        variants: &["KAN", "Kansas City", "Chiefs", "Kansas City Chiefs"],
    },
    TeamRecord {
        code: "LA",
        variants: &[
            "LAR",
            "RAM",
            "STL",
            "SL",
            "Los Angeles Rams",
            "Rams",
            "St. Louis Rams",
            "St Louis Rams",
        ],
    },
    TeamRecord {
        code: "LAC",
        variants: &[
            "SD",
            "SDG",
            "Los Angeles Chargers",
            "Chargers",
            "San Diego Chargers",
            "San Diego",
        ],
    },
    TeamRecord {
        code: "LV",
        variants: &[
            "LVR",
            "OAK",
            "RAI",
            "Las Vegas",
            "Raiders",
            "Las Vegas Raiders",
            "Oakland Raiders",
            "Oakland",
            "Los Angeles Raiders",
        ],
    },
    TeamRecord {
        code: "MIA",
        variants: &["Miami", "Dolphins", "Miami Dolphins"],
    },
    TeamRecord {
        code: "MIN",
        variants: &["Minnesota", "Vikings", "Minnesota Vikings"],
    },
    TeamRecord {
        code: "NE",
        variants: &["NWE", "New England", "Patriots", "New England Patriots"],
    },
    TeamRecord {
        code: "NO",
        variants: &["NOR", "New Orleans", "Saints", "New Orleans Saints"],
    },
    TeamRecord {
        code: "NYG",
        variants: &["New York Giants", "Giants"],
    },
    TeamRecord {
        code: "NYJ",
        variants: &["New York Jets", "Jets"],
    },
    TeamRecord {
        code: "PHI",
        variants: &["Philadelphia", "Eagles", "Philadelphia Eagles"],
    },
    TeamRecord {
        code: "PIT",
        variants: &["Pittsburgh", "Steelers", "Pittsburgh Steelers"],
    },
    TeamRecord {
        code: "SEA",
        variants: &["Seattle", "Seahawks", "Seattle Seahawks"],
    },
    TeamRecord {
        code: "SF",
        variants: &["SFO", "San Francisco", "49ers", "San Francisco 49ers", "Niners"],
    },
    TeamRecord {
        code: "TB",
        variants: &["TAM", "Tampa Bay", "Buccaneers", "Tampa Bay Buccaneers", "Bucs"],
    },
    TeamRecord {
        code: "TEN",
        variants: &[
            "OTI",
            "Tennessee",
            "Titans",
            "Tennessee Titans",
            "Tennessee Oilers",
            "Houston Oilers",
            "Oilers",
        ],
    },
    TeamRecord {
        code: "WAS",
        variants: &[
            "WSH",
            "Washington",
            "Commanders",
            "Washington Commanders",
            "Washington Football Team",
            "Washington Redskins",
            "Redskins",
        ],
    },
];

static LOOKUP: OnceCell<HashMap<String, &'static str>> = OnceCell::new();

fn lookup() -> &'static HashMap<String, &'static str> {
    LOOKUP.get_or_init(|| {
        let mut map = HashMap::new();
        for record in TEAM_CATALOG {
            map.insert(record.code.to_lowercase(), record.code);
            map.insert(compact_key(record.code), record.code);
            for variant in record.variants {
                map.insert(variant.to_lowercase(), record.code);
                map.insert(compact_key(variant), record.code);
            }
        }
        map
    })
}

/// Alphanumeric-only lowercase form, so "St. Louis Rams" and "st louis rams"
/// land on the same key.
fn compact_key(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

/// Map any known team name or abbreviation variant to its current canonical
/// code. Matching is case-insensitive, trims whitespace, and falls back to a
/// punctuation-insensitive comparison before failing.
pub fn normalize(identifier: &str) -> Result<&'static str, EngineError> {
    let trimmed = identifier.trim();
    if trimmed.is_empty() {
        return Err(EngineError::UnknownTeam(identifier.to_string()));
    }
    let map = lookup();
    if let Some(code) = map.get(&trimmed.to_lowercase()) {
        return Ok(code);
    }
    if let Some(code) = map.get(&compact_key(trimmed)) {
        return Ok(code);
    }
    Err(EngineError::UnknownTeam(trimmed.to_string()))
}
