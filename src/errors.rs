use thiserror::Error;

use crate::player_finder::Candidate;
use crate::season_stats::StatFamily;

/// Typed failures surfaced at the engine boundary.
///
/// Provider-side failures (network, storage) pass through the transparent
/// `Provider` variant unchanged; retry policy belongs to the provider.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid search query: {0}")]
    InvalidQuery(String),

    #[error("unknown team identifier '{0}'")]
    UnknownTeam(String),

    #[error("no player matched the provided name and filters")]
    PlayerNotFound,

    #[error("query matched {} players; refine the filters or allow auto-selection", .0.len())]
    AmbiguousQuery(Vec<Candidate>),

    #[error("seasons {invalid:?} are outside the supported {family} range {earliest}-{latest}")]
    SeasonNotAvailable {
        family: StatFamily,
        invalid: Vec<u16>,
        earliest: u16,
        latest: u16,
    },

    #[error(transparent)]
    Provider(#[from] anyhow::Error),
}
