use crate::data::brackets::BracketConfigError;
use crate::season::series::{MatchKey, SeriesOutcome};
use crate::season::weeks::CutoffError;

/// Structural problems with a projection request. A projection never silently drops a team;
/// anything it cannot account for is reported here instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProjectionError {
    #[error("no regular-season matches: standings cannot be projected")]
    NoRegularSeasonData,
    #[error("team set is empty")]
    NoTeams,
    #[error("trial count must be at least 1")]
    ZeroTrials,
    #[error("team '{0}' is listed more than once")]
    DuplicateTeam(String),
    #[error("team '{0}' is not part of the projected team set")]
    UnknownTeam(String),
    #[error("forced outcome for {0} does not refer to an unplayed match")]
    UnknownForcedMatch(MatchKey),
    #[error("forced outcome '{outcome}' is not a possible result of best-of-{best_of} {key}")]
    InvalidForcedOutcome {
        key: MatchKey,
        outcome: SeriesOutcome,
        best_of: u32,
    },
    #[error(transparent)]
    MalformedBrackets(#[from] BracketConfigError),
    #[error(transparent)]
    Cutoff(#[from] CutoffError),
    #[error("team sets differ between standings and projection (e.g. '{0}')")]
    StandingsAlignmentMismatch(String),
    #[error("projection cancelled")]
    Cancelled,
    #[error("worker pool unavailable: {0}")]
    WorkerPool(String),
}
