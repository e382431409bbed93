//! Error types for the fallible edges of the crate
//!
//! The physics itself never fails; these cover configuration, persistence
//! and ball-in-hand placement requests.

use thiserror::Error;

use crate::sim::BallId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported snapshot version {found} (expected {expected})")]
    SnapshotVersion { found: u32, expected: u32 },

    #[error("snapshot declares {declared} balls but holds {actual}")]
    SnapshotBallCount { declared: usize, actual: usize },

    #[error("ball placement rejected: {0}")]
    Placement(#[from] PlacementError),
}

/// Why a ball-in-hand placement request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("no ball with id {0}")]
    UnknownBall(BallId),

    #[error("ball {0} is not in play")]
    NotInPlay(BallId),

    #[error("ball {0} may not be moved right now")]
    NotAllowed(BallId),

    #[error("balls are still moving")]
    BallsMoving,

    #[error("position overlaps ball {0}")]
    Overlaps(BallId),

    #[error("position is outside the playing surface")]
    OutOfBounds,

    #[error("cue ball must be placed behind the head string")]
    OutsideKitchen,
}
