//! Snapshot persistence
//!
//! Features:
//! - Versioned JSON envelope
//! - Ball count recorded ahead of the ball list and checked on load
//! - Atomic file writes (tmp → save)

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sim::{BallSnapshot, Snapshot, TurnState};

/// Current envelope format version
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    version: u32,
    ball_count: usize,
    balls: Vec<BallSnapshot>,
    turn: TurnState,
}

/// Only the version, so newer layouts fail with a clear error
#[derive(Deserialize)]
struct VersionHeader {
    version: u32,
}

/// Serialize a snapshot into a versioned JSON envelope
pub fn encode(snapshot: &Snapshot) -> Result<String> {
    let envelope = Envelope {
        version: SNAPSHOT_VERSION,
        ball_count: snapshot.balls.len(),
        balls: snapshot.balls.clone(),
        turn: snapshot.turn.clone(),
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Parse an envelope produced by [`encode`]
pub fn decode(json: &str) -> Result<Snapshot> {
    let header: VersionHeader = serde_json::from_str(json)?;
    if header.version != SNAPSHOT_VERSION {
        return Err(Error::SnapshotVersion {
            found: header.version,
            expected: SNAPSHOT_VERSION,
        });
    }

    let envelope: Envelope = serde_json::from_str(json)?;
    if envelope.ball_count != envelope.balls.len() {
        return Err(Error::SnapshotBallCount {
            declared: envelope.ball_count,
            actual: envelope.balls.len(),
        });
    }

    Ok(Snapshot {
        balls: envelope.balls,
        turn: envelope.turn,
    })
}

/// Write a snapshot to `path`, going through a temporary file
pub fn save(path: impl AsRef<Path>, snapshot: &Snapshot) -> Result<()> {
    let path = path.as_ref();
    let json = encode(snapshot)?;
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    log::info!("Snapshot saved to {}", path.display());
    Ok(())
}

pub fn load(path: impl AsRef<Path>) -> Result<Snapshot> {
    let json = std::fs::read_to_string(path.as_ref())?;
    let snapshot = decode(&json)?;
    log::info!("Snapshot loaded from {}", path.as_ref().display());
    Ok(snapshot)
}
