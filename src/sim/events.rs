//! Events emitted by the simulation for audio and UI collaborators

use serde::{Deserialize, Serialize};

use super::ball::BallId;
use super::rules::Team;

/// Number of interchangeable ball-hit sound clips
pub const HIT_SOUND_VARIANTS: u8 = 4;

/// Pre-impact speed (m/s) that plays a hit at full volume
const FULL_VOLUME_SPEED: f32 = 2.0;

/// Volume of the pocket drop sound
pub const POCKET_VOLUME: f32 = 0.5;

/// Hit volume scaled from pre-impact speed
pub fn hit_volume(speed: f32) -> f32 {
    (speed / FULL_VOLUME_SPEED).clamp(0.0, 1.0)
}

/// Something a collaborator may want to react to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// Ball-ball impact, keyed to the faster ball
    BallHit { ball: BallId, volume: f32, variant: u8 },
    /// The cue ball touched another ball
    CueContact { other: BallId },
    CushionHit { ball: BallId, speed: f32 },
    Pocketed { ball: BallId, pocket: usize, volume: f32 },
    /// A ball left the table without going through a pocket
    OffTable { ball: BallId },
    Turn(TurnEvent),
}

/// Why a foul was called
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FoulKind {
    CueBallPocketed,
    NoBallPocketed,
    OpponentBallPocketed,
}

/// Turn evaluation results for the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TurnEvent {
    TeamAssigned(Team),
    Foul(FoulKind),
    PossessionSwitched { to: Team },
    GameOver { won: bool, reason: String },
    TurnEnded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_volume_scales_and_clamps() {
        assert_eq!(hit_volume(0.0), 0.0);
        assert!((hit_volume(1.0) - 0.5).abs() < 1e-6);
        assert_eq!(hit_volume(8.0), 1.0);
        assert_eq!(hit_volume(-1.0), 0.0);
    }
}
