//! Deterministic simulation module
//!
//! All table physics and rule logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (and only for cosmetic choices)
//! - Stable iteration order (by ball id)
//! - No rendering, audio or platform dependencies

pub mod ball;
pub mod collision;
pub mod cue;
pub mod events;
pub mod friction;
pub mod history;
pub mod rules;
pub mod table;
pub mod tick;

pub use ball::{Ball, BallId, BallKind, BallPose, CUE_BALL, EIGHT_BALL};
pub use collision::{Contact, Impact};
pub use cue::{CueStrike, StrikeResult, apply_cue_strike, strike_velocities};
pub use events::{FoulKind, SimEvent, TurnEvent};
pub use friction::{MotionState, update_ball_velocity};
pub use history::{BallSnapshot, HistoryOutcome, Snapshot, SnapshotStore};
pub use rules::{Team, TurnMachine, TurnPhase, TurnState};
pub use table::{Cushion, Pocket, RACK_ORDER, Table};
pub use tick::{FixedStepper, Simulation};
