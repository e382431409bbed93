//! Billiards Sim - eight-ball table physics and turn rules
//!
//! Core modules:
//! - `sim`: Deterministic simulation (ball physics, collisions, turn rules, undo/redo)
//! - `settings`: Tunable physics/table/rule parameters
//! - `persistence`: Snapshot serialization envelope
//!
//! Rendering, input, audio playback and UI live outside this crate. They read
//! ball poses and drain [`sim::SimEvent`]s, and feed cue strikes and
//! pause/undo requests back in.

pub mod error;
pub mod persistence;
pub mod settings;
pub mod sim;

pub use error::{Error, PlacementError, Result};
pub use settings::{PhysicsSettings, RuleSettings, Settings, TableSettings};

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (80 Hz)
    pub const SIM_DT: f32 = 0.0125;
    /// Maximum catch-up time per frame to prevent spiral of death
    pub const MAX_CATCH_UP: f32 = SIM_DT * 6.0;

    /// Standard pool ball (57 mm diameter, 160 g)
    pub const BALL_RADIUS: f32 = 0.0285;
    pub const BALL_MASS: f32 = 0.16;

    /// Standard gravity (m/s²)
    pub const GRAVITY: f32 = 9.80665;

    /// Number of balls in a full eight-ball set (cue + 15)
    pub const BALL_COUNT: usize = 16;

    /// Small value for degenerate-geometry checks
    pub const EPSILON: f32 = 1e-6;
}
