//! Ball state and classification
//!
//! Coordinate system (table frame):
//! - X: along the table length (positive toward the foot / rack)
//! - Y: vertical (positive up, felt at y = 0)
//! - Z: across the table width
//!
//! Angular velocity follows the convention used by the friction model: the
//! contact-point velocity of a grounded ball is `v + (-r·Y) × ω`.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Ball number: 0 = cue, 1-7 solids, 8 = eight-ball, 9-15 stripes
pub type BallId = u8;

pub const CUE_BALL: BallId = 0;
pub const EIGHT_BALL: BallId = 8;

/// What kind of ball a number denotes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallKind {
    Cue,
    Solid,
    Eight,
    Stripe,
}

impl BallKind {
    pub fn of(id: BallId) -> Self {
        match id {
            CUE_BALL => BallKind::Cue,
            1..=7 => BallKind::Solid,
            EIGHT_BALL => BallKind::Eight,
            _ => BallKind::Stripe,
        }
    }

    /// Solids and stripes; the cue and eight-ball are not object balls
    pub fn is_object_ball(self) -> bool {
        matches!(self, BallKind::Solid | BallKind::Stripe)
    }
}

/// A ball entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub id: BallId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub radius: f32,
    pub mass: f32,
    /// False once pocketed or removed; excluded from all physics until repositioned
    pub in_play: bool,
    pub is_moving: bool,
}

impl Ball {
    pub fn new(id: BallId, position: Vec3, radius: f32, mass: f32) -> Self {
        debug_assert!(radius > 0.0 && mass > 0.0);
        Self {
            id,
            position,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            radius,
            mass,
            in_play: true,
            is_moving: false,
        }
    }

    #[inline]
    pub fn kind(&self) -> BallKind {
        BallKind::of(self.id)
    }

    #[inline]
    pub fn is_cue(&self) -> bool {
        self.id == CUE_BALL
    }

    #[inline]
    pub fn inverse_mass(&self) -> f32 {
        1.0 / self.mass
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Force the ball to exact rest
    pub fn stop(&mut self) {
        self.velocity = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;
        self.is_moving = false;
    }

    /// Put the ball at `position`, at rest
    pub fn place(&mut self, position: Vec3) {
        self.position = position;
        self.stop();
    }
}

/// Pose handed to the renderer each tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallPose {
    pub id: BallId,
    pub position: Vec3,
    /// Renderers integrate this to spin the ball mesh
    pub angular_velocity: Vec3,
    pub in_play: bool,
}

impl From<&Ball> for BallPose {
    fn from(ball: &Ball) -> Self {
        Self {
            id: ball.id,
            position: ball.position,
            angular_velocity: ball.angular_velocity,
            in_play: ball.in_play,
        }
    }
}
