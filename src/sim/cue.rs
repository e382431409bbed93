//! Cue strike model
//!
//! Treats the cue as a rigid body of mass `M` hitting the ball at a point on
//! its face. With the tip offset `(a, b)` in the strike plane and contact depth
//! `c = √(r² − a² − b²)`, the impulse delivered for a cue speed `V` at
//! elevation `θ` is
//!
//! ```text
//! F = 2mV / (1 + m/M + 5/(2r²)·(a² + b²cos²θ + c²sin²θ − 2bc·cosθ·sinθ))
//! ```
//!
//! Linear and angular velocity follow from the impulse `F·d` applied at the
//! contact point, where `d` is the cue direction tilted down by `θ`.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::ball::Ball;
use crate::settings::PhysicsSettings;

/// Floor on the contact depth so edge hits don't blow up
const MIN_CONTACT_DEPTH: f32 = 0.001;

/// Parameters of one cue strike
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CueStrike {
    /// Aim direction; only its horizontal part is used
    pub aim: Vec3,
    /// Cue tip speed (m/s)
    pub speed: f32,
    /// Tip offset on the ball face as a fraction of the radius
    /// (x = right english, y = follow/draw)
    pub offset: Vec2,
    /// Cue elevation in radians, 0 = level, π/2 = vertical
    pub elevation: f32,
}

impl CueStrike {
    /// Centre-ball, level strike
    pub fn new(aim: Vec3, speed: f32) -> Self {
        Self {
            aim,
            speed,
            offset: Vec2::ZERO,
            elevation: 0.0,
        }
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_elevation(mut self, elevation: f32) -> Self {
        self.elevation = elevation;
        self
    }
}

/// Velocities imparted by a strike
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrikeResult {
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
}

/// Compute the ball's launch velocities for a strike
///
/// Out-of-range inputs are clamped. Returns None only for a degenerate aim
/// with no horizontal component.
pub fn strike_velocities(
    strike: &CueStrike,
    radius: f32,
    mass: f32,
    settings: &PhysicsSettings,
    dt: f32,
) -> Option<StrikeResult> {
    let forward = Vec3::new(strike.aim.x, 0.0, strike.aim.z).normalize_or_zero();
    if forward == Vec3::ZERO {
        return None;
    }
    let up = Vec3::Y;
    let right = up.cross(forward);

    let max_offset = settings.max_tip_offset.clamp(0.0, 1.0);
    let offset = strike
        .offset
        .clamp(Vec2::splat(-max_offset), Vec2::splat(max_offset))
        .clamp_length_max(max_offset);

    let r_sq = radius * radius;
    let a = offset.x * radius;
    let b = offset.y * radius;
    let c = (r_sq - a * a - b * b).clamp(0.0, r_sq).sqrt().max(MIN_CONTACT_DEPTH);

    let theta = strike.elevation.clamp(0.0, std::f32::consts::FRAC_PI_2);
    let (sin_t, cos_t) = theta.sin_cos();
    let speed = strike.speed.max(0.0);

    let spin_term = a * a + b * b * cos_t * cos_t + c * c * sin_t * sin_t - 2.0 * b * c * cos_t * sin_t;
    let force = (2.0 * mass * speed) / (1.0 + mass / settings.cue_mass + 5.0 / (2.0 * r_sq) * spin_term);

    // Impulse along the cue, tilted down by the elevation
    let impulse = (forward * cos_t - up * sin_t) * force;
    let contact = right * a + up * b - forward * c;
    // Solid sphere: (2/5)·m·r²
    let inertia = 0.4 * mass * r_sq;

    let mut velocity = impulse / mass;
    let angular_velocity = impulse.cross(contact) / inertia;

    if velocity.length() > settings.max_shot_speed {
        velocity = velocity.normalize() * settings.max_shot_speed;
        log::debug!("Shot speed capped to {} m/s", settings.max_shot_speed);
    }

    // A downward shot can't push into the slate: either hop or stay flat
    if velocity.y < 0.0 {
        let min_horizontal = (radius - c) / dt;
        let horizontal = Vec3::new(velocity.x, 0.0, velocity.z).length();
        if horizontal < min_horizontal {
            velocity.y = 0.0;
        } else {
            velocity.y = -velocity.y * settings.jump_damping;
        }
    }

    Some(StrikeResult {
        velocity,
        angular_velocity,
    })
}

/// Strike `ball` with the cue; returns false if the strike was degenerate
pub fn apply_cue_strike(ball: &mut Ball, strike: &CueStrike, settings: &PhysicsSettings, dt: f32) -> bool {
    let Some(result) = strike_velocities(strike, ball.radius, ball.mass, settings, dt) else {
        log::warn!("Ignoring cue strike with no horizontal aim: {:?}", strike.aim);
        return false;
    };

    ball.velocity = result.velocity;
    ball.angular_velocity = result.angular_velocity;
    ball.is_moving = true;
    log::debug!(
        "Ball {} struck: v={:.3} m/s, w={:.2} rad/s",
        ball.id,
        ball.velocity.length(),
        ball.angular_velocity.length()
    );
    true
}
