//! Per-ball velocity update: gravity, felt friction and sleep
//!
//! Each tick a ball is classified afresh:
//!
//! ```text
//! Airborne ──▶ Sliding ──▶ Rolling ──▶ Resting
//!     └───────────┴───────────┴──────────▲   (speeds below sleep threshold)
//! ```
//!
//! Sliding is decided by the contact-point velocity
//! `cv = v_xz + (-r·Y) × ω`. A grounded ball whose `cv` is below the rolling
//! threshold is held to the pure rolling constraint.

use glam::Vec3;

use super::ball::Ball;
use crate::settings::PhysicsSettings;

/// Slack when deciding a ball is sitting on the felt
const GROUND_TOLERANCE: f32 = 1e-4;
/// Slack when deciding a falling ball has reached the felt
const LANDING_TOLERANCE: f32 = 0.002;
/// Rolling balls slower than this (squared, m²/s²) with little spin stop outright
const ROLL_STOP_SPEED_SQ: f32 = 1e-4;
const ROLL_STOP_SPIN_SQ: f32 = 0.04;

/// Friction regime a ball was in for the last update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionState {
    Airborne,
    Sliding,
    Rolling,
    Resting,
}

/// Advance one ball's linear and angular velocity by `dt`
pub fn update_ball_velocity(
    ball: &mut Ball,
    surface_y: f32,
    settings: &PhysicsSettings,
    dt: f32,
) -> MotionState {
    if !ball.in_play {
        return MotionState::Resting;
    }

    let r = ball.radius;
    let g = settings.gravity;
    let mut v = ball.velocity;
    let mut w = ball.angular_velocity;

    let ground_y = surface_y + r;
    let grounded = ball.position.y <= ground_y + GROUND_TOLERANCE && v.y <= 0.0;

    let state = if grounded {
        ball.position.y = ground_y;
        v.y = 0.0;

        let mut v_xz = Vec3::new(v.x, 0.0, v.z);
        let contact_offset = Vec3::NEG_Y * r;
        let cv = v_xz + contact_offset.cross(w);
        let cv_mag = cv.length();

        if cv_mag <= settings.rolling_threshold {
            let speed = v_xz.length();
            if speed > 1e-3 {
                let decel = settings.mu_roll * g * dt;
                v_xz *= (speed - decel).max(0.0) / speed;
            }

            // Pure rolling: v = ω × r
            w.x = -v_xz.z / r;
            w.z = v_xz.x / r;

            if w.y.abs() > settings.side_spin_bleed {
                w.y -= w.y.signum() * settings.side_spin_bleed;
            } else {
                w.y = 0.0;
            }

            if v_xz.length_squared() < ROLL_STOP_SPEED_SQ && w.length_squared() < ROLL_STOP_SPIN_SQ {
                ball.stop();
                return MotionState::Resting;
            }

            v.x = v_xz.x;
            v.z = v_xz.z;
            MotionState::Rolling
        } else {
            let slip_dir = cv / cv_mag;
            let angular_accel = -(5.0 * settings.mu_slide * g) / (2.0 * r) * dt;
            w += Vec3::Y.cross(slip_dir) * angular_accel;
            v_xz += slip_dir * (-settings.mu_slide * g * dt);

            v.x = v_xz.x;
            v.z = v_xz.z;
            MotionState::Sliding
        }
    } else {
        v.y -= g * dt;

        if ball.position.y <= ground_y + LANDING_TOLERANCE {
            if v.y < -settings.bounce_threshold {
                v.y = -v.y * settings.bounce_damping;
                ball.position.y = ground_y;
            } else if v.y.abs() < settings.settle_threshold {
                v.y = 0.0;
                ball.position.y = ground_y;
            }
        }
        MotionState::Airborne
    };

    ball.velocity = v;
    ball.angular_velocity = w;
    ball.is_moving = true;

    if v.length() < settings.sleep_threshold && w.length() < settings.sleep_threshold {
        ball.stop();
        return MotionState::Resting;
    }

    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{BALL_MASS, BALL_RADIUS, SIM_DT};
    use proptest::prelude::*;

    fn grounded_ball(velocity: Vec3, angular_velocity: Vec3) -> Ball {
        let mut ball = Ball::new(1, Vec3::new(0.0, BALL_RADIUS, 0.0), BALL_RADIUS, BALL_MASS);
        ball.velocity = velocity;
        ball.angular_velocity = angular_velocity;
        ball.is_moving = true;
        ball
    }

    #[test]
    fn test_resting_ball_stays_at_rest() {
        let s = PhysicsSettings::default();
        let mut ball = grounded_ball(Vec3::ZERO, Vec3::ZERO);
        for _ in 0..10 {
            assert_eq!(update_ball_velocity(&mut ball, 0.0, &s, SIM_DT), MotionState::Resting);
            assert_eq!(ball.velocity, Vec3::ZERO);
            assert_eq!(ball.angular_velocity, Vec3::ZERO);
            assert!(!ball.is_moving);
        }
    }

    #[test]
    fn test_stun_shot_slides_then_rolls() {
        let s = PhysicsSettings::default();
        let mut ball = grounded_ball(Vec3::new(2.0, 0.0, 0.0), Vec3::ZERO);

        assert_eq!(update_ball_velocity(&mut ball, 0.0, &s, SIM_DT), MotionState::Sliding);

        let mut ticks = 1;
        while update_ball_velocity(&mut ball, 0.0, &s, SIM_DT) == MotionState::Sliding {
            ticks += 1;
            assert!(ticks < 200, "never reached rolling");
        }

        // Rolling constraint holds exactly
        let r = ball.radius;
        assert!((ball.angular_velocity.z - ball.velocity.x / r).abs() < 1e-3);
        assert!((ball.angular_velocity.x + ball.velocity.z / r).abs() < 1e-3);
        // Sliding friction bled off part of the speed, but the ball still moves forward
        assert!(ball.velocity.x > 1.0 && ball.velocity.x < 2.0);
    }

    #[test]
    fn test_rolling_decelerates_gently() {
        let s = PhysicsSettings::default();
        let v = 1.0;
        let mut ball = grounded_ball(Vec3::new(v, 0.0, 0.0), Vec3::new(0.0, 0.0, v / BALL_RADIUS));

        assert_eq!(update_ball_velocity(&mut ball, 0.0, &s, SIM_DT), MotionState::Rolling);
        let expected = v - s.mu_roll * s.gravity * SIM_DT;
        assert!((ball.velocity.x - expected).abs() < 1e-5);
    }

    #[test]
    fn test_rolling_bleeds_side_spin() {
        let s = PhysicsSettings::default();
        let v = 1.0;
        let mut ball = grounded_ball(Vec3::new(v, 0.0, 0.0), Vec3::new(0.0, 1.0, v / BALL_RADIUS));

        update_ball_velocity(&mut ball, 0.0, &s, SIM_DT);
        assert!((ball.angular_velocity.y - 0.7).abs() < 1e-5);
        update_ball_velocity(&mut ball, 0.0, &s, SIM_DT);
        update_ball_velocity(&mut ball, 0.0, &s, SIM_DT);
        update_ball_velocity(&mut ball, 0.0, &s, SIM_DT);
        assert_eq!(ball.angular_velocity.y, 0.0);
    }

    #[test]
    fn test_rolling_ball_eventually_rests() {
        let s = PhysicsSettings::default();
        let mut ball = grounded_ball(Vec3::new(0.3, 0.0, 0.0), Vec3::new(0.0, 0.0, 0.3 / BALL_RADIUS));
        let mut ticks = 0;
        while update_ball_velocity(&mut ball, 0.0, &s, SIM_DT) != MotionState::Resting {
            ticks += 1;
            assert!(ticks < 10_000);
        }
        assert_eq!(ball.velocity, Vec3::ZERO);
        assert!(!ball.is_moving);
    }

    #[test]
    fn test_airborne_ball_falls_and_bounces() {
        let s = PhysicsSettings::default();
        let mut ball = grounded_ball(Vec3::new(1.0, 0.5, 0.0), Vec3::ZERO);
        ball.position.y = BALL_RADIUS + 0.02;

        assert_eq!(update_ball_velocity(&mut ball, 0.0, &s, SIM_DT), MotionState::Airborne);
        assert!((ball.velocity.y - (0.5 - s.gravity * SIM_DT)).abs() < 1e-5);

        // Land hard: bounce with damped vertical speed
        ball.position.y = BALL_RADIUS + 0.001;
        ball.velocity.y = -1.0;
        update_ball_velocity(&mut ball, 0.0, &s, SIM_DT);
        let impact = 1.0 + s.gravity * SIM_DT;
        assert!((ball.velocity.y - impact * s.bounce_damping).abs() < 1e-4);
        assert_eq!(ball.position.y, BALL_RADIUS);
    }

    #[test]
    fn test_airborne_ball_settles_on_felt() {
        let s = PhysicsSettings::default();
        // Small hop whose upward speed gravity cancels within this tick
        let mut ball = grounded_ball(Vec3::new(1.0, 0.12, 0.0), Vec3::ZERO);
        ball.position.y = BALL_RADIUS + 0.001;

        assert_eq!(update_ball_velocity(&mut ball, 0.0, &s, SIM_DT), MotionState::Airborne);
        assert_eq!(ball.velocity.y, 0.0);
        assert_eq!(ball.position.y, BALL_RADIUS);

        // Back on the felt it slides like any stun shot
        assert_eq!(update_ball_velocity(&mut ball, 0.0, &s, SIM_DT), MotionState::Sliding);
    }

    #[test]
    fn test_out_of_play_ball_untouched() {
        let s = PhysicsSettings::default();
        let mut ball = grounded_ball(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO);
        ball.in_play = false;
        update_ball_velocity(&mut ball, 0.0, &s, SIM_DT);
        assert_eq!(ball.velocity, Vec3::new(1.0, 0.0, 0.0));
    }

    proptest! {
        #[test]
        fn prop_sub_threshold_ball_sleeps_in_one_tick(
            vx in -0.002f32..0.002,
            vz in -0.002f32..0.002,
            wx in -0.002f32..0.002,
            wy in -0.002f32..0.002,
            wz in -0.002f32..0.002,
        ) {
            let s = PhysicsSettings::default();
            let v = Vec3::new(vx, 0.0, vz);
            let w = Vec3::new(wx, wy, wz);
            prop_assume!(v.length() < s.sleep_threshold && w.length() < s.sleep_threshold);

            let mut ball = grounded_ball(v, w);
            prop_assert_eq!(update_ball_velocity(&mut ball, 0.0, &s, SIM_DT), MotionState::Resting);
            prop_assert_eq!(ball.velocity, Vec3::ZERO);
            prop_assert_eq!(ball.angular_velocity, Vec3::ZERO);

            // And it stays put
            prop_assert_eq!(update_ball_velocity(&mut ball, 0.0, &s, SIM_DT), MotionState::Resting);
            prop_assert_eq!(ball.velocity, Vec3::ZERO);
        }
    }
}
