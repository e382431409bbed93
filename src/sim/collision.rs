//! Collision detection and response for spheres and cushions
//!
//! Ball-ball contacts are found with a swept (constant-velocity) test: solve
//! `|Δp + Δv·t|² = (rA + rB)²` for the first time of impact inside the step,
//! then apply an impulse along the contact normal. Pairs are visited in
//! ascending id order so a given input always resolves the same way.

use glam::Vec3;

use super::ball::{Ball, BallId};
use super::table::Table;
use crate::consts::EPSILON;
use crate::settings::PhysicsSettings;

/// Separations below this are treated as coincident centres
const MIN_SEPARATION: f32 = 1e-4;
/// Upper bound on position-only correction sweeps per tick
const MAX_OVERLAP_PASSES: usize = 64;

/// An approaching ball-ball contact found this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub a: BallId,
    pub b: BallId,
    /// None when the contact was too soft to exchange momentum
    pub impact: Option<Impact>,
}

/// Details of a contact that exchanged momentum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impact {
    /// Whichever ball was faster before impact
    pub louder: BallId,
    /// Pre-impact speed of `louder`
    pub speed: f32,
    pub restitution: f32,
    /// Normal impulse magnitude (N·s)
    pub impulse: f32,
}

/// Borrow two distinct balls mutably
fn pair_mut(balls: &mut [Ball], i: usize, j: usize) -> (&mut Ball, &mut Ball) {
    debug_assert!(i < j);
    let (head, tail) = balls.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}

/// Earliest time in `[0, dt]` at which two moving spheres touch
///
/// Prefers the entry root. When only the exit root falls inside the step the
/// pair already overlaps at t = 0 and the exit time is returned instead.
pub fn time_of_impact(a: &Ball, b: &Ball, dt: f32) -> Option<f32> {
    let rel_pos = b.position - a.position;
    let rel_vel = b.velocity - a.velocity;
    let radius_sum = a.radius + b.radius;

    let qa = rel_vel.dot(rel_vel);
    // No relative motion: nothing to sweep, overlap correction handles contact
    if qa < EPSILON * EPSILON {
        return None;
    }
    let qb = 2.0 * rel_pos.dot(rel_vel);
    let qc = rel_pos.dot(rel_pos) - radius_sum * radius_sum;

    let discriminant = qb * qb - 4.0 * qa * qc;
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_disc = discriminant.sqrt();
    let t1 = (-qb - sqrt_disc) / (2.0 * qa);
    let t2 = (-qb + sqrt_disc) / (2.0 * qa);

    // TODO: replace the exit-root fallback with a penetration-aware solver
    // so pre-existing overlaps are reported instead of absorbed here
    [t1, t2].into_iter().find(|t| (0.0..=dt).contains(t))
}

/// Impact-speed dependent restitution, stiffer at higher speeds
pub fn restitution(speed: f32, settings: &PhysicsSettings) -> f32 {
    let t = if settings.restitution_speed > EPSILON {
        (speed / settings.restitution_speed).clamp(0.0, 1.0)
    } else {
        1.0
    };
    settings.restitution_min + (settings.restitution_max - settings.restitution_min) * t
}

/// Apply the normal impulse and a small tangential spin transfer
///
/// `normal` points from `a` toward `b`. Returns None if the pair is
/// separating; returns a contact without impact for micro-contacts.
pub fn resolve_ball_collision(
    a: &mut Ball,
    b: &mut Ball,
    normal: Vec3,
    settings: &PhysicsSettings,
) -> Option<Contact> {
    let rel_vel = b.velocity - a.velocity;
    let vn = rel_vel.dot(normal);

    // Already separating
    if vn > 0.0 {
        return None;
    }

    let mut contact = Contact {
        a: a.id,
        b: b.id,
        impact: None,
    };

    // Avoid jitter from micro-impacts
    if vn.abs() < settings.micro_contact {
        return Some(contact);
    }

    let e = restitution(rel_vel.length(), settings);
    let inv_mass_a = a.inverse_mass();
    let inv_mass_b = b.inverse_mass();
    let j = -(1.0 + e) * vn / (inv_mass_a + inv_mass_b);
    let impulse = normal * j;

    let (louder, speed) = if a.speed() > b.speed() {
        (a.id, a.speed())
    } else {
        (b.id, b.speed())
    };

    a.velocity -= impulse * inv_mass_a;
    b.velocity += impulse * inv_mass_b;

    // Tangential friction transfers a little spin
    let tangent = (rel_vel - normal * vn).normalize_or_zero();
    let friction_impulse = tangent * (settings.ball_friction * j);
    let torque_dir = normal.cross(friction_impulse);
    a.angular_velocity -= torque_dir / a.radius;
    b.angular_velocity += torque_dir / b.radius;

    contact.impact = Some(Impact {
        louder,
        speed,
        restitution: e,
        impulse: j,
    });
    Some(contact)
}

/// Swept ball-ball pass over every in-play pair
///
/// Approaching contacts are appended to `contacts` in resolution order.
pub fn handle_ball_collisions(
    balls: &mut [Ball],
    dt: f32,
    settings: &PhysicsSettings,
    contacts: &mut Vec<Contact>,
) {
    let count = balls.len();
    for i in 0..count {
        if !balls[i].in_play {
            continue;
        }
        for j in (i + 1)..count {
            if !balls[j].in_play {
                continue;
            }
            let (a, b) = pair_mut(balls, i, j);

            let Some(t) = time_of_impact(a, b, dt) else {
                continue;
            };

            let future_a = a.position + a.velocity * t;
            let future_b = b.position + b.velocity * t;
            let delta = future_b - future_a;
            let dist = delta.length();
            if dist < EPSILON {
                continue;
            }
            let normal = delta / dist;

            let penetration = (a.radius + b.radius - dist) * 0.5;
            a.position -= normal * penetration;
            b.position += normal * penetration;

            if let Some(contact) = resolve_ball_collision(a, b, normal, settings) {
                log::trace!("contact {}-{} at t={t:.5}: {:?}", a.id, b.id, contact.impact);
                contacts.push(contact);
            }
        }
    }
}

/// Position-only separation of any pairs still interpenetrating
///
/// Sequential pair resolution can push an already-fixed pair back into
/// overlap, so this sweeps until a pass corrects nothing or the pass limit
/// is reached.
/// Returns the number of corrections made.
pub fn resolve_residual_overlaps(balls: &mut [Ball]) -> usize {
    let count = balls.len();
    let mut total = 0;

    for _ in 0..MAX_OVERLAP_PASSES {
        let mut corrected = 0;
        for i in 0..count {
            if !balls[i].in_play {
                continue;
            }
            for j in (i + 1)..count {
                if !balls[j].in_play {
                    continue;
                }
                let (a, b) = pair_mut(balls, i, j);

                let delta = b.position - a.position;
                let dist = delta.length();
                let min_dist = a.radius + b.radius;

                if dist < min_dist && dist > MIN_SEPARATION {
                    let normal = delta / dist;
                    let penetration = (min_dist - dist) * 0.5;
                    a.position -= normal * penetration;
                    b.position += normal * penetration;
                    corrected += 1;
                }
            }
        }
        total += corrected;
        if corrected == 0 {
            break;
        }
    }

    total
}

/// Reflect a ball off the cushion it overlaps most
///
/// The ball is always pushed back to the cushion face; velocity is only
/// reflected while it still points into the cushion. Returns the pre-impact
/// speed when a cushion was hit.
pub fn ball_cushion_collision(ball: &mut Ball, table: &Table, settings: &PhysicsSettings) -> Option<f32> {
    let contact = table.cushion_contact(ball.position, ball.radius)?;
    ball.position += contact.normal * contact.penetration;

    if ball.velocity.dot(contact.normal) >= 0.0 {
        return None;
    }
    let speed = ball.speed();
    ball.velocity = reflect_velocity(ball.velocity, contact.normal) * settings.cushion_restitution;
    ball.angular_velocity *= settings.cushion_spin_damping;

    Some(speed)
}

/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec3, normal: Vec3) -> Vec3 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{BALL_MASS, BALL_RADIUS, SIM_DT};
    use proptest::prelude::*;

    fn ball(id: BallId, x: f32, z: f32) -> Ball {
        Ball::new(id, Vec3::new(x, BALL_RADIUS, z), BALL_RADIUS, BALL_MASS)
    }

    /// Smallest centre distance over all pairs
    fn closest_pair(balls: &[Ball]) -> f32 {
        let mut worst = f32::INFINITY;
        for (i, a) in balls.iter().enumerate() {
            for b in &balls[i + 1..] {
                worst = worst.min(a.position.distance(b.position));
            }
        }
        worst
    }

    #[test]
    fn test_time_of_impact_head_on() {
        let mut a = ball(0, 0.0, 0.0);
        let b = ball(1, 0.1, 0.0);
        a.velocity = Vec3::new(4.0, 0.0, 0.0);

        // Gap is 0.1 - 2r = 0.043 m, closing at 4 m/s
        let t = time_of_impact(&a, &b, 0.02).expect("should collide");
        let expected = (0.1 - 2.0 * BALL_RADIUS) / 4.0;
        assert!((t - expected).abs() < 1e-5, "t={t}, expected {expected}");

        // Too far for a shorter step
        assert!(time_of_impact(&a, &b, 0.005).is_none());
    }

    #[test]
    fn test_time_of_impact_miss() {
        let mut a = ball(0, 0.0, 0.0);
        let b = ball(1, 0.1, 0.2);
        a.velocity = Vec3::new(4.0, 0.0, 0.0);
        assert!(time_of_impact(&a, &b, 1.0).is_none());
    }

    #[test]
    fn test_time_of_impact_no_relative_motion() {
        let mut a = ball(0, 0.0, 0.0);
        let mut b = ball(1, 0.05, 0.0);
        a.velocity = Vec3::new(1.0, 0.0, 0.0);
        b.velocity = Vec3::new(1.0, 0.0, 0.0);
        assert!(time_of_impact(&a, &b, SIM_DT).is_none());
    }

    #[test]
    fn test_time_of_impact_exit_root_when_overlapping() {
        let mut a = ball(0, 0.0, 0.0);
        let b = ball(1, 2.0 * BALL_RADIUS - 0.002, 0.0);
        // Moving apart from an overlapping start
        a.velocity = Vec3::new(-1.0, 0.0, 0.0);
        let t = time_of_impact(&a, &b, SIM_DT).expect("exit root inside step");
        assert!((t - 0.002).abs() < 1e-4);
    }

    #[test]
    fn test_restitution_range() {
        let s = PhysicsSettings::default();
        assert!((restitution(0.0, &s) - 0.85).abs() < 1e-6);
        assert!((restitution(1.25, &s) - 0.915).abs() < 1e-6);
        assert!((restitution(2.5, &s) - 0.98).abs() < 1e-6);
        assert!((restitution(40.0, &s) - 0.98).abs() < 1e-6);
    }

    #[test]
    fn test_head_on_collision_transfers_velocity() {
        let s = PhysicsSettings::default();
        let mut a = ball(0, 0.0, 0.0);
        let mut b = ball(1, 2.0 * BALL_RADIUS, 0.0);
        a.velocity = Vec3::new(3.0, 0.0, 0.0);

        let contact = resolve_ball_collision(&mut a, &mut b, Vec3::X, &s).expect("approaching");
        let impact = contact.impact.expect("not a micro-contact");
        assert_eq!(impact.louder, 0);
        assert!((impact.restitution - 0.98).abs() < 1e-6);

        assert!(b.velocity.x > 2.9);
        assert!(a.velocity.x.abs() < 0.1);
        // Momentum along the normal is conserved
        assert!((a.velocity.x + b.velocity.x - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_separating_pair_is_skipped() {
        let s = PhysicsSettings::default();
        let mut a = ball(0, 0.0, 0.0);
        let mut b = ball(1, 2.0 * BALL_RADIUS, 0.0);
        b.velocity = Vec3::new(1.0, 0.0, 0.0);
        assert!(resolve_ball_collision(&mut a, &mut b, Vec3::X, &s).is_none());
        assert_eq!(b.velocity, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_micro_contact_leaves_velocities() {
        let s = PhysicsSettings::default();
        let mut a = ball(0, 0.0, 0.0);
        let mut b = ball(1, 2.0 * BALL_RADIUS, 0.0);
        a.velocity = Vec3::new(0.01, 0.0, 0.0);

        let contact = resolve_ball_collision(&mut a, &mut b, Vec3::X, &s).expect("approaching");
        assert!(contact.impact.is_none());
        assert_eq!(a.velocity, Vec3::new(0.01, 0.0, 0.0));
        assert_eq!(b.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_glancing_collision_adds_spin() {
        let s = PhysicsSettings::default();
        let mut a = ball(0, 0.0, 0.0);
        let mut b = ball(1, 0.05, 0.02);
        a.velocity = Vec3::new(2.0, 0.0, 0.0);
        let normal = (b.position - a.position).normalize();

        resolve_ball_collision(&mut a, &mut b, normal, &s).expect("approaching");
        assert!(a.angular_velocity.length() > 0.0);
        assert!(b.angular_velocity.length() > 0.0);
    }

    #[test]
    fn test_handle_collisions_reports_pair_in_order() {
        let s = PhysicsSettings::default();
        let mut balls = vec![ball(0, 0.0, 0.0), ball(1, 0.06, 0.0), ball(2, 0.5, 0.0)];
        balls[0].velocity = Vec3::new(2.0, 0.0, 0.0);

        let mut contacts = Vec::new();
        handle_ball_collisions(&mut balls, SIM_DT, &s, &mut contacts);

        assert_eq!(contacts.len(), 1);
        assert_eq!((contacts[0].a, contacts[0].b), (0, 1));
        assert!(balls[1].velocity.x > 1.5);
        assert_eq!(balls[2].velocity, Vec3::ZERO);
    }

    #[test]
    fn test_out_of_play_balls_are_ignored() {
        let s = PhysicsSettings::default();
        let mut balls = vec![ball(0, 0.0, 0.0), ball(1, 0.06, 0.0)];
        balls[0].velocity = Vec3::new(2.0, 0.0, 0.0);
        balls[1].in_play = false;

        let mut contacts = Vec::new();
        handle_ball_collisions(&mut balls, SIM_DT, &s, &mut contacts);
        assert!(contacts.is_empty());
        assert_eq!(balls[1].velocity, Vec3::ZERO);
    }

    #[test]
    fn test_compressed_cluster_is_separated() {
        // Five balls squeezed along a line, each overlapping its neighbours
        let mut balls: Vec<Ball> = (0..5).map(|i| ball(i, f32::from(i) * 0.05, 0.0)).collect();
        assert!(resolve_residual_overlaps(&mut balls) > 0);

        let worst = closest_pair(&balls);
        assert!(worst >= 2.0 * BALL_RADIUS - 1e-4, "worst gap {worst}");
    }

    #[test]
    fn test_cushion_push_out_without_reflection_when_leaving() {
        let s = PhysicsSettings::default();
        let table = Table::default();
        let mut b = ball(3, table.half_length + 0.004, 0.0);
        b.velocity = Vec3::new(-1.0, 0.0, 0.0);

        assert!(ball_cushion_collision(&mut b, &table, &s).is_none());
        assert_eq!(b.velocity, Vec3::new(-1.0, 0.0, 0.0));
        assert!(b.position.x <= table.half_length + 1e-5);
    }

    #[test]
    fn test_cushion_catches_ball_that_crossed_the_face() {
        let s = PhysicsSettings::default();
        let table = Table::default();
        // 10 m/s for one tick carries the centre well into the rail box
        let mut b = ball(3, table.half_length + BALL_RADIUS + 0.03, 0.2);
        b.velocity = Vec3::new(10.0, 0.0, 0.0);

        assert!(ball_cushion_collision(&mut b, &table, &s).is_some());
        assert!(b.velocity.x < 0.0);
        assert!(!table.is_off_table(b.position, b.radius));
        assert!((b.position.x - table.half_length).abs() < 1e-5);
    }

    #[test]
    fn test_cushion_reflection() {
        let s = PhysicsSettings::default();
        let table = Table::default();
        let mut b = ball(3, table.half_length + 0.004, 0.0);
        b.velocity = Vec3::new(2.0, 0.0, 0.5);
        b.angular_velocity = Vec3::new(0.0, 10.0, 0.0);

        let speed = ball_cushion_collision(&mut b, &table, &s).expect("touching foot rail");
        assert!((speed - Vec3::new(2.0, 0.0, 0.5).length()).abs() < 1e-5);
        assert!((b.velocity.x + 1.8).abs() < 1e-5);
        assert!((b.velocity.z - 0.45).abs() < 1e-5);
        assert!((b.angular_velocity.y - 9.5).abs() < 1e-4);
        assert!(b.position.x <= table.half_length + 1e-5);
    }

    proptest! {
        #[test]
        fn prop_overlap_correction_separates_pair(
            dx in -0.056f32..0.056,
            dz in -0.056f32..0.056,
        ) {
            prop_assume!((dx * dx + dz * dz).sqrt() > 1e-3);
            let mut balls = vec![ball(0, 0.0, 0.0), ball(1, dx, dz)];
            resolve_residual_overlaps(&mut balls);
            let dist = balls[0].position.distance(balls[1].position);
            prop_assert!(dist >= 2.0 * BALL_RADIUS - 1e-5);
        }

        #[test]
        fn prop_overlap_correction_separates_cluster(
            offsets in prop::collection::vec((-0.08f32..0.08, -0.08f32..0.08), 3..=6),
        ) {
            let mut balls: Vec<Ball> = offsets
                .iter()
                .enumerate()
                .map(|(i, &(x, z))| ball(i as BallId, x, z))
                .collect();
            prop_assume!(closest_pair(&balls) > 2e-3);

            resolve_residual_overlaps(&mut balls);
            let worst = closest_pair(&balls);
            prop_assert!(worst >= 2.0 * BALL_RADIUS - 1e-3, "worst gap {}", worst);
        }

        #[test]
        fn prop_normal_velocity_follows_restitution(
            vx in -5.0f32..-0.1,
            vz in -2.0f32..2.0,
            nz in -0.9f32..0.9,
        ) {
            let s = PhysicsSettings::default();
            let normal = Vec3::new(1.0, 0.0, nz).normalize();
            let mut a = ball(0, 0.0, 0.0);
            let mut b = ball(1, 0.0, 0.0);
            b.velocity = Vec3::new(vx, 0.0, vz);

            let rel_before = (b.velocity - a.velocity).dot(normal);
            prop_assume!(rel_before < -s.micro_contact);

            let contact = resolve_ball_collision(&mut a, &mut b, normal, &s).unwrap();
            let e = contact.impact.unwrap().restitution;
            prop_assert!((0.85..=0.98).contains(&e));

            let rel_after = (b.velocity - a.velocity).dot(normal);
            prop_assert!((rel_after + e * rel_before).abs() < 1e-4);
        }
    }
}
