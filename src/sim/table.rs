//! Table geometry: playing region, cushions, pockets and spawn points
//!
//! Cushions are axis-aligned boxes sitting just outside the legal region,
//! broken at the six pocket mouths. Pockets are spheres centred on the
//! cushion-line corners and side midpoints at felt height.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::ball::BallId;
use crate::consts::EPSILON;
use crate::settings::TableSettings;

/// Depth of a cushion box behind its face (m)
const RAIL_DEPTH: f32 = 0.05;
/// Height of the cushion nose above the felt (m)
const RAIL_HEIGHT: f32 = 0.04;
/// Pocket capture uses a slimmer capsule than the ball itself
const POCKET_CAPSULE_SCALE: f32 = 0.85;

/// Rack order, apex first, read row by row
pub const RACK_ORDER: [BallId; 15] = [1, 11, 4, 3, 8, 14, 6, 10, 9, 2, 13, 7, 12, 15, 5];

/// An axis-aligned cushion box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cushion {
    pub min: Vec3,
    pub max: Vec3,
    /// Unit normal of the playing face, pointing onto the table
    pub normal: Vec3,
}

impl Cushion {
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        point.clamp(self.min, self.max)
    }

    /// Signed distance from the playing face, positive on the table side
    pub fn face_distance(&self, point: Vec3) -> f32 {
        let face = if self.normal.x + self.normal.z < 0.0 {
            self.min
        } else {
            self.max
        };
        (point - face).dot(self.normal)
    }

    /// Whether `point` lies alongside the face, between the rail ends
    fn spans(&self, point: Vec3) -> bool {
        if self.normal.x != 0.0 {
            (self.min.z..=self.max.z).contains(&point.z)
        } else {
            (self.min.x..=self.max.x).contains(&point.x)
        }
    }

    /// Overlap of a ball with this cushion
    ///
    /// Alongside the rail the face plane decides, so a fast ball whose centre
    /// ended the step inside or behind the box is still pushed back out.
    /// Past the rail ends only the box edge can be touched.
    pub fn contact(&self, position: Vec3, radius: f32) -> Option<CushionContact> {
        // Ball clears the top of the rail
        if position.y - radius >= self.max.y {
            return None;
        }

        if self.spans(position) {
            let distance = self.face_distance(position);
            return (distance < radius).then_some(CushionContact {
                normal: self.normal,
                penetration: radius - distance,
            });
        }

        let offset = position - self.closest_point(position);
        let dist = offset.length();
        if dist >= radius || dist < EPSILON {
            return None;
        }
        Some(CushionContact {
            normal: offset / dist,
            penetration: radius - dist,
        })
    }
}

/// Result of a cushion overlap query
#[derive(Debug, Clone, Copy)]
pub struct CushionContact {
    /// Surface normal pointing toward the ball centre
    pub normal: Vec3,
    /// How far the ball sinks into the cushion
    pub penetration: f32,
}

/// A pocket capture volume
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pocket {
    pub center: Vec3,
    pub radius: f32,
}

impl Pocket {
    /// Capsule (ball centre ± one radius vertically) vs pocket sphere overlap
    pub fn captures(&self, position: Vec3, ball_radius: f32) -> bool {
        let top = position + Vec3::Y * ball_radius;
        let bottom = position - Vec3::Y * ball_radius;
        let capsule_radius = ball_radius * POCKET_CAPSULE_SCALE;

        let closest = closest_point_on_segment(bottom, top, self.center);
        closest.distance(self.center) < capsule_radius + self.radius
    }
}

fn closest_point_on_segment(a: Vec3, b: Vec3, p: Vec3) -> Vec3 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < EPSILON {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// The billiards table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Largest |x| a ball centre may reach on the felt
    pub half_length: f32,
    /// Largest |z| a ball centre may reach on the felt
    pub half_width: f32,
    /// Felt height
    pub surface_y: f32,
    pub ball_radius: f32,
    pub cushions: Vec<Cushion>,
    pub pockets: Vec<Pocket>,
    pub cue_spawn: Vec3,
    pub rack_apex: Vec3,
    rack_gap: f32,
}

impl Table {
    pub fn new(settings: &TableSettings) -> Self {
        let r = settings.ball_radius;
        let half_length = settings.length * 0.5 - settings.cushion_offset - r;
        let half_width = settings.width * 0.5 - settings.cushion_offset - r;

        // Cushion faces sit one radius beyond the legal centre region
        let face_x = half_length + r;
        let face_z = half_width + r;
        let corner_gap = settings.corner_pocket_radius * 1.25;
        let side_gap = settings.side_pocket_radius;

        let mut cushions = Vec::with_capacity(6);
        for sign in [-1.0_f32, 1.0] {
            // Long rails, split by the side pocket
            let (z_min, z_max) = if sign > 0.0 {
                (face_z, face_z + RAIL_DEPTH)
            } else {
                (-face_z - RAIL_DEPTH, -face_z)
            };
            let long_normal = Vec3::new(0.0, 0.0, -sign);
            cushions.push(Cushion {
                min: Vec3::new(-face_x + corner_gap, 0.0, z_min),
                max: Vec3::new(-side_gap, RAIL_HEIGHT, z_max),
                normal: long_normal,
            });
            cushions.push(Cushion {
                min: Vec3::new(side_gap, 0.0, z_min),
                max: Vec3::new(face_x - corner_gap, RAIL_HEIGHT, z_max),
                normal: long_normal,
            });

            // End rail
            let (x_min, x_max) = if sign > 0.0 {
                (face_x, face_x + RAIL_DEPTH)
            } else {
                (-face_x - RAIL_DEPTH, -face_x)
            };
            cushions.push(Cushion {
                min: Vec3::new(x_min, 0.0, -face_z + corner_gap),
                max: Vec3::new(x_max, RAIL_HEIGHT, face_z - corner_gap),
                normal: Vec3::new(-sign, 0.0, 0.0),
            });
        }

        let mut pockets = Vec::with_capacity(6);
        for sz in [-1.0_f32, 1.0] {
            for sx in [-1.0_f32, 1.0] {
                pockets.push(Pocket {
                    center: Vec3::new(sx * face_x, 0.0, sz * face_z),
                    radius: settings.corner_pocket_radius,
                });
            }
            pockets.push(Pocket {
                center: Vec3::new(0.0, 0.0, sz * face_z),
                radius: settings.side_pocket_radius,
            });
        }

        Self {
            half_length,
            half_width,
            surface_y: 0.0,
            ball_radius: r,
            cushions,
            pockets,
            cue_spawn: Vec3::new(-half_length * 0.5, r, 0.0),
            rack_apex: Vec3::new(half_length * 0.5, r, 0.0),
            rack_gap: settings.rack_gap,
        }
    }

    /// Centre height of a ball resting on the felt
    #[inline]
    pub fn rest_height(&self, radius: f32) -> f32 {
        self.surface_y + radius
    }

    /// Head string: the kitchen is everything with x at or below this
    #[inline]
    pub fn kitchen_line(&self) -> f32 {
        -self.half_length * 0.5
    }

    /// Whether a ball centre lies in the legal planar region
    pub fn contains(&self, position: Vec3) -> bool {
        position.x.abs() <= self.half_length && position.z.abs() <= self.half_width
    }

    /// Whether a ball centre has left the table by more than one radius
    pub fn is_off_table(&self, position: Vec3, radius: f32) -> bool {
        position.x.abs() > self.half_length + radius || position.z.abs() > self.half_width + radius
    }

    /// Deepest cushion overlap for a ball, if any
    pub fn cushion_contact(&self, position: Vec3, radius: f32) -> Option<CushionContact> {
        self.cushions
            .iter()
            .filter_map(|c| c.contact(position, radius))
            .max_by(|a, b| a.penetration.total_cmp(&b.penetration))
    }

    /// First pocket capturing a ball at `position`
    pub fn pocket_at(&self, position: Vec3, radius: f32) -> Option<usize> {
        self.pockets.iter().position(|p| p.captures(position, radius))
    }

    /// Where a removed ball is parked, below the table
    pub fn parking_spot(&self, id: BallId) -> Vec3 {
        Vec3::new(
            -self.half_length + f32::from(id) * self.ball_radius * 2.5,
            self.surface_y - 0.5,
            0.0,
        )
    }

    /// Triangle rack positions for the fifteen object balls
    pub fn rack_positions(&self) -> Vec<(BallId, Vec3)> {
        let spacing = self.ball_radius * 2.0 + self.rack_gap;
        let row_height = spacing * 3.0_f32.sqrt() / 2.0;

        let mut positions = Vec::with_capacity(RACK_ORDER.len());
        let mut ids = RACK_ORDER.iter();
        for row in 0..5 {
            for col in 0..=row {
                let Some(&id) = ids.next() else {
                    return positions;
                };
                let x = row as f32 * row_height;
                let z = (col as f32 - row as f32 * 0.5) * spacing;
                positions.push((id, self.rack_apex + Vec3::new(x, 0.0, z)));
            }
        }
        positions
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new(&TableSettings::default())
    }
}
