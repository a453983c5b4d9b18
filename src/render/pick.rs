//! Ray picking against oriented boxes.
//!
//! Every candidate is a box in its own frame: bounds relative to a pivot,
//! rotated about that pivot. Each of the six faces is intersected as an
//! infinite plane and the hit is accepted when it lies inside the box.
//! The nearest positive distance wins.

use crate::assets::BoundingBox;
use crate::geometry::{ray_plane_distance, rotate_euler, unrotate_euler, Ray};
use crate::scene::rails::{RailWaypoint, WAYPOINT_HALF_EXTENT};
use crate::scene::ObjectId;
use glam::Vec3;

/// Slack when testing whether a face hit lies inside the box.
const FACE_TOLERANCE: f32 = 1e-3;

// ========================================================================
// PickKey: what a hit refers to
// ========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PickKey {
    Object(ObjectId),
    RailWaypoint { rail: usize, waypoint: usize },
}

impl PickKey {
    pub fn object(&self) -> Option<ObjectId> {
        match self {
            Self::Object(id) => Some(*id),
            Self::RailWaypoint { .. } => None,
        }
    }
}

// ========================================================================
// PickTarget: one candidate box
// ========================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickTarget {
    pub key: PickKey,
    pub pivot: Vec3,
    /// Already scaled, relative to `pivot`, before rotation.
    pub bounds: BoundingBox,
    pub rotation_deg: Vec3,
}

impl PickTarget {
    pub fn waypoint(rail: usize, index: usize, waypoint: &RailWaypoint) -> Self {
        Self {
            key: PickKey::RailWaypoint {
                rail,
                waypoint: index,
            },
            pivot: waypoint.position(),
            bounds: BoundingBox::cube(WAYPOINT_HALF_EXTENT),
            rotation_deg: waypoint.rotation_deg(),
        }
    }

    /// (outward normal, face centre) in world space, in +X -X +Y -Y +Z -Z order.
    fn faces(&self) -> [(Vec3, Vec3); 6] {
        let min = self.bounds.min();
        let max = self.bounds.max();
        let center = self.bounds.center();
        let local = [
            (Vec3::X, Vec3::new(max.x, center.y, center.z)),
            (Vec3::NEG_X, Vec3::new(min.x, center.y, center.z)),
            (Vec3::Y, Vec3::new(center.x, max.y, center.z)),
            (Vec3::NEG_Y, Vec3::new(center.x, min.y, center.z)),
            (Vec3::Z, Vec3::new(center.x, center.y, max.z)),
            (Vec3::NEG_Z, Vec3::new(center.x, center.y, min.z)),
        ];
        local.map(|(normal, point)| {
            (
                rotate_euler(normal, self.rotation_deg),
                self.pivot + rotate_euler(point, self.rotation_deg),
            )
        })
    }
}

// ========================================================================
// PickHit: result of a pick
// ========================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub key: PickKey,
    /// Distance along the ray.
    pub t: f32,
    pub point: Vec3,
    /// Normal of the face that was hit; dragging happens in this plane.
    pub normal: Vec3,
    /// Centre of the face that was hit.
    pub plane_point: Vec3,
    pub pivot: Vec3,
    /// Pivot minus hit point, kept constant while dragging.
    pub grab_offset: Vec3,
}

pub struct Picker;

impl Picker {
    /// Nearest hit of `ray` among `targets`. Ties keep the earlier candidate.
    pub fn pick<'a>(
        ray: &Ray,
        targets: impl IntoIterator<Item = &'a PickTarget>,
    ) -> Option<PickHit> {
        let mut best: Option<PickHit> = None;
        for target in targets {
            for (normal, plane_point) in target.faces() {
                let Some(t) = ray_plane_distance(ray, plane_point, normal) else {
                    continue;
                };
                let nearest = best.map(|hit| hit.t).unwrap_or(f32::INFINITY);
                if t <= 0.0 || t >= nearest {
                    continue;
                }
                let point = ray.at(t);
                let local = unrotate_euler(point - target.pivot, target.rotation_deg);
                if !target.bounds.contains(local, FACE_TOLERANCE) {
                    continue;
                }
                best = Some(PickHit {
                    key: target.key,
                    t,
                    point,
                    normal,
                    plane_point,
                    pivot: target.pivot,
                    grab_offset: target.pivot - point,
                });
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-4
    }

    fn unit_box(id: u64, pivot: Vec3) -> PickTarget {
        PickTarget {
            key: PickKey::Object(ObjectId(id)),
            pivot,
            bounds: BoundingBox::cube(1.0),
            rotation_deg: Vec3::ZERO,
        }
    }

    #[test]
    fn unit_box_is_hit_on_near_face() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        let hit = Picker::pick(&ray, &[unit_box(1, Vec3::ZERO)]).unwrap();
        assert!((hit.t - 4.0).abs() < 1e-5);
        assert!(approx(hit.point, Vec3::new(0.0, 0.0, -1.0)));
        assert!(approx(hit.normal, Vec3::NEG_Z));
        assert!(approx(hit.grab_offset, Vec3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn offset_parallel_ray_misses() {
        let ray = Ray::new(Vec3::new(3.0, 0.0, -5.0), Vec3::Z);
        assert!(Picker::pick(&ray, &[unit_box(1, Vec3::ZERO)]).is_none());
    }

    #[test]
    fn boxes_behind_the_ray_are_ignored() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z);
        assert!(Picker::pick(&ray, &[unit_box(1, Vec3::ZERO)]).is_none());
    }

    #[test]
    fn nearer_of_overlapping_boxes_wins() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        let far = unit_box(1, Vec3::new(0.0, 0.0, 1.5));
        let near = unit_box(2, Vec3::new(0.0, 0.0, 0.5));
        let hit = Picker::pick(&ray, &[far, near]).unwrap();
        assert_eq!(hit.key, PickKey::Object(ObjectId(2)));
        let hit = Picker::pick(&ray, &[near, far]).unwrap();
        assert_eq!(hit.key, PickKey::Object(ObjectId(2)));
    }

    #[test]
    fn equal_distance_keeps_first_candidate() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        let hit = Picker::pick(&ray, &[unit_box(1, Vec3::ZERO), unit_box(2, Vec3::ZERO)]).unwrap();
        assert_eq!(hit.key, PickKey::Object(ObjectId(1)));
    }

    #[test]
    fn rotated_box_is_hit_on_rotated_face() {
        // A long thin box turned 90 degrees about Z stands upright.
        let target = PickTarget {
            key: PickKey::Object(ObjectId(1)),
            pivot: Vec3::ZERO,
            bounds: BoundingBox::new(Vec3::new(-10.0, -1.0, -1.0), Vec3::new(10.0, 1.0, 1.0)),
            rotation_deg: Vec3::new(0.0, 0.0, 90.0),
        };
        let above = Ray::new(Vec3::new(0.0, 50.0, 0.0), Vec3::NEG_Y);
        let hit = Picker::pick(&above, &[target]).unwrap();
        assert!((hit.t - 40.0).abs() < 1e-3);

        // Unrotated, the box would span x = 8; rotated it does not.
        let side = Ray::new(Vec3::new(8.0, 0.0, -5.0), Vec3::Z);
        assert!(Picker::pick(&side, &[target]).is_none());
    }

    #[test]
    fn waypoints_are_pickable() {
        let waypoint = RailWaypoint::at(1000, 0, 0);
        let target = PickTarget::waypoint(3, 7, &waypoint);
        let ray = Ray::new(Vec3::new(1000.0, 0.0, -500.0), Vec3::Z);
        let hit = Picker::pick(&ray, &[target]).unwrap();
        assert_eq!(
            hit.key,
            PickKey::RailWaypoint {
                rail: 3,
                waypoint: 7
            }
        );
        assert!((hit.t - (500.0 - WAYPOINT_HALF_EXTENT)).abs() < 1e-3);
    }
}
