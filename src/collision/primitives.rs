//! Sphere and capsule primitives with point push-out

use glam::Vec3;

use crate::core::transform::Transform;

const SEPARATION_EPSILON: f32 = 1e-6;
/// Extra clearance for simultaneous pushes, so they leave the contact surface
const CONTACT_SKIN: f32 = 1e-4;
/// Simultaneous push rounds tried after the sequential passes
const MAX_JOINT_ROUNDS: usize = 32;

/// Collider shape in the space of the bone it is attached to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderShape {
    Sphere { offset: Vec3, radius: f32 },
    Capsule { offset: Vec3, tail: Vec3, radius: f32 },
}

impl ColliderShape {
    pub fn to_world(&self, bone_world: &Transform) -> WorldCollider {
        match *self {
            ColliderShape::Sphere { offset, radius } => WorldCollider::Sphere {
                center: bone_world.transform_point(offset),
                radius,
            },
            ColliderShape::Capsule {
                offset,
                tail,
                radius,
            } => WorldCollider::Capsule {
                start: bone_world.transform_point(offset),
                end: bone_world.transform_point(tail),
                radius,
            },
        }
    }
}

/// Collider resolved into world space for the current frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorldCollider {
    Sphere { center: Vec3, radius: f32 },
    Capsule { start: Vec3, end: Vec3, radius: f32 },
}

impl WorldCollider {
    /// Closest point on the collider's core (centre or segment) to `point`
    fn closest_core_point(&self, point: Vec3) -> (Vec3, f32) {
        match *self {
            WorldCollider::Sphere { center, radius } => (center, radius),
            WorldCollider::Capsule { start, end, radius } => {
                let seg = end - start;
                let seg_len_sq = seg.length_squared();
                let t = if seg_len_sq < 1e-10 {
                    0.0
                } else {
                    ((point - start).dot(seg) / seg_len_sq).clamp(0.0, 1.0)
                };
                (start + seg * t, radius)
            }
        }
    }

    /// Direction to push a point sitting exactly on the core
    fn fallback_normal(&self) -> Vec3 {
        match *self {
            WorldCollider::Sphere { .. } => Vec3::Y,
            WorldCollider::Capsule { start, end, .. } => {
                let axis = (end - start).normalize_or_zero();
                if axis == Vec3::ZERO {
                    Vec3::Y
                } else {
                    axis.any_orthonormal_vector()
                }
            }
        }
    }

    /// Shortest vector that moves a sphere of `radius` at `point` out of the collider
    ///
    /// `None` when they do not intersect.
    pub fn separation(&self, point: Vec3, radius: f32) -> Option<Vec3> {
        let (core, core_radius) = self.closest_core_point(point);
        let min_dist = core_radius + radius;
        let diff = point - core;
        let dist = diff.length();

        if dist >= min_dist {
            return None;
        }

        let normal = if dist > SEPARATION_EPSILON {
            diff / dist
        } else {
            self.fallback_normal()
        };
        Some(normal * (min_dist - dist))
    }

    pub fn contains(&self, point: Vec3, radius: f32) -> bool {
        self.separation(point, radius).is_some()
    }
}

/// Push `point` out of every collider
///
/// Runs up to `passes` collider-by-collider passes. Overlapping colliders
/// can bounce the point between them, so anything still inside afterwards
/// is pushed against all intersecting colliders at once for a bounded
/// number of rounds. Returns `point` unchanged when nothing intersects and
/// `None` when no position clear of every collider was found.
pub fn push_out(point: Vec3, radius: f32, colliders: &[WorldCollider], passes: usize) -> Option<Vec3> {
    let mut resolved = point;
    for _pass in 0..passes {
        let mut moved = false;
        for collider in colliders {
            if let Some(push) = collider.separation(resolved, radius) {
                resolved += push;
                moved = true;
            }
        }
        if !moved {
            return Some(resolved);
        }
    }

    for _round in 0..MAX_JOINT_ROUNDS {
        if !colliders.iter().any(|c| c.contains(resolved, radius)) {
            return Some(resolved);
        }
        let push: Vec3 = colliders
            .iter()
            .filter_map(|c| c.separation(resolved, radius))
            .map(|push| push + push.normalize_or_zero() * CONTACT_SKIN)
            .sum();
        if push.length_squared() == 0.0 {
            // Pushes cancel out: the point sits on a symmetry plane of the overlap
            return None;
        }
        resolved += push;
    }

    (!colliders.iter().any(|c| c.contains(resolved, radius))).then_some(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn test_sphere_push_out() {
        let sphere = WorldCollider::Sphere {
            center: Vec3::ZERO,
            radius: 0.1,
        };

        let result = push_out(Vec3::new(0.05, 0.0, 0.0), 0.01, &[sphere], 3).unwrap();
        assert!((result.x - 0.11).abs() < 1e-5, "pushed to surface, got {result}");
        assert!(!sphere.contains(result + Vec3::X * 1e-4, 0.01));
    }

    #[test]
    fn test_capsule_push_out_is_perpendicular() {
        let capsule = WorldCollider::Capsule {
            start: Vec3::new(0.0, -0.5, 0.0),
            end: Vec3::new(0.0, 0.5, 0.0),
            radius: 0.1,
        };

        let point = Vec3::new(0.05, 0.2, 0.0);
        let result = push_out(point, 0.0, &[capsule], 3).unwrap();
        assert!((result.y - 0.2).abs() < 1e-6, "no motion along the axis");
        assert!((result.x - 0.1).abs() < 1e-5);
    }

    #[test]
    fn test_point_outside_untouched() {
        let sphere = WorldCollider::Sphere {
            center: Vec3::ZERO,
            radius: 0.1,
        };
        let point = Vec3::new(0.0, 1.0, 0.0);
        assert_eq!(push_out(point, 0.02, &[sphere], 3), Some(point));
    }

    #[test]
    fn test_point_at_centre_still_resolves() {
        let sphere = WorldCollider::Sphere {
            center: Vec3::ZERO,
            radius: 0.1,
        };
        let result = push_out(Vec3::ZERO, 0.0, &[sphere], 1).unwrap();
        assert!((result.length() - 0.1).abs() < 1e-5);
    }

    #[test]
    fn test_overlapping_spheres_leave_point_outside_both() {
        let a = WorldCollider::Sphere {
            center: Vec3::ZERO,
            radius: 1.0,
        };
        let b = WorldCollider::Sphere {
            center: Vec3::new(1.5, 0.0, 0.0),
            radius: 1.0,
        };
        let point = Vec3::new(0.75, 0.01, 0.0);

        let result = push_out(point, 0.0, &[a, b], 3).unwrap();
        assert!(!a.contains(result, 0.0), "still inside a: {result}");
        assert!(!b.contains(result, 0.0), "still inside b: {result}");
        // Escapes through the rim of the lens, not back along the axis
        assert!(result.y > 0.6, "got {result}");
    }

    #[test]
    fn test_cancelling_pushes_report_unresolved() {
        let a = WorldCollider::Sphere {
            center: Vec3::ZERO,
            radius: 1.0,
        };
        let b = WorldCollider::Sphere {
            center: Vec3::new(1.5, 0.0, 0.0),
            radius: 1.0,
        };

        // On the axis every push is along X, so the point never reaches the rim
        assert_eq!(push_out(Vec3::new(0.75, 0.0, 0.0), 0.0, &[a, b], 3), None);
    }

    #[test]
    fn test_shape_follows_bone() {
        let shape = ColliderShape::Sphere {
            offset: Vec3::new(0.0, 0.1, 0.0),
            radius: 0.05,
        };
        let bone = Transform::new(Vec3::new(1.0, 0.0, 0.0), Quat::from_rotation_z(std::f32::consts::PI));

        match shape.to_world(&bone) {
            WorldCollider::Sphere { center, radius } => {
                assert!((center - Vec3::new(1.0, -0.1, 0.0)).length() < 1e-5);
                assert_eq!(radius, 0.05);
            }
            other => panic!("unexpected collider {other:?}"),
        }
    }
}
