//! Length and swing-cone constraints

use glam::{Quat, Vec3};

/// Rotate `direction` back inside the cone of half-angle `limit` around `axis`
///
/// Both inputs must be unit length. Directions already inside are returned
/// unchanged.
pub fn clamp_to_cone(direction: Vec3, axis: Vec3, limit: f32) -> Vec3 {
    if limit >= std::f32::consts::PI {
        return direction;
    }

    let hinge = axis.cross(direction);
    let angle = hinge.length().atan2(axis.dot(direction));
    if angle <= limit {
        return direction;
    }

    let hinge = if hinge.length_squared() < 1e-12 {
        // Pointing straight back: any swing plane is as good as another
        axis.any_orthonormal_vector()
    } else {
        hinge.normalize()
    };
    (Quat::from_axis_angle(hinge, limit.max(0.0)) * axis).normalize()
}

/// Unit direction from `head` to `tail`, re-clamped to the cone around `axis`
///
/// `None` when the tail has collapsed onto the head or the result is not finite.
pub fn constrain_direction(head: Vec3, tail: Vec3, axis: Vec3, limit: f32, epsilon: f32) -> Option<Vec3> {
    let offset = tail - head;
    let length = offset.length();
    if !length.is_finite() || length <= epsilon {
        return None;
    }

    let direction = clamp_to_cone(offset / length, axis, limit);
    direction.is_finite().then_some(direction)
}
