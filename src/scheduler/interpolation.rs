//! Easing displayed rotations toward the last integration result

use glam::Quat;

/// Move each displayed rotation `blend` of the way to its target
///
/// `blend >= 1.0` copies the targets exactly.
pub fn blend_towards(displayed: &mut [Quat], target: &[Quat], blend: f32) {
    if blend >= 1.0 {
        displayed.copy_from_slice(target);
        return;
    }
    for (shown, &goal) in displayed.iter_mut().zip(target) {
        *shown = shown.slerp(goal, blend).normalize();
    }
}
