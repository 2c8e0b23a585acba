//! Rigid transforms (translation + rotation) used for bones and anchors
//!
//! Outfit rigs are authored without scale on dynamic bones, so a full
//! affine matrix is unnecessary; keeping rotation as a quaternion avoids
//! re-extracting it from a matrix every step.

use glam::{Quat, Vec3};

/// A rigid transform: rotate, then translate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self::new(translation, Quat::IDENTITY)
    }

    /// Compose `self` (parent) with `child` expressed in the parent's space
    pub fn mul_transform(&self, child: &Transform) -> Transform {
        Transform {
            translation: self.translation + self.rotation * child.translation,
            rotation: (self.rotation * child.rotation).normalize(),
        }
    }

    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.translation + self.rotation * point
    }

    pub fn inverse(&self) -> Transform {
        let rotation = self.rotation.inverse();
        Transform {
            translation: rotation * -self.translation,
            rotation,
        }
    }

    /// True when every component is finite and the rotation is unit length
    pub fn is_valid(&self) -> bool {
        self.translation.is_finite() && self.rotation.is_finite() && self.rotation.is_normalized()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
