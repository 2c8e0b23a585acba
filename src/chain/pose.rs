//! Idle (static) pose snapshots and the per-bone output handed to skinning

use glam::{Quat, Vec3};

use crate::core::transform::Transform;

/// Authored rest pose of a chain, captured once at build time
///
/// Re-applied verbatim whenever a chain falls back to `Static`, so the
/// rendered pose matches the authored rotations bit for bit.
#[derive(Debug, Clone, PartialEq)]
pub struct IdlePose {
    rotations: Vec<Quat>,
    translations: Vec<Vec3>,
}

impl IdlePose {
    pub fn capture<'a>(rest_locals: impl IntoIterator<Item = &'a Transform>) -> Self {
        let (translations, rotations) = rest_locals
            .into_iter()
            .map(|t| (t.translation, t.rotation))
            .unzip();
        Self {
            rotations,
            translations,
        }
    }

    pub fn rotations(&self) -> &[Quat] {
        &self.rotations
    }

    pub fn translations(&self) -> &[Vec3] {
        &self.translations
    }

    pub fn len(&self) -> usize {
        self.rotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rotations.is_empty()
    }
}

/// Local transform of one skeleton bone, ready for skinning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BonePose {
    /// Skeleton bone index
    pub bone: usize,
    pub local: Transform,
}
