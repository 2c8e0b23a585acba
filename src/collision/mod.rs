//! Collision module - sphere/capsule push-out for chain tails
//!
//! Only consulted when the active tier enables collision. The collider list
//! is bounded when a character spawns and resolved into a buffer of fixed
//! capacity every frame, so steady-state frames never allocate here.

pub mod primitives;

pub use primitives::{push_out, ColliderShape, WorldCollider};

use crate::core::error::SimulationWarning;
use crate::core::transform::Transform;
use crate::skeleton::ColliderDesc;

/// A character's colliders and their per-frame world-space resolution
#[derive(Debug, Clone)]
pub struct ColliderSet {
    descs: Vec<ColliderDesc>,
    resolved: Vec<WorldCollider>,
    /// Per collider, whether its bone was missing at the last `resolve`
    missing: Vec<bool>,
}

impl ColliderSet {
    /// Keep at most `max_colliders` descriptors
    pub fn new(mut descs: Vec<ColliderDesc>, max_colliders: usize) -> Self {
        if descs.len() > max_colliders {
            tracing::warn!(
                "Character has {} colliders, keeping the first {}",
                descs.len(),
                max_colliders
            );
            descs.truncate(max_colliders);
        }
        let resolved = Vec::with_capacity(descs.len());
        let missing = vec![false; descs.len()];
        Self {
            descs,
            resolved,
            missing,
        }
    }

    pub fn len(&self) -> usize {
        self.descs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descs.is_empty()
    }

    /// Resolve up to `limit` colliders against the frame's world pose
    ///
    /// Colliders whose bone is missing from the pose are skipped. Each one
    /// is reported through `warn` on the frame it goes missing, not again
    /// until its bone has come back.
    pub fn resolve(
        &mut self,
        world_pose: &[Transform],
        limit: usize,
        mut warn: impl FnMut(SimulationWarning),
    ) {
        self.resolved.clear();
        for (index, (desc, missing)) in self.descs.iter().zip(&mut self.missing).take(limit).enumerate() {
            match world_pose.get(desc.bone) {
                Some(bone_world) if bone_world.is_valid() => {
                    if *missing {
                        tracing::debug!(collider = index, "Collider bone back in frame pose");
                        *missing = false;
                    }
                    self.resolved.push(desc.shape.to_world(bone_world));
                }
                _ if *missing => {}
                _ => {
                    *missing = true;
                    warn(SimulationWarning::MissingColliderData { collider: index });
                }
            }
        }
    }

    /// Colliders resolved by the last `resolve` call
    pub fn world(&self) -> &[WorldCollider] {
        &self.resolved
    }

    pub fn clear_resolved(&mut self) {
        self.resolved.clear();
    }
}
