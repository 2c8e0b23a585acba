//! Skeleton description handed over by the import pipeline
//!
//! Bones are listed parent-first; dynamic bones carry the spring parameters
//! tagged on them at authoring time.

pub mod sample;

use serde::{Deserialize, Serialize};

use crate::collision::ColliderShape;
use crate::core::error::{ConfigurationError, Result};
use crate::core::transform::Transform;

/// Spring parameters authored on a dynamic bone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DynamicTag {
    pub stiffness: f32,
    pub damping: f32,
    /// Half-angle of the cone the bone may swing within (radians)
    pub angle_limit: f32,
    /// Share of the parent's motion the tail is carried along with (0.0-1.0)
    pub inertia: f32,
    /// Visual importance of the chain this bone roots; read from chain roots only
    pub priority: f32,
}

impl Default for DynamicTag {
    fn default() -> Self {
        Self {
            stiffness: 10.0,
            damping: 2.0,
            angle_limit: std::f32::consts::FRAC_PI_3,
            inertia: 0.0,
            priority: 1.0,
        }
    }
}

/// One bone of the character skeleton
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonBone {
    pub name: String,
    pub parent: Option<usize>,
    /// Rest transform relative to the parent
    pub rest: Transform,
    pub dynamic: Option<DynamicTag>,
}

/// Explicit chain authored by the DCC tooling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainDefinition {
    pub name: String,
    /// Skeleton indices, root to tip
    pub bones: Vec<usize>,
    /// Overrides the root tag's priority when set
    pub priority: Option<f32>,
}

/// A collider shape attached to a skeleton bone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColliderDesc {
    pub bone: usize,
    pub shape: ColliderShape,
}

/// Everything the import pipeline hands over for one character type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharacterRig {
    pub skeleton: SkeletonDesc,
    /// Explicit chains; discovered from dynamic tags when empty
    pub chains: Vec<ChainDefinition>,
    pub colliders: Vec<ColliderDesc>,
}

/// Character skeleton, parent-first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkeletonDesc {
    pub bones: Vec<SkeletonBone>,
}

impl SkeletonDesc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a bone and return its index
    pub fn push(
        &mut self,
        name: impl Into<String>,
        parent: Option<usize>,
        rest: Transform,
        dynamic: Option<DynamicTag>,
    ) -> usize {
        self.bones.push(SkeletonBone {
            name: name.into(),
            parent,
            rest,
            dynamic,
        });
        self.bones.len() - 1
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bone(&self, index: usize) -> Result<&SkeletonBone> {
        self.bones.get(index).ok_or(ConfigurationError::UnknownBone(index))
    }

    pub fn is_dynamic(&self, index: usize) -> bool {
        self.bones.get(index).is_some_and(|b| b.dynamic.is_some())
    }

    pub fn children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.bones
            .iter()
            .enumerate()
            .filter(move |(_, bone)| bone.parent == Some(index))
            .map(|(i, _)| i)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    /// Every parent must precede its children
    pub fn validate(&self) -> Result<()> {
        for (index, bone) in self.bones.iter().enumerate() {
            if let Some(parent) = bone.parent {
                if parent >= index {
                    return Err(ConfigurationError::InvalidConfig(format!(
                        "bone '{}' ({}) is listed before its parent {}",
                        bone.name, index, parent
                    )));
                }
            }
        }
        Ok(())
    }

    /// World transforms of the rest pose, rooted at `root`
    pub fn rest_world_pose(&self, root: &Transform) -> Vec<Transform> {
        let mut world: Vec<Transform> = Vec::with_capacity(self.bones.len());
        for bone in &self.bones {
            let parent = bone
                .parent
                .and_then(|p| world.get(p).copied())
                .unwrap_or(*root);
            world.push(parent.mul_transform(&bone.rest));
        }
        world
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_rest_world_pose_accumulates_offsets() {
        let mut skeleton = SkeletonDesc::new();
        let hips = skeleton.push("hips", None, Transform::from_translation(Vec3::Y), None);
        let spine = skeleton.push(
            "spine",
            Some(hips),
            Transform::from_translation(Vec3::new(0.0, 0.5, 0.0)),
            None,
        );

        let world = skeleton.rest_world_pose(&Transform::IDENTITY);
        assert!((world[spine].translation - Vec3::new(0.0, 1.5, 0.0)).length() < 1e-6);
        assert_eq!(skeleton.children(hips).collect::<Vec<_>>(), vec![spine]);
    }

    #[test]
    fn test_child_before_parent_rejected() {
        let mut skeleton = SkeletonDesc::new();
        skeleton.push("orphan", Some(1), Transform::IDENTITY, None);
        skeleton.push("late_parent", None, Transform::IDENTITY, None);
        assert!(skeleton.validate().is_err());
    }
}
