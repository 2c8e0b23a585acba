//! Build chains from a skeleton and its dynamic-bone tags
//!
//! Two entry points: explicit chain definitions from the DCC exporter, or
//! discovery from the dynamic tags alone. Both validate the same rules:
//! chains respect the bone budget (truncated with a warning), no bone is
//! claimed twice, and every root hangs off a static anchor.

use ahash::AHashMap;
use glam::Vec3;

use crate::chain::model::{BoneChain, BoneNode};
use crate::core::config::SimulationConfig;
use crate::core::error::{ConfigurationError, Result};
use crate::core::transform::Transform;
use crate::core::types::ChainId;
use crate::scheduler::throttle::phase_seed;
use crate::skeleton::{ChainDefinition, SkeletonDesc};

/// Builds `BoneChain`s for one skeleton
pub struct ChainBuilder<'a> {
    config: &'a SimulationConfig,
}

impl<'a> ChainBuilder<'a> {
    pub fn new(config: &'a SimulationConfig) -> Self {
        Self { config }
    }

    /// Derive chain definitions from dynamic tags
    ///
    /// Each chain starts at a dynamic bone whose parent is static and follows
    /// its dynamic child down to the tip.
    pub fn discover_definitions(&self, skeleton: &SkeletonDesc) -> Result<Vec<ChainDefinition>> {
        let mut definitions = Vec::new();

        for (index, bone) in skeleton.bones.iter().enumerate() {
            if bone.dynamic.is_none() {
                continue;
            }
            let is_root = match bone.parent {
                Some(parent) => !skeleton.is_dynamic(parent),
                None => true,
            };
            if !is_root {
                continue;
            }

            let mut bones = vec![index];
            let mut current = index;
            loop {
                let mut dynamic_children = skeleton.children(current).filter(|&c| skeleton.is_dynamic(c));
                let Some(next) = dynamic_children.next() else {
                    break;
                };
                if dynamic_children.next().is_some() {
                    return Err(ConfigurationError::BranchingChain { bone: current });
                }
                bones.push(next);
                current = next;
            }

            definitions.push(ChainDefinition {
                name: bone.name.clone(),
                bones,
                priority: None,
            });
        }

        Ok(definitions)
    }

    /// Discover and build every chain of `skeleton`
    pub fn discover(&self, skeleton: &SkeletonDesc, budget: usize) -> Result<Vec<BoneChain>> {
        let definitions = self.discover_definitions(skeleton)?;
        self.build(skeleton, &definitions, budget)
    }

    /// Build chains from explicit definitions
    pub fn build(
        &self,
        skeleton: &SkeletonDesc,
        definitions: &[ChainDefinition],
        budget: usize,
    ) -> Result<Vec<BoneChain>> {
        skeleton.validate()?;

        let mut claimed: AHashMap<usize, &str> = AHashMap::new();
        for definition in definitions {
            if definition.bones.is_empty() {
                return Err(ConfigurationError::EmptyChain(definition.name.clone()));
            }
            for &bone in &definition.bones {
                skeleton.bone(bone)?;
                if let Some(first) = claimed.insert(bone, &definition.name) {
                    return Err(ConfigurationError::DuplicateBoneClaim {
                        bone,
                        first: first.to_string(),
                        second: definition.name.clone(),
                    });
                }
            }
        }

        let rest_world = skeleton.rest_world_pose(&Transform::IDENTITY);
        let mut chains = Vec::with_capacity(definitions.len());
        for (index, definition) in definitions.iter().enumerate() {
            let anchor = self.validate_links(skeleton, definition)?;
            if claimed.contains_key(&anchor) || skeleton.is_dynamic(anchor) {
                return Err(ConfigurationError::MissingAnchor {
                    chain: definition.name.clone(),
                    bone: definition.bones[0],
                });
            }

            if budget == 0 {
                return Err(ConfigurationError::BoneBudgetUnresolved {
                    chain: definition.name.clone(),
                    budget,
                });
            }
            let kept = definition.bones.len().min(budget);
            if kept < definition.bones.len() {
                tracing::warn!(
                    "Chain '{}' has {} bones, truncating to budget of {}",
                    definition.name,
                    definition.bones.len(),
                    budget
                );
            }

            let mut nodes = Vec::with_capacity(kept);
            for position in 0..kept {
                nodes.push(self.build_node(skeleton, definition, position)?);
            }

            let root = skeleton.bone(definition.bones[0])?;
            let priority = definition
                .priority
                .or_else(|| root.dynamic.map(|tag| tag.priority))
                .unwrap_or(1.0);

            let mut chain = BoneChain::new(
                ChainId(index as u32),
                definition.name.clone(),
                anchor,
                priority,
                phase_seed(&definition.name),
                nodes,
            );
            chain.reseed_from_displayed(&rest_world[anchor]);
            chains.push(chain);
        }

        tracing::info!(
            "Built {} chains ({} bones) within a budget of {} bones per chain",
            chains.len(),
            chains.iter().map(|c| c.len()).sum::<usize>(),
            budget
        );

        Ok(chains)
    }

    /// Check each bone is the child of the previous one; returns the anchor
    fn validate_links(&self, skeleton: &SkeletonDesc, definition: &ChainDefinition) -> Result<usize> {
        let root = definition.bones[0];
        let anchor = skeleton
            .bone(root)?
            .parent
            .ok_or_else(|| ConfigurationError::MissingAnchor {
                chain: definition.name.clone(),
                bone: root,
            })?;

        for pair in definition.bones.windows(2) {
            if skeleton.bone(pair[1])?.parent != Some(pair[0]) {
                return Err(ConfigurationError::BrokenChain {
                    chain: definition.name.clone(),
                    bone: pair[1],
                });
            }
        }

        Ok(anchor)
    }

    fn build_node(
        &self,
        skeleton: &SkeletonDesc,
        definition: &ChainDefinition,
        position: usize,
    ) -> Result<BoneNode> {
        let index = definition.bones[position];
        let bone = skeleton.bone(index)?;
        let tag = bone.dynamic.unwrap_or_default();
        let (tail_axis, length) = self.tail_of(skeleton, definition, position)?;

        Ok(BoneNode {
            skeleton_index: index,
            parent: position.checked_sub(1),
            rest_local: Transform::new(bone.rest.translation, bone.rest.rotation.normalize()),
            tail_axis,
            length,
            stiffness: tag.stiffness.max(0.0),
            damping: tag.damping.max(0.0),
            angle_limit: tag.angle_limit.clamp(0.0, std::f32::consts::PI),
            inertia: tag.inertia.clamp(0.0, 1.0),
            head: Vec3::ZERO,
            tail: Vec3::ZERO,
            velocity: Vec3::ZERO,
            rotation: bone.rest.rotation.normalize(),
        })
    }

    /// Tail direction (bone space) and length
    ///
    /// Uses the next chain bone, else the first skeleton child, else a
    /// synthesized tail continuing the bone's own rest direction.
    fn tail_of(
        &self,
        skeleton: &SkeletonDesc,
        definition: &ChainDefinition,
        position: usize,
    ) -> Result<(Vec3, f32)> {
        let index = definition.bones[position];
        let bone = skeleton.bone(index)?;
        let epsilon = self.config.numeric_epsilon;

        let child = definition
            .bones
            .get(position + 1)
            .copied()
            .or_else(|| skeleton.children(index).next());

        if let Some(child) = child {
            let offset = skeleton.bone(child)?.rest.translation;
            let length = offset.length();
            if length <= epsilon {
                return Err(ConfigurationError::DegenerateBone { bone: index });
            }
            return Ok((offset / length, length));
        }

        // Continue the parent-to-bone direction, expressed in bone space
        let direction = bone.rest.translation.normalize_or_zero();
        if direction == Vec3::ZERO {
            return Err(ConfigurationError::DegenerateBone { bone: index });
        }
        let local: Vec3 = bone.rest.rotation.normalize().inverse() * direction;
        Ok((local.normalize(), self.config.synthesized_tail_length))
    }
}
