//! Per-character simulation context
//!
//! Owns a character's chains, colliders and pose buffer. A frame runs in
//! two passes so the world can derive the process-wide load signal in
//! between:
//! 1. `plan` - rank eligible chains against the tier budget, report demand
//! 2. `shed` (world only, over the global budget) - hold back excess chains
//! 3. `advance` - culling transitions, throttled integration, interpolation,
//!    pose write-out

use glam::Vec3;

use crate::chain::{BoneChain, BonePose};
use crate::collision::ColliderSet;
use crate::core::config::SimulationConfig;
use crate::core::error::SimulationWarning;
use crate::core::transform::Transform;
use crate::core::types::{ChainId, CharacterId, Frame};
use crate::culling::{select_within_budget, ChainState, CullingInput, GlobalCandidate, RankCandidate};
use crate::scheduler;
use crate::skeleton::ColliderDesc;
use crate::solver::{step_chain, StepParams};
use crate::tier::QualityTierProfile;

use super::stats::FrameStats;

/// What the skeleton/animation collaborator provides for one character each frame
#[derive(Debug, Clone, Copy)]
pub struct CharacterFrameInput<'a> {
    /// World transforms of the animated skeleton, by skeleton index
    pub world_pose: &'a [Transform],
    pub visible: bool,
    pub camera_distance: f32,
    /// Used to rank chains by proximity; falls back to `camera_distance`
    pub camera_position: Option<Vec3>,
    /// Frame duration in seconds
    pub dt: f32,
}

impl CharacterFrameInput<'static> {
    /// Input for a character the host sent nothing for
    pub const OFFSCREEN: CharacterFrameInput<'static> = CharacterFrameInput {
        world_pose: &[],
        visible: false,
        camera_distance: f32::INFINITY,
        camera_position: None,
        dt: 0.0,
    };
}

fn culling_input(
    chain: &BoneChain,
    input: &CharacterFrameInput,
    profile: &QualityTierProfile,
    anchor_available: bool,
    within_budget: bool,
    high_load: bool,
) -> CullingInput {
    CullingInput {
        tier_allows: profile.allows_simulation(),
        despawning: false,
        visible: input.visible,
        within_distance: input.camera_distance.is_finite()
            && input.camera_distance <= profile.visibility_distance_threshold,
        anchor_available,
        enabled: chain.enabled,
        within_budget,
        high_load,
    }
}

fn anchor_of(chain: &BoneChain, input: &CharacterFrameInput) -> Option<Transform> {
    input
        .world_pose
        .get(chain.anchor)
        .copied()
        .filter(Transform::is_valid)
}

/// Simulation state of one character instance
#[derive(Debug, Clone)]
pub struct SimulationContext {
    id: CharacterId,
    chains: Vec<BoneChain>,
    colliders: ColliderSet,
    frame: Frame,
    /// Output, sorted by skeleton index
    pose: Vec<BonePose>,
    /// Per chain, the pose slot of each bone
    pose_slots: Vec<Vec<usize>>,
    // Ranking scratch, reused every frame
    candidates: Vec<RankCandidate>,
    order: Vec<usize>,
    within: Vec<bool>,
    /// Admitted chains the world pushed past the global budget this frame
    shed: Vec<bool>,
}

impl SimulationContext {
    pub fn new(id: CharacterId, chains: Vec<BoneChain>, colliders: Vec<ColliderDesc>, config: &SimulationConfig) -> Self {
        let mut entries: Vec<(usize, usize, usize)> = chains
            .iter()
            .enumerate()
            .flat_map(|(c, chain)| {
                chain
                    .bones()
                    .iter()
                    .enumerate()
                    .map(move |(b, bone)| (bone.skeleton_index, c, b))
            })
            .collect();
        entries.sort_unstable();

        let mut pose_slots: Vec<Vec<usize>> = chains.iter().map(|c| vec![0; c.len()]).collect();
        let mut pose = Vec::with_capacity(entries.len());
        for (slot, &(bone, c, b)) in entries.iter().enumerate() {
            pose_slots[c][b] = slot;
            pose.push(BonePose {
                bone,
                local: Transform::IDENTITY,
            });
        }

        let chain_count = chains.len();
        let mut context = Self {
            id,
            chains,
            colliders: ColliderSet::new(colliders, config.max_colliders),
            frame: 0,
            pose,
            pose_slots,
            candidates: Vec::with_capacity(chain_count),
            order: Vec::with_capacity(chain_count),
            within: Vec::with_capacity(chain_count),
            shed: vec![false; chain_count],
        };
        context.write_pose();
        context
    }

    pub fn id(&self) -> CharacterId {
        self.id
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn chains(&self) -> &[BoneChain] {
        &self.chains
    }

    pub fn chain(&self, id: ChainId) -> Option<&BoneChain> {
        self.chains.iter().find(|c| c.id == id)
    }

    pub fn chain_by_name(&self, name: &str) -> Option<&BoneChain> {
        self.chains.iter().find(|c| c.name == name)
    }

    /// Local transforms for every chain bone, in skeleton index order
    pub fn pose(&self) -> &[BonePose] {
        &self.pose
    }

    pub fn count_in_state(&self, state: ChainState) -> usize {
        self.chains.iter().filter(|c| c.state == state).count()
    }

    /// Host toggle for one chain; takes effect on the next frame
    ///
    /// Returns false when no chain has this id.
    pub fn set_chain_enabled(&mut self, id: ChainId, enabled: bool) -> bool {
        match self.chains.iter_mut().find(|c| c.id == id) {
            Some(chain) => {
                chain.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Rank this frame's eligible chains; returns how many fit the budget
    pub fn plan(&mut self, input: &CharacterFrameInput, profile: &QualityTierProfile) -> usize {
        self.candidates.clear();
        for chain in &self.chains {
            let anchor = anchor_of(chain, input);
            let culling = culling_input(chain, input, profile, anchor.is_some(), true, false);
            let proximity = match (input.camera_position, anchor) {
                (Some(camera), Some(anchor)) => anchor.translation.distance(camera),
                _ => input.camera_distance,
            };
            self.candidates.push(RankCandidate {
                id: chain.id,
                priority: chain.priority,
                proximity,
                eligible: culling.eligible(),
            });
        }

        self.shed.iter_mut().for_each(|shed| *shed = false);
        select_within_budget(
            &self.candidates,
            profile.max_chains_per_character,
            &mut self.order,
            &mut self.within,
        )
    }

    /// Chains the last `plan` admitted, tagged for global ranking
    pub fn admitted(&self, slot: usize) -> impl Iterator<Item = GlobalCandidate> + '_ {
        self.candidates
            .iter()
            .zip(&self.within)
            .enumerate()
            .filter(|(_, (_, within))| **within)
            .map(move |(chain, (&rank, _))| GlobalCandidate {
                character: self.id,
                slot,
                chain,
                rank,
            })
    }

    /// Treat one admitted chain as under high load for the coming `advance`
    pub fn shed(&mut self, chain: usize) {
        if let Some(shed) = self.shed.get_mut(chain) {
            *shed = true;
        }
    }

    /// Run culling, integration and interpolation for one frame
    ///
    /// Must follow a `plan` call for the same frame. `high_load` applies to
    /// every chain; `shed` marks only some.
    pub fn advance(
        &mut self,
        input: &CharacterFrameInput,
        profile: &QualityTierProfile,
        config: &SimulationConfig,
        high_load: bool,
    ) -> FrameStats {
        self.frame += 1;
        let mut stats = FrameStats {
            characters: 1,
            ..FrameStats::default()
        };

        let collide = profile.collision_active() && !self.colliders.is_empty();
        if collide {
            self.colliders.resolve(input.world_pose, profile.max_colliders, |warning| {
                warning.log();
                stats.collider_warnings += 1;
            });
        } else {
            self.colliders.clear_resolved();
        }

        let blend = scheduler::display_blend(profile, config);

        for (index, chain) in self.chains.iter_mut().enumerate() {
            let anchor = anchor_of(chain, input);
            let within_budget = self.within.get(index).copied().unwrap_or(false);
            let shed = self.shed.get(index).copied().unwrap_or(false);
            let culling = culling_input(chain, input, profile, anchor.is_some(), within_budget, high_load || shed);

            let previous = chain.state;
            let next = previous.next(&culling);
            if next != previous {
                tracing::debug!(
                    character = self.id.0,
                    chain = %chain.name,
                    ?previous,
                    ?next,
                    cause = ?culling.freeze_cause(),
                    "Chain state change"
                );
                match (next, anchor) {
                    (ChainState::Static, _) => chain.reset_to_idle(),
                    (ChainState::Simulated, Some(anchor)) => chain.reseed_from_displayed(&anchor),
                    _ => {}
                }
                chain.state = next;
            }

            match chain.state {
                ChainState::Simulated => {
                    stats.simulated += 1;
                    let step = scheduler::integration_step(chain, self.frame, input.dt, profile, config)
                        .filter(|dt| *dt > 0.0);
                    if let (Some(anchor), Some(dt)) = (anchor, step) {
                        let colliders = if collide { self.colliders.world() } else { &[] };
                        let params = StepParams::new(config, dt, profile.max_bones_per_chain).with_colliders(colliders);
                        stats.numeric_warnings += step_chain(chain, &anchor, &params, |w: SimulationWarning| w.log());
                        chain.last_simulated_frame = Some(self.frame);
                        stats.integrations += 1;
                    }
                    chain.blend_displayed(blend);
                }
                ChainState::Frozen => stats.frozen += 1,
                ChainState::Static => stats.static_chains += 1,
            }
        }

        self.write_pose();
        stats
    }

    /// Drop every chain to its idle pose ahead of despawn
    pub fn despawn(&mut self) {
        let despawning = CullingInput {
            tier_allows: false,
            despawning: true,
            visible: false,
            within_distance: false,
            anchor_available: false,
            enabled: false,
            within_budget: false,
            high_load: false,
        };
        for chain in &mut self.chains {
            let next = chain.state.next(&despawning);
            if next != chain.state {
                chain.reset_to_idle();
                chain.state = next;
            }
        }
        self.write_pose();
    }

    fn write_pose(&mut self) {
        for (chain, slots) in self.chains.iter().zip(&self.pose_slots) {
            chain.write_pose(slots, &mut self.pose);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainBuilder;
    use crate::skeleton::sample::sample_outfit_rig;
    use crate::tier::Tier;

    fn sample_context(config: &SimulationConfig) -> (SimulationContext, Vec<Transform>) {
        let rig = sample_outfit_rig();
        let chains = ChainBuilder::new(config).discover(&rig.skeleton, 8).unwrap();
        let pose = rig.skeleton.rest_world_pose(&Transform::IDENTITY);
        (SimulationContext::new(CharacterId(1), chains, rig.colliders, config), pose)
    }

    fn visible(pose: &[Transform]) -> CharacterFrameInput<'_> {
        CharacterFrameInput {
            world_pose: pose,
            visible: true,
            camera_distance: 5.0,
            camera_position: None,
            dt: 1.0 / 60.0,
        }
    }

    fn frame(context: &mut SimulationContext, input: &CharacterFrameInput, profile: &QualityTierProfile) -> FrameStats {
        let config = SimulationConfig::default();
        context.plan(input, profile);
        context.advance(input, profile, &config, false)
    }

    #[test]
    fn test_pose_sorted_by_skeleton_index() {
        let config = SimulationConfig::default();
        let (context, _) = sample_context(&config);
        let bones: Vec<usize> = context.pose().iter().map(|p| p.bone).collect();

        assert_eq!(bones.len(), 5 + 3 * 4 + 4 * 3);
        assert!(bones.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_mid_tier_budget_caps_simulated_chains() {
        let config = SimulationConfig::default();
        let (mut context, pose) = sample_context(&config);
        let profile = QualityTierProfile::mid();

        let stats = frame(&mut context, &visible(&pose), &profile);
        assert_eq!(stats.simulated, 4);
        assert_eq!(stats.static_chains, 4);
        // Highest priorities first: cape, then the hair strands
        assert_eq!(context.chain_by_name("cape_0").unwrap().state, ChainState::Simulated);
        assert_eq!(context.chain_by_name("skirt_front_0").unwrap().state, ChainState::Static);
    }

    #[test]
    fn test_offscreen_freezes_then_resumes() {
        let config = SimulationConfig::default();
        let (mut context, pose) = sample_context(&config);
        let profile = QualityTierProfile::high();

        frame(&mut context, &visible(&pose), &profile);
        assert_eq!(context.count_in_state(ChainState::Simulated), 8);

        let hidden = CharacterFrameInput {
            visible: false,
            ..visible(&pose)
        };
        frame(&mut context, &hidden, &profile);
        assert_eq!(context.count_in_state(ChainState::Frozen), 8);

        frame(&mut context, &visible(&pose), &profile);
        assert_eq!(context.count_in_state(ChainState::Simulated), 8);
    }

    #[test]
    fn test_resume_continues_from_held_pose() {
        let config = SimulationConfig::default();
        let (mut context, pose) = sample_context(&config);
        let profile = QualityTierProfile::high();
        let shifted = |offset: Vec3, yaw: f32| -> Vec<Transform> {
            let root = Transform::new(offset, glam::Quat::from_rotation_y(yaw));
            pose.iter().map(|t| root.mul_transform(t)).collect()
        };

        // Swing the chains with a sharp step of the whole body
        frame(&mut context, &visible(&pose), &profile);
        let swung = shifted(Vec3::new(0.3, 0.0, 0.0), 0.0);
        for _ in 0..4 {
            frame(&mut context, &visible(&swung), &profile);
        }

        let hidden = CharacterFrameInput {
            visible: false,
            ..visible(&swung)
        };
        frame(&mut context, &hidden, &profile);
        let held: Vec<Vec<glam::Quat>> = context.chains().iter().map(|c| c.displayed_rotations().to_vec()).collect();

        // The body walks and turns while nothing is simulated
        let moved = shifted(Vec3::new(1.5, 0.0, -0.8), 0.6);
        let hidden_moved = CharacterFrameInput {
            visible: false,
            ..visible(&moved)
        };
        for _ in 0..10 {
            frame(&mut context, &hidden_moved, &profile);
        }
        assert_eq!(context.count_in_state(ChainState::Frozen), 8);

        frame(&mut context, &visible(&moved), &profile);
        assert_eq!(context.count_in_state(ChainState::Simulated), 8);

        let cape = context.chain_by_name("cape_0").unwrap();
        let idle = cape.idle_pose().rotations();
        assert!(
            cape.displayed_rotations().iter().zip(idle).any(|(d, i)| d.angle_between(*i) > 1e-3),
            "resumed from idle instead of the held swing"
        );
        for (chain, held) in context.chains().iter().zip(&held) {
            for (resumed, held) in chain.displayed_rotations().iter().zip(held) {
                assert!(
                    resumed.angle_between(*held) < 0.05,
                    "{} jumped {} rad on resume",
                    chain.name,
                    resumed.angle_between(*held)
                );
            }
        }
    }

    #[test]
    fn test_disabled_chain_leaves_simulation() {
        let config = SimulationConfig::default();
        let (mut context, pose) = sample_context(&config);
        let profile = QualityTierProfile::high();
        frame(&mut context, &visible(&pose), &profile);

        let cape = context.chain_by_name("cape_0").unwrap().id;
        assert!(context.set_chain_enabled(cape, false));
        frame(&mut context, &visible(&pose), &profile);

        assert_eq!(context.chain(cape).unwrap().state, ChainState::Frozen);
    }

    #[test]
    fn test_missing_input_anchor_freezes() {
        let config = SimulationConfig::default();
        let (mut context, pose) = sample_context(&config);
        let profile = QualityTierProfile::for_tier(Tier::High);
        frame(&mut context, &visible(&pose), &profile);

        let truncated = CharacterFrameInput {
            world_pose: &pose[..1],
            ..visible(&pose)
        };
        let stats = frame(&mut context, &truncated, &profile);
        // Only the hips survive: skirt panels hang off them, the rest freeze
        assert_eq!(stats.frozen, 4);
        assert_eq!(stats.simulated, 4);
        // Colliders on head, spine and thighs are missing too
        assert_eq!(stats.collider_warnings, 4);

        // Still missing, already reported
        let stats = frame(&mut context, &truncated, &profile);
        assert_eq!(stats.collider_warnings, 0);
        assert_eq!(stats.frozen, 4);
    }

    #[test]
    fn test_despawn_restores_idle_pose() {
        let config = SimulationConfig::default();
        let (mut context, pose) = sample_context(&config);
        let profile = QualityTierProfile::high();
        let moved: Vec<Transform> = pose
            .iter()
            .map(|t| Transform::new(t.translation + Vec3::new(0.3, 0.0, 0.0), t.rotation))
            .collect();

        frame(&mut context, &visible(&pose), &profile);
        for _ in 0..5 {
            frame(&mut context, &visible(&moved), &profile);
        }
        context.despawn();

        assert_eq!(context.count_in_state(ChainState::Static), 8);
        for chain in context.chains() {
            assert_eq!(chain.displayed_rotations(), chain.idle_pose().rotations());
        }
    }
}
