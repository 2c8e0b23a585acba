//! Integration tests for chain lifecycle across tiers and load
//!
//! These tests drive a `SimulationWorld` frame by frame:
//! - Tier downgrades land exactly on the idle pose
//! - The per-character budget admits chains by priority
//! - Frozen chains hold their pose; leaving simulation restores idle
//! - Low tier never simulates

use ahash::AHashMap;
use glam::{Quat, Vec3};
use tiered_dynbone::core::{CharacterId, SimulationConfig, Transform};
use tiered_dynbone::culling::ChainState;
use tiered_dynbone::simulation::{CharacterFrameInput, SimulationWorld};
use tiered_dynbone::skeleton::sample::{sample_outfit_rig, sway_root};
use tiered_dynbone::skeleton::{CharacterRig, DynamicTag, SkeletonDesc};
use tiered_dynbone::tier::{Tier, TierTable};

const DT: f32 = 1.0 / 30.0;

fn input(pose: &[Transform], visible: bool) -> CharacterFrameInput<'_> {
    CharacterFrameInput {
        world_pose: pose,
        visible,
        camera_distance: 5.0,
        camera_position: None,
        dt: DT,
    }
}

/// Step `frames` frames of the sway loop starting at `start`
fn run(world: &mut SimulationWorld, id: CharacterId, rig: &CharacterRig, start: u32, frames: u32) {
    for f in start..start + frames {
        let pose = rig.skeleton.rest_world_pose(&sway_root(f as f32 * DT));
        let mut inputs = AHashMap::new();
        inputs.insert(id, input(&pose, true));
        world.step_frame(&inputs);
    }
}

fn assert_idle(world: &SimulationWorld, id: CharacterId) {
    let context = world.context(id).unwrap();
    for chain in context.chains() {
        assert_eq!(chain.state, ChainState::Static, "chain {}", chain.name);
        assert_eq!(chain.displayed_rotations(), chain.idle_pose().rotations());
    }
    for pose in context.pose() {
        let chain = context
            .chains()
            .iter()
            .find(|c| c.bones().iter().any(|b| b.skeleton_index == pose.bone))
            .unwrap();
        let slot = chain.bones().iter().position(|b| b.skeleton_index == pose.bone).unwrap();
        assert_eq!(pose.local.rotation, chain.idle_pose().rotations()[slot]);
    }
}

// ============================================================================
// Tier Changes
// ============================================================================

#[test]
fn test_downgrade_to_low_renders_idle_pose() {
    let rig = sample_outfit_rig();
    let mut world = SimulationWorld::new(SimulationConfig::default(), TierTable::default(), Tier::High).unwrap();
    let id = world.spawn(&rig).unwrap();

    run(&mut world, id, &rig, 0, 45);
    let moved = world
        .context(id)
        .unwrap()
        .chains()
        .iter()
        .any(|c| c.displayed_rotations() != c.idle_pose().rotations());
    assert!(moved, "swaying should deflect at least one chain");

    world.request_tier(Tier::Low);
    run(&mut world, id, &rig, 45, 1);

    assert_eq!(world.active_tier(), Tier::Low);
    assert_idle(&world, id);
}

#[test]
fn test_low_tier_never_simulates() {
    let rig = sample_outfit_rig();
    let mut world = SimulationWorld::new(SimulationConfig::default(), TierTable::default(), Tier::Low).unwrap();
    let id = world.spawn(&rig).unwrap();

    for f in 0..30 {
        let pose = rig.skeleton.rest_world_pose(&sway_root(f as f32 * DT));
        let mut inputs = AHashMap::new();
        inputs.insert(id, input(&pose, true));
        let stats = world.step_frame(&inputs);
        assert_eq!(stats.simulated, 0);
        assert_eq!(stats.integrations, 0);
    }
    assert_idle(&world, id);
}

#[test]
fn test_mid_tier_throttles_integration() {
    let rig = sample_outfit_rig();
    let mut world = SimulationWorld::new(SimulationConfig::default(), TierTable::default(), Tier::Mid).unwrap();
    let id = world.spawn(&rig).unwrap();
    let pose = rig.skeleton.rest_world_pose(&Transform::IDENTITY);

    let mut integrations = 0;
    let frames = 40;
    for _ in 0..frames {
        let mut inputs = AHashMap::new();
        inputs.insert(id, input(&pose, true));
        let stats = world.step_frame(&inputs);
        assert_eq!(stats.simulated, 4);
        integrations += stats.integrations;
    }
    // Four chains at every other frame
    assert!(integrations <= 4 * frames / 2, "got {integrations}");
    assert!(integrations >= 4 * (frames / 2 - 1));
}

// ============================================================================
// Budget Ranking
// ============================================================================

/// Five single-bone chains with priorities 5, 4, 3, 2, 1
fn weighted_rig() -> CharacterRig {
    let mut skeleton = SkeletonDesc::new();
    let root = skeleton.push("root", None, Transform::from_translation(Vec3::Y), None);
    for (i, priority) in [5.0, 4.0, 3.0, 2.0, 1.0].into_iter().enumerate() {
        let tag = DynamicTag {
            priority,
            ..DynamicTag::default()
        };
        skeleton.push(
            format!("strand{i}"),
            Some(root),
            Transform::from_translation(Vec3::new(i as f32 * 0.1 - 0.2, -0.1, 0.0)),
            Some(tag),
        );
    }
    CharacterRig {
        skeleton,
        ..CharacterRig::default()
    }
}

#[test]
fn test_budget_admits_highest_priorities() {
    let rig = weighted_rig();
    let mut table = TierTable::default();
    table.high.max_chains_per_character = 2;
    let mut world = SimulationWorld::new(SimulationConfig::default(), table, Tier::High).unwrap();
    let id = world.spawn(&rig).unwrap();
    let pose = rig.skeleton.rest_world_pose(&Transform::IDENTITY);

    for _ in 0..3 {
        let mut inputs = AHashMap::new();
        inputs.insert(id, input(&pose, true));
        let stats = world.step_frame(&inputs);
        assert_eq!(stats.simulated, 2);
        assert_eq!(stats.demand, 2);
    }

    let context = world.context(id).unwrap();
    let states: Vec<_> = ["strand0", "strand1", "strand2", "strand3", "strand4"]
        .iter()
        .map(|name| context.chain_by_name(name).unwrap().state)
        .collect();
    assert_eq!(
        states,
        vec![
            ChainState::Simulated,
            ChainState::Simulated,
            ChainState::Static,
            ChainState::Static,
            ChainState::Static,
        ]
    );
}

#[test]
fn test_disabling_a_chain_promotes_the_next() {
    let rig = weighted_rig();
    let mut table = TierTable::default();
    table.high.max_chains_per_character = 2;
    let mut world = SimulationWorld::new(SimulationConfig::default(), table, Tier::High).unwrap();
    let id = world.spawn(&rig).unwrap();
    let pose = rig.skeleton.rest_world_pose(&Transform::IDENTITY);
    let step = |world: &mut SimulationWorld| {
        let mut inputs = AHashMap::new();
        inputs.insert(id, input(&pose, true));
        world.step_frame(&inputs)
    };

    step(&mut world);
    let top = world.context(id).unwrap().chain_by_name("strand0").unwrap().id;
    assert!(world.context_mut(id).unwrap().set_chain_enabled(top, false));
    step(&mut world);

    let context = world.context(id).unwrap();
    assert_eq!(context.chain_by_name("strand0").unwrap().state, ChainState::Frozen);
    assert_eq!(context.chain_by_name("strand1").unwrap().state, ChainState::Simulated);
    assert_eq!(context.chain_by_name("strand2").unwrap().state, ChainState::Simulated);
}

// ============================================================================
// Freeze and Idle Round Trip
// ============================================================================

#[test]
fn test_frozen_chain_holds_its_pose() {
    let rig = sample_outfit_rig();
    let mut world = SimulationWorld::new(SimulationConfig::default(), TierTable::default(), Tier::High).unwrap();
    let id = world.spawn(&rig).unwrap();
    run(&mut world, id, &rig, 0, 20);

    let held: Vec<Vec<Quat>> = world
        .context(id)
        .unwrap()
        .chains()
        .iter()
        .map(|c| c.displayed_rotations().to_vec())
        .collect();

    for f in 20..30 {
        let pose = rig.skeleton.rest_world_pose(&sway_root(f as f32 * DT));
        let mut inputs = AHashMap::new();
        inputs.insert(id, input(&pose, false));
        let stats = world.step_frame(&inputs);
        assert_eq!(stats.frozen, 8);
    }

    let context = world.context(id).unwrap();
    for (chain, before) in context.chains().iter().zip(&held) {
        assert_eq!(chain.displayed_rotations(), before.as_slice());
    }
}

#[test]
fn test_idle_round_trip_through_low() {
    let rig = sample_outfit_rig();
    let mut world = SimulationWorld::new(SimulationConfig::default(), TierTable::default(), Tier::High).unwrap();
    let id = world.spawn(&rig).unwrap();

    run(&mut world, id, &rig, 0, 30);
    world.request_tier(Tier::Low);
    run(&mut world, id, &rig, 30, 2);
    assert_idle(&world, id);

    world.request_tier(Tier::High);
    run(&mut world, id, &rig, 32, 1);
    let context = world.context(id).unwrap();
    assert_eq!(context.count_in_state(ChainState::Simulated), 8);
    for chain in context.chains() {
        assert!(chain.displayed_rotations().iter().all(|q| q.is_finite()));
    }
}

#[test]
fn test_despawn_returns_false_for_unknown_character() {
    let mut world = SimulationWorld::new(SimulationConfig::default(), TierTable::default(), Tier::Mid).unwrap();
    assert!(!world.despawn(CharacterId(99)));

    let id = world.spawn(&sample_outfit_rig()).unwrap();
    assert!(world.despawn(id));
    assert!(world.context(id).is_none());
    assert_eq!(world.character_count(), 0);
}
