//! Frame cost per tier for a crowd of sample characters.
//!
//! Run with: cargo bench --bench simulation_bench

use ahash::AHashMap;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tiered_dynbone::core::{SimulationConfig, Transform};
use tiered_dynbone::simulation::{CharacterFrameInput, SimulationWorld};
use tiered_dynbone::skeleton::sample::{sample_outfit_rig, sway_root};
use tiered_dynbone::tier::{Tier, TierTable};

const FRAME_DT: f32 = 1.0 / 60.0;
const FRAMES: usize = 120;

/// Precompute the animated poses so the benchmark measures only simulation
fn poses(frames: usize) -> Vec<Vec<Transform>> {
    let rig = sample_outfit_rig();
    (0..frames)
        .map(|f| rig.skeleton.rest_world_pose(&sway_root(f as f32 * FRAME_DT)))
        .collect()
}

fn bench_tiers(c: &mut Criterion) {
    let rig = sample_outfit_rig();
    let poses = poses(FRAMES);
    let mut group = c.benchmark_group("step_frame");

    for characters in [1usize, 16, 64] {
        for tier in [Tier::High, Tier::Mid, Tier::Low] {
            group.bench_with_input(
                BenchmarkId::new(format!("{tier:?}"), characters),
                &characters,
                |b, &characters| {
                    let mut world =
                        SimulationWorld::new(SimulationConfig::default(), TierTable::default(), tier).unwrap();
                    let ids: Vec<_> = (0..characters).map(|_| world.spawn(&rig).unwrap()).collect();
                    let mut frame = 0usize;

                    b.iter(|| {
                        let pose = &poses[frame % FRAMES];
                        let inputs: AHashMap<_, _> = ids
                            .iter()
                            .map(|&id| {
                                let input = CharacterFrameInput {
                                    world_pose: pose,
                                    visible: true,
                                    camera_distance: 6.0,
                                    camera_position: None,
                                    dt: FRAME_DT,
                                };
                                (id, input)
                            })
                            .collect();
                        frame += 1;
                        black_box(world.step_frame(&inputs))
                    });
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_tiers);
criterion_main!(benches);
