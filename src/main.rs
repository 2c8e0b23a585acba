//! Tiered Dynamic Bones - headless crowd driver
//!
//! Spawns sample outfit characters, walks them around a camera and steps
//! the simulation for a fixed number of frames. Prints per-run stats as
//! JSON (default) or text. Useful for checking tier budgets on a target
//! device without the engine attached.

use std::path::PathBuf;

use ahash::AHashMap;
use clap::Parser;
use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use tiered_dynbone::core::error::Result;
use tiered_dynbone::core::{SimulationConfig, Transform};
use tiered_dynbone::simulation::{CharacterFrameInput, FrameStats, SimulationWorld};
use tiered_dynbone::skeleton::sample::{sample_outfit_rig, sway_root};
use tiered_dynbone::tier::{DeviceCapabilities, Tier, TierTable};

/// Headless spring-bone crowd simulation
#[derive(Parser, Debug)]
#[command(name = "tiered-dynbone")]
#[command(about = "Step sample characters through the tiered spring-bone simulation")]
struct Args {
    /// Number of characters to spawn
    #[arg(long, default_value_t = 12)]
    characters: usize,

    /// Frames to simulate
    #[arg(long, default_value_t = 600)]
    frames: u64,

    /// Quality tier: high, mid or low (classified from device flags when omitted)
    #[arg(long)]
    tier: Option<Tier>,

    /// CPU cores used for classification when --tier is omitted
    #[arg(long, default_value_t = 8)]
    cpu_cores: u32,

    /// Memory in MB used for classification when --tier is omitted
    #[arg(long, default_value_t = 8192)]
    memory_mb: u32,

    /// Normalized GPU score used for classification when --tier is omitted
    #[arg(long, default_value_t = 0.8)]
    gpu_score: f32,

    /// Request one tier lower at this frame (simulates thermal throttling)
    #[arg(long)]
    downgrade_at: Option<u64>,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Simulation config TOML
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tier table TOML
    #[arg(long)]
    tiers: Option<PathBuf>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,
}

/// JSON output structure
#[derive(Serialize)]
struct RunSummary {
    seed: u64,
    frames: u64,
    characters: usize,
    initial_tier: Tier,
    final_tier: Tier,
    peak_simulated: usize,
    mean_simulated: f32,
    mean_integrations: f32,
    high_load_frames: u64,
    numeric_warnings: usize,
    collider_warnings: usize,
    last_frame: FrameStats,
}

/// Per-character walk state
struct Walker {
    position: Vec3,
    heading: f32,
    phase: f32,
    visible: bool,
}

const FRAME_DT: f32 = 1.0 / 30.0;
const WALK_SPEED: f32 = 1.2;
const ARENA_RADIUS: f32 = 40.0;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tiered_dynbone=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    let table = match &args.tiers {
        Some(path) => TierTable::load(path)?,
        None => TierTable::default(),
    };

    let initial_tier = args.tier.unwrap_or_else(|| {
        DeviceCapabilities {
            cpu_cores: args.cpu_cores,
            memory_mb: args.memory_mb,
            gpu_score: args.gpu_score,
            thermal_throttled: false,
        }
        .classify()
    });
    tracing::info!(seed, tier = ?initial_tier, characters = args.characters, "Starting run");

    let mut world = SimulationWorld::new(config, table, initial_tier)?;
    tracing::debug!(profile = ?world.active_profile(), "Active tier profile");
    let rig = sample_outfit_rig();
    let mut ids = Vec::with_capacity(args.characters);
    let mut walkers = Vec::with_capacity(args.characters);
    for _ in 0..args.characters {
        ids.push(world.spawn(&rig)?);
        walkers.push(Walker {
            position: Vec3::new(
                rng.gen_range(-ARENA_RADIUS..ARENA_RADIUS),
                0.0,
                rng.gen_range(-ARENA_RADIUS..ARENA_RADIUS),
            ),
            heading: rng.gen_range(0.0..std::f32::consts::TAU),
            phase: rng.gen_range(0.0..10.0),
            visible: true,
        });
    }

    let camera = Vec3::new(0.0, 1.6, 0.0);
    let mut poses: Vec<Vec<Transform>> = vec![Vec::new(); args.characters];
    let mut summary = RunSummary {
        seed,
        frames: args.frames,
        characters: args.characters,
        initial_tier,
        final_tier: initial_tier,
        peak_simulated: 0,
        mean_simulated: 0.0,
        mean_integrations: 0.0,
        high_load_frames: 0,
        numeric_warnings: 0,
        collider_warnings: 0,
        last_frame: FrameStats::default(),
    };
    let mut simulated_total = 0usize;
    let mut integrations_total = 0usize;

    for frame in 0..args.frames {
        if args.downgrade_at == Some(frame) {
            world.request_tier(world.active_tier().downgraded());
        }

        let time = frame as f32 * FRAME_DT;
        for (walker, pose) in walkers.iter_mut().zip(poses.iter_mut()) {
            advance_walker(walker, &mut rng);
            let sway = sway_root(time + walker.phase);
            let root = Transform::new(
                walker.position + sway.translation,
                Quat::from_rotation_y(walker.heading) * sway.rotation,
            );
            *pose = rig.skeleton.rest_world_pose(&root);
        }

        let inputs: AHashMap<_, _> = ids
            .iter()
            .zip(walkers.iter().zip(&poses))
            .map(|(&id, (walker, pose))| {
                let input = CharacterFrameInput {
                    world_pose: pose,
                    visible: walker.visible,
                    camera_distance: walker.position.distance(camera),
                    camera_position: Some(camera),
                    dt: FRAME_DT,
                };
                (id, input)
            })
            .collect();

        let stats = world.step_frame(&inputs);
        simulated_total += stats.simulated;
        integrations_total += stats.integrations;
        summary.peak_simulated = summary.peak_simulated.max(stats.simulated);
        summary.high_load_frames += u64::from(stats.high_load);
        summary.numeric_warnings += stats.numeric_warnings;
        summary.collider_warnings += stats.collider_warnings;
        summary.last_frame = stats;

        if frame % 60 == 0 {
            tracing::debug!(
                frame = stats.frame,
                simulated = stats.simulated,
                frozen = stats.frozen,
                idle = stats.static_chains,
                "Frame"
            );
        }
    }

    if args.frames > 0 {
        summary.mean_simulated = simulated_total as f32 / args.frames as f32;
        summary.mean_integrations = integrations_total as f32 / args.frames as f32;
    }
    summary.final_tier = world.active_tier();

    for id in ids {
        world.despawn(id);
    }

    match args.format.as_str() {
        "text" => print_text(&summary),
        _ => match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to serialize summary: {}", e),
        },
    }

    Ok(())
}

/// Wander inside the arena, occasionally stepping behind the camera
fn advance_walker(walker: &mut Walker, rng: &mut ChaCha8Rng) {
    walker.heading += rng.gen_range(-0.1..0.1);
    let forward = Vec3::new(walker.heading.sin(), 0.0, walker.heading.cos());
    walker.position += forward * WALK_SPEED * FRAME_DT;

    if walker.position.length() > ARENA_RADIUS {
        walker.heading += std::f32::consts::PI;
        walker.position = walker.position.clamp_length_max(ARENA_RADIUS);
    }

    if rng.gen_bool(0.01) {
        walker.visible = !walker.visible;
    }
}

fn print_text(summary: &RunSummary) {
    println!("Dynamic Bone Run");
    println!("================");
    println!("Seed:             {}", summary.seed);
    println!("Characters:       {}", summary.characters);
    println!("Frames:           {}", summary.frames);
    println!("Tier:             {:?} -> {:?}", summary.initial_tier, summary.final_tier);
    println!("Peak simulated:   {}", summary.peak_simulated);
    println!("Mean simulated:   {:.1}", summary.mean_simulated);
    println!("Mean integrations:{:.1}", summary.mean_integrations);
    println!("High-load frames: {}", summary.high_load_frames);
    println!("Numeric warnings: {}", summary.numeric_warnings);
    println!("Collider warnings:{}", summary.collider_warnings);
}
