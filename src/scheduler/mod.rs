//! Scheduler - decides which simulated chains integrate this frame
//!
//! Throttled tiers integrate each chain every Nth frame. Chains are
//! staggered by a phase derived from their name so the per-frame cost stays
//! flat, and the displayed pose eases toward each new result in between.

pub mod interpolation;
pub mod throttle;

use crate::chain::BoneChain;
use crate::core::config::SimulationConfig;
use crate::core::types::Frame;
use crate::tier::QualityTierProfile;

/// Step duration if `chain` integrates on `frame`, `None` if it reuses its last result
pub fn integration_step(
    chain: &BoneChain,
    frame: Frame,
    frame_dt: f32,
    profile: &QualityTierProfile,
    config: &SimulationConfig,
) -> Option<f32> {
    let interval = profile.update_interval_frames.max(1);
    let phase = throttle::phase_offset(chain.phase_seed, interval);
    if !throttle::should_integrate(frame, interval, phase) {
        return None;
    }

    let frames = match chain.last_simulated_frame {
        Some(last) => frame.saturating_sub(last).clamp(1, interval as u64),
        None => 1,
    };
    Some(throttle::integration_dt(frames, frame_dt, config.max_step_seconds))
}

/// Blend factor applied to displayed rotations each frame
pub fn display_blend(profile: &QualityTierProfile, config: &SimulationConfig) -> f32 {
    if profile.update_interval_frames <= 1 {
        1.0
    } else {
        config.interpolation_blend
    }
}
