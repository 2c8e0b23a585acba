//! Update-rate throttling with per-chain phase staggering

use crate::core::types::Frame;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Stable 64-bit seed for a chain name (FNV-1a)
///
/// Must not depend on process state: the same name staggers the same way
/// on every run and every device.
pub fn phase_seed(name: &str) -> u64 {
    name.bytes()
        .fold(FNV_OFFSET, |hash, byte| (hash ^ byte as u64).wrapping_mul(FNV_PRIME))
}

/// Phase of a chain within an update interval of `interval` frames
pub fn phase_offset(seed: u64, interval: u32) -> u32 {
    if interval <= 1 {
        0
    } else {
        (seed % interval as u64) as u32
    }
}

/// Whether a chain with `phase` integrates on `frame`
pub fn should_integrate(frame: Frame, interval: u32, phase: u32) -> bool {
    interval <= 1 || (frame + phase as u64) % interval as u64 == 0
}

/// Time covered by an integration spanning `frames` frames, clamped to `max_step`
pub fn integration_dt(frames: u64, frame_dt: f32, max_step: f32) -> f32 {
    (frames as f32 * frame_dt).min(max_step)
}
