//! Per-frame counters reported by the world

use serde::Serialize;

use crate::core::types::Frame;
use crate::tier::Tier;

/// What one frame did, summed over all characters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrameStats {
    pub frame: Frame,
    pub tier: Tier,
    pub characters: usize,
    pub simulated: usize,
    pub frozen: usize,
    pub static_chains: usize,
    /// Chains that ran the solver this frame (the rest reused their last result)
    pub integrations: usize,
    /// Chains ranked into their character's budget, before load shedding
    pub demand: usize,
    pub high_load: bool,
    /// Admitted chains held back because demand exceeded the global budget
    pub shed: usize,
    pub numeric_warnings: usize,
    /// Colliders whose bone went missing this frame
    pub collider_warnings: usize,
}

impl FrameStats {
    /// Sum the per-character counters of two partial results
    pub fn merge(self, other: FrameStats) -> FrameStats {
        FrameStats {
            frame: self.frame.max(other.frame),
            tier: self.tier.max(other.tier),
            characters: self.characters + other.characters,
            simulated: self.simulated + other.simulated,
            frozen: self.frozen + other.frozen,
            static_chains: self.static_chains + other.static_chains,
            integrations: self.integrations + other.integrations,
            demand: self.demand + other.demand,
            high_load: self.high_load || other.high_load,
            shed: self.shed + other.shed,
            numeric_warnings: self.numeric_warnings + other.numeric_warnings,
            collider_warnings: self.collider_warnings + other.collider_warnings,
        }
    }

    pub fn total_chains(&self) -> usize {
        self.simulated + self.frozen + self.static_chains
    }
}
