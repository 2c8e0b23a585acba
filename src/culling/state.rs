//! Chain lifecycle state machine
//!
//! States and what the renderer sees:
//! - `Static`: the authored idle pose
//! - `Simulated`: the spring solver's output
//! - `Frozen`: the last simulated pose, held
//!
//! `Static` is left only for `Simulated`. A chain never goes `Static ->
//! Frozen`: there is no simulated pose to hold yet.

use serde::{Deserialize, Serialize};

/// Lifecycle state of one chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainState {
    Static,
    Simulated,
    Frozen,
}

impl Default for ChainState {
    fn default() -> Self {
        Self::Static
    }
}

/// Why a chain is not admitted to simulation this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreezeCause {
    OffScreen,
    TooFar,
    /// The chain's anchor was missing or invalid in the frame pose
    AnchorUnavailable,
    /// Disabled by a host toggle
    Disabled,
    OverBudget,
    HighLoad,
}

/// Signals evaluated once per frame per chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CullingInput {
    /// Active tier allows simulated chains (never true for Low)
    pub tier_allows: bool,
    pub despawning: bool,
    pub visible: bool,
    pub within_distance: bool,
    pub anchor_available: bool,
    pub enabled: bool,
    /// Chain's rank fits the tier's per-character budget
    pub within_budget: bool,
    pub high_load: bool,
}

impl CullingInput {
    /// Chain qualifies for ranking: everything but budget and load holds
    pub fn eligible(&self) -> bool {
        self.tier_allows && !self.despawning && self.visible && self.within_distance && self.anchor_available && self.enabled
    }

    /// First reason, in priority order, keeping the chain out of simulation
    pub fn freeze_cause(&self) -> Option<FreezeCause> {
        if !self.visible {
            Some(FreezeCause::OffScreen)
        } else if !self.within_distance {
            Some(FreezeCause::TooFar)
        } else if !self.anchor_available {
            Some(FreezeCause::AnchorUnavailable)
        } else if !self.enabled {
            Some(FreezeCause::Disabled)
        } else if !self.within_budget {
            Some(FreezeCause::OverBudget)
        } else if self.high_load {
            Some(FreezeCause::HighLoad)
        } else {
            None
        }
    }
}

impl ChainState {
    /// Next state for this frame
    pub fn next(self, input: &CullingInput) -> ChainState {
        if input.despawning || !input.tier_allows {
            return ChainState::Static;
        }

        let admitted = input.freeze_cause().is_none();
        match (self, admitted) {
            (_, true) => ChainState::Simulated,
            (ChainState::Static, false) => ChainState::Static,
            (ChainState::Simulated | ChainState::Frozen, false) => ChainState::Frozen,
        }
    }
}
