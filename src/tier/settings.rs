//! Process-wide tier selection with frame-boundary hand-off
//!
//! The settings UI (or a thermal monitor) may request a tier at any time
//! from any thread. The request is parked and only applied when the world
//! begins its next frame, so a step never sees the tier change under it.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::tier::profile::{QualityTierProfile, Tier, TierTable};

const NO_REQUEST: u8 = 0;

fn encode(tier: Tier) -> u8 {
    match tier {
        Tier::Low => 1,
        Tier::Mid => 2,
        Tier::High => 3,
    }
}

fn decode(value: u8) -> Option<Tier> {
    match value {
        1 => Some(Tier::Low),
        2 => Some(Tier::Mid),
        3 => Some(Tier::High),
        _ => None,
    }
}

/// Cloneable handle for requesting a tier change from outside the frame loop
#[derive(Debug, Clone)]
pub struct TierChangeHandle {
    pending: Arc<AtomicU8>,
}

impl TierChangeHandle {
    /// Park a tier request; the latest request before the frame boundary wins
    pub fn request(&self, tier: Tier) {
        self.pending.store(encode(tier), Ordering::Release);
    }
}

/// Active tier plus the table of profiles
#[derive(Debug)]
pub struct TierSettings {
    table: TierTable,
    active: Tier,
    pending: Arc<AtomicU8>,
}

impl TierSettings {
    pub fn new(table: TierTable, initial: Tier) -> Self {
        Self {
            table,
            active: initial,
            pending: Arc::new(AtomicU8::new(NO_REQUEST)),
        }
    }

    pub fn table(&self) -> &TierTable {
        &self.table
    }

    pub fn active_tier(&self) -> Tier {
        self.active
    }

    /// Immutable snapshot of the active profile for this frame
    pub fn snapshot(&self) -> QualityTierProfile {
        *self.table.profile(self.active)
    }

    pub fn handle(&self) -> TierChangeHandle {
        TierChangeHandle {
            pending: Arc::clone(&self.pending),
        }
    }

    pub fn request(&self, tier: Tier) {
        self.handle().request(tier);
    }

    /// Apply the parked request, if any. Returns `(old, new)` when the tier changed.
    ///
    /// Call only at a frame boundary.
    pub fn apply_pending(&mut self) -> Option<(Tier, Tier)> {
        let requested = decode(self.pending.swap(NO_REQUEST, Ordering::AcqRel))?;
        if requested == self.active {
            return None;
        }

        let previous = self.active;
        self.active = requested;
        tracing::info!(?previous, current = ?requested, "Quality tier changed");
        Some((previous, requested))
    }
}
