//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Identifier of a chain within one character's rig
///
/// Assigned in build order, so it doubles as the final tie-break when ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChainId(pub u32);

/// Identifier of a spawned character instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CharacterId(pub u64);

/// Frame counter (simulation time unit)
pub type Frame = u64;
