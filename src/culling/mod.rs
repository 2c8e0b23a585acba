//! Culling and fallback - per-chain lifecycle between simulated and static poses

pub mod ranking;
pub mod state;

pub use ranking::{over_global_budget, select_within_budget, GlobalCandidate, RankCandidate};
pub use state::{ChainState, CullingInput, FreezeCause};
