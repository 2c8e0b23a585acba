//! Ranking eligible chains against the per-character and global budgets

use std::cmp::Reverse;

use ordered_float::OrderedFloat;

use crate::core::types::{ChainId, CharacterId};

/// One chain as seen by the ranking pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankCandidate {
    pub id: ChainId,
    pub priority: f32,
    /// Distance from the chain anchor to the camera
    pub proximity: f32,
    pub eligible: bool,
}

fn sort_key(candidate: &RankCandidate) -> (Reverse<OrderedFloat<f32>>, OrderedFloat<f32>, ChainId) {
    let priority = if candidate.priority.is_finite() {
        candidate.priority
    } else {
        f32::MIN
    };
    let proximity = if candidate.proximity.is_finite() {
        candidate.proximity
    } else {
        f32::MAX
    };
    (Reverse(OrderedFloat(priority)), OrderedFloat(proximity), candidate.id)
}

/// A chain already admitted by its character, competing for the global budget
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalCandidate {
    pub character: CharacterId,
    /// Position of the character's context in the world
    pub slot: usize,
    /// Position of the chain within its character
    pub chain: usize,
    pub rank: RankCandidate,
}

/// Sort admitted chains process-wide and return the ones past `budget`
///
/// Same order as the per-character ranking, with the character id breaking
/// ties between characters before the chain id does.
pub fn over_global_budget(candidates: &mut [GlobalCandidate], budget: usize) -> &[GlobalCandidate] {
    candidates.sort_unstable_by_key(|c| {
        let (priority, proximity, chain) = sort_key(&c.rank);
        (priority, proximity, c.character, chain)
    });
    let kept = candidates.len().min(budget);
    &candidates[kept..]
}

/// Mark the top `budget` eligible candidates in `within`
///
/// Order: priority weight (highest first), then proximity to the camera,
/// then chain id. `order` is scratch space reused across frames. Returns
/// how many candidates were admitted.
pub fn select_within_budget(
    candidates: &[RankCandidate],
    budget: usize,
    order: &mut Vec<usize>,
    within: &mut Vec<bool>,
) -> usize {
    within.clear();
    within.resize(candidates.len(), false);

    order.clear();
    order.extend((0..candidates.len()).filter(|&i| candidates[i].eligible));
    order.sort_unstable_by_key(|&i| sort_key(&candidates[i]));

    let admitted = order.len().min(budget);
    for &index in &order[..admitted] {
        within[index] = true;
    }
    admitted
}
