//! Simulation world - owns every spawned character and steps frames
//!
//! Characters are kept in a dense Vec with an id -> index registry so a
//! frame can hand them to rayon as a slice. Despawn swap-removes, which
//! takes `&mut self` and therefore cannot overlap a running frame.

use ahash::AHashMap;
use rayon::prelude::*;

use crate::chain::ChainBuilder;
use crate::core::config::SimulationConfig;
use crate::core::error::Result;
use crate::core::types::{CharacterId, Frame};
use crate::culling::{over_global_budget, GlobalCandidate};
use crate::skeleton::CharacterRig;
use crate::tier::{QualityTierProfile, Tier, TierChangeHandle, TierSettings, TierTable};

use super::context::{CharacterFrameInput, SimulationContext};
use super::stats::FrameStats;

/// All simulated characters plus the process-wide quality tier
#[derive(Debug)]
pub struct SimulationWorld {
    config: SimulationConfig,
    tiers: TierSettings,
    contexts: Vec<SimulationContext>,
    registry: AHashMap<CharacterId, usize>,
    next_id: u64,
    frame: Frame,
    /// Load signal raised by the host (frame-time monitor, thermal state)
    declared_high_load: bool,
    /// Global ranking scratch, reused every frame
    global_candidates: Vec<GlobalCandidate>,
}

impl SimulationWorld {
    pub fn new(config: SimulationConfig, table: TierTable, initial: Tier) -> Result<Self> {
        config.validate()?;
        table.validate()?;

        tracing::info!(tier = ?initial, "Simulation world created");
        Ok(Self {
            config,
            tiers: TierSettings::new(table, initial),
            contexts: Vec::new(),
            registry: AHashMap::new(),
            next_id: 1,
            frame: 0,
            declared_high_load: false,
            global_candidates: Vec::new(),
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn character_count(&self) -> usize {
        self.contexts.len()
    }

    pub fn active_tier(&self) -> Tier {
        self.tiers.active_tier()
    }

    pub fn active_profile(&self) -> QualityTierProfile {
        self.tiers.snapshot()
    }

    /// Request a tier; applied at the start of the next frame
    pub fn request_tier(&self, tier: Tier) {
        self.tiers.request(tier);
    }

    /// Handle for requesting tiers from other threads
    pub fn tier_handle(&self) -> TierChangeHandle {
        self.tiers.handle()
    }

    /// Host-declared load; while set, every chain freezes or stays static
    pub fn declare_high_load(&mut self, high_load: bool) {
        if high_load != self.declared_high_load {
            tracing::info!(high_load, "Host load signal changed");
        }
        self.declared_high_load = high_load;
    }

    /// Build a character's chains and register it
    ///
    /// Chains are sized against the largest bone budget any tier allows;
    /// lower tiers hold the extra bones rigid instead of rebuilding.
    pub fn spawn(&mut self, rig: &CharacterRig) -> Result<CharacterId> {
        let builder = ChainBuilder::new(&self.config);
        let budget = self.tiers.table().authoring_bone_budget();
        let chains = if rig.chains.is_empty() {
            builder.discover(&rig.skeleton, budget)?
        } else {
            builder.build(&rig.skeleton, &rig.chains, budget)?
        };

        let id = CharacterId(self.next_id);
        self.next_id += 1;

        let context = SimulationContext::new(id, chains, rig.colliders.clone(), &self.config);
        tracing::debug!(
            character = id.0,
            chains = context.chains().len(),
            "Character spawned"
        );
        self.registry.insert(id, self.contexts.len());
        self.contexts.push(context);
        Ok(id)
    }

    /// Remove a character; its chains return to idle first. Returns false for unknown ids.
    pub fn despawn(&mut self, id: CharacterId) -> bool {
        let Some(index) = self.registry.remove(&id) else {
            return false;
        };

        let mut context = self.contexts.swap_remove(index);
        if let Some(moved) = self.contexts.get(index) {
            self.registry.insert(moved.id(), index);
        }
        context.despawn();
        tracing::debug!(character = id.0, "Character despawned");
        true
    }

    pub fn context(&self, id: CharacterId) -> Option<&SimulationContext> {
        self.registry.get(&id).map(|&i| &self.contexts[i])
    }

    pub fn context_mut(&mut self, id: CharacterId) -> Option<&mut SimulationContext> {
        self.registry.get(&id).map(|&i| &mut self.contexts[i])
    }

    pub fn contexts(&self) -> impl Iterator<Item = &SimulationContext> {
        self.contexts.iter()
    }

    /// Advance every character by one frame
    ///
    /// Characters missing from `inputs` are treated as off-screen. The tier
    /// is fixed for the whole frame: pending requests apply before any
    /// character is touched. When demand exceeds `maxSimulatedChainsGlobal`
    /// only the lowest-ranked admitted chains are put under high load.
    pub fn step_frame(&mut self, inputs: &AHashMap<CharacterId, CharacterFrameInput<'_>>) -> FrameStats {
        self.tiers.apply_pending();
        let profile = self.tiers.snapshot();
        self.frame += 1;

        let config = &self.config;
        let parallel = self.contexts.len() >= config.parallel_threshold;
        let input_for = |id: CharacterId| {
            inputs
                .get(&id)
                .copied()
                .unwrap_or(CharacterFrameInput::OFFSCREEN)
        };

        let demand: usize = if parallel {
            self.contexts
                .par_iter_mut()
                .map(|context| {
                    let input = input_for(context.id());
                    context.plan(&input, &profile)
                })
                .sum()
        } else {
            self.contexts
                .iter_mut()
                .map(|context| {
                    let input = input_for(context.id());
                    context.plan(&input, &profile)
                })
                .sum()
        };

        let budget = profile.max_simulated_chains_global;
        let mut shed = 0;
        if !self.declared_high_load && demand > budget {
            self.global_candidates.clear();
            for (slot, context) in self.contexts.iter().enumerate() {
                self.global_candidates.extend(context.admitted(slot));
            }
            let excess = over_global_budget(&mut self.global_candidates, budget);
            for candidate in excess {
                self.contexts[candidate.slot].shed(candidate.chain);
            }
            shed = excess.len();
            tracing::debug!(demand, budget, shed, "Global chain budget exceeded");
        }
        let high_load = self.declared_high_load;

        let totals = if parallel {
            self.contexts
                .par_iter_mut()
                .map(|context| {
                    let input = input_for(context.id());
                    context.advance(&input, &profile, config, high_load)
                })
                .reduce(FrameStats::default, FrameStats::merge)
        } else {
            self.contexts
                .iter_mut()
                .map(|context| {
                    let input = input_for(context.id());
                    context.advance(&input, &profile, config, high_load)
                })
                .fold(FrameStats::default(), FrameStats::merge)
        };

        FrameStats {
            frame: self.frame,
            tier: profile.tier,
            demand,
            high_load: high_load || shed > 0,
            shed,
            ..totals
        }
    }
}
