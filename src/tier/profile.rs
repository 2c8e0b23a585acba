//! Tier profiles: the bundle of cost knobs selected by device class
//!
//! Option names in TOML follow the settings surface shared with the
//! client (`maxChainsPerCharacter`, `updateIntervalFrames`, ...).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{ConfigurationError, Result};

/// Device-capability classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Low,
    Mid,
    High,
}

impl Default for Tier {
    fn default() -> Self {
        Self::Low
    }
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::High, Tier::Mid, Tier::Low];

    /// One tier cheaper; Low stays Low
    pub fn downgraded(self) -> Tier {
        match self {
            Tier::High => Tier::Mid,
            Tier::Mid | Tier::Low => Tier::Low,
        }
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(Tier::High),
            "mid" | "medium" => Ok(Tier::Mid),
            "low" => Ok(Tier::Low),
            other => Err(format!("unknown tier '{}'", other)),
        }
    }
}

/// Simulation knobs for one tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityTierProfile {
    /// Filled in from the table key when loaded
    #[serde(skip)]
    pub tier: Tier,
    /// Upper bound on concurrently simulated chains per character
    pub max_chains_per_character: usize,
    /// Bones past this index in a chain hold their idle rotation
    pub max_bones_per_chain: usize,
    /// Frames between integration steps for a chain
    pub update_interval_frames: u32,
    pub collision_enabled: bool,
    /// Camera distance beyond which chains freeze (world units)
    pub visibility_distance_threshold: f32,
    /// Colliders considered per character when collision is enabled
    pub max_colliders: usize,
    /// Process-wide chain demand above which the frame counts as high load
    pub max_simulated_chains_global: usize,
}

impl QualityTierProfile {
    pub fn high() -> Self {
        Self {
            tier: Tier::High,
            max_chains_per_character: 8,
            max_bones_per_chain: 8,
            update_interval_frames: 1,
            collision_enabled: true,
            visibility_distance_threshold: 30.0,
            max_colliders: 8,
            max_simulated_chains_global: 256,
        }
    }

    /// Mobile default: every 2nd frame, no collision
    pub fn mid() -> Self {
        Self {
            tier: Tier::Mid,
            max_chains_per_character: 4,
            max_bones_per_chain: 5,
            update_interval_frames: 2,
            collision_enabled: false,
            visibility_distance_threshold: 20.0,
            max_colliders: 0,
            max_simulated_chains_global: 96,
        }
    }

    /// Static poses only
    pub fn low() -> Self {
        Self {
            tier: Tier::Low,
            max_chains_per_character: 0,
            max_bones_per_chain: 4,
            update_interval_frames: 4,
            collision_enabled: false,
            visibility_distance_threshold: 0.0,
            max_colliders: 0,
            max_simulated_chains_global: 0,
        }
    }

    pub fn for_tier(tier: Tier) -> Self {
        match tier {
            Tier::High => Self::high(),
            Tier::Mid => Self::mid(),
            Tier::Low => Self::low(),
        }
    }

    /// Whether any chain may enter `Simulated` under this profile
    ///
    /// Low never simulates, whatever its numbers say.
    pub fn allows_simulation(&self) -> bool {
        self.tier != Tier::Low && self.max_chains_per_character > 0
    }

    /// Whether collision runs for this tier
    pub fn collision_active(&self) -> bool {
        self.collision_enabled && self.max_colliders > 0
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| ConfigurationError::InvalidTierProfile {
            tier: self.tier,
            reason: reason.to_string(),
        };

        if self.update_interval_frames == 0 {
            return Err(invalid("updateIntervalFrames must be at least 1"));
        }
        if !(self.visibility_distance_threshold >= 0.0 && self.visibility_distance_threshold.is_finite()) {
            return Err(invalid("visibilityDistanceThreshold must be finite and non-negative"));
        }
        if self.tier == Tier::Low && self.max_chains_per_character > 0 {
            return Err(invalid("Low tier must not allow simulated chains"));
        }
        if self.tier != Tier::Low && self.max_bones_per_chain == 0 && self.max_chains_per_character > 0 {
            return Err(invalid("maxBonesPerChain must be at least 1 when chains are allowed"));
        }

        Ok(())
    }
}

/// Profiles for every tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierTable {
    pub high: QualityTierProfile,
    pub mid: QualityTierProfile,
    pub low: QualityTierProfile,
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            high: QualityTierProfile::high(),
            mid: QualityTierProfile::mid(),
            low: QualityTierProfile::low(),
        }
    }
}

impl TierTable {
    /// Parse `[high]`, `[mid]` and `[low]` tables; absent tables keep defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut table: TierTable = toml::from_str(content)?;
        table.high.tier = Tier::High;
        table.mid.tier = Tier::Mid;
        table.low.tier = Tier::Low;
        table.validate()?;
        Ok(table)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn profile(&self, tier: Tier) -> &QualityTierProfile {
        match tier {
            Tier::High => &self.high,
            Tier::Mid => &self.mid,
            Tier::Low => &self.low,
        }
    }

    /// Longest chain any tier can simulate; chains are truncated to this at build time
    pub fn authoring_bone_budget(&self) -> usize {
        Tier::ALL
            .iter()
            .map(|&tier| self.profile(tier).max_bones_per_chain)
            .max()
            .unwrap_or(0)
    }

    pub fn validate(&self) -> Result<()> {
        for tier in Tier::ALL {
            self.profile(tier).validate()?;
        }
        Ok(())
    }
}
