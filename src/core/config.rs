//! Simulation configuration with documented constants
//!
//! Tier-independent tuning lives here. Per-device knobs (chain budgets,
//! update rate, collision) belong to `tier::QualityTierProfile` instead.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{ConfigurationError, Result};

/// Configuration for the solver, scheduler and collision systems
///
/// These values have been tuned for hair/cloth chains at 30-60 fps.
/// Changing them affects how springy and how expensive outfits feel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === SOLVER ===
    /// Largest time step a single integration may cover (seconds)
    ///
    /// Throttled chains integrate several frames' worth of time at once.
    /// Above roughly 2 / sqrt(stiffness) the semi-implicit Euler step
    /// diverges, so long hitches are clamped to this value instead.
    pub max_step_seconds: f32,

    /// Length of the tail synthesized for a tip bone with no child (world units)
    ///
    /// Matches the 7cm default used by common spring-bone exporters.
    pub synthesized_tail_length: f32,

    /// Threshold below which lengths and directions count as degenerate
    pub numeric_epsilon: f32,

    // === SCHEDULER ===
    /// Fraction of the remaining distance to the last computed target that
    /// displayed rotations cover each frame when a chain is throttled
    ///
    /// 1.0 = snap (stepped motion), 0.5 = halve the gap every frame.
    pub interpolation_blend: f32,

    // === COLLISION ===
    /// Radius of each bone tail when tested against colliders (world units)
    pub bone_hit_radius: f32,

    /// Push-out passes per bone; resolves tails caught between colliders
    pub collision_passes: usize,

    /// Colliders retained per character at spawn
    ///
    /// The resolved-collider buffer is sized from this once, so the frame
    /// path never allocates for collision.
    pub max_colliders: usize,

    // === PARALLELIZATION ===
    /// Minimum character count before frames are stepped with rayon
    ///
    /// Below this, thread hand-off costs more than a few chains' integration.
    pub parallel_threshold: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            // Solver
            max_step_seconds: 0.05,
            synthesized_tail_length: 0.07,
            numeric_epsilon: 1e-6,

            // Scheduler
            interpolation_blend: 0.5,

            // Collision
            bone_hit_radius: 0.02,
            collision_passes: 3,
            max_colliders: 16,

            // Parallelization
            parallel_threshold: 32,
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML; missing keys take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file on disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if !(self.max_step_seconds > 0.0 && self.max_step_seconds.is_finite()) {
            return Err(ConfigurationError::InvalidConfig(format!(
                "max_step_seconds ({}) must be positive",
                self.max_step_seconds
            )));
        }

        if !(self.interpolation_blend > 0.0 && self.interpolation_blend <= 1.0) {
            return Err(ConfigurationError::InvalidConfig(format!(
                "interpolation_blend ({}) must be in (0, 1]",
                self.interpolation_blend
            )));
        }

        if self.synthesized_tail_length <= self.numeric_epsilon {
            return Err(ConfigurationError::InvalidConfig(
                "synthesized_tail_length must exceed numeric_epsilon".into(),
            ));
        }

        if self.bone_hit_radius < 0.0 {
            return Err(ConfigurationError::InvalidConfig(
                "bone_hit_radius must not be negative".into(),
            ));
        }

        if self.collision_passes == 0 {
            return Err(ConfigurationError::InvalidConfig(
                "collision_passes must be at least 1".into(),
            ));
        }

        Ok(())
    }
}
