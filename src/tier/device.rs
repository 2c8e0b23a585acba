//! Device capability classification

use serde::{Deserialize, Serialize};

use crate::tier::profile::Tier;

/// Capabilities reported by the platform layer at startup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    pub cpu_cores: u32,
    pub memory_mb: u32,
    /// Normalized GPU benchmark score (0.0 = weakest supported, 1.0 = flagship)
    pub gpu_score: f32,
    /// Device is currently thermally throttled
    pub thermal_throttled: bool,
}

impl DeviceCapabilities {
    /// Map capabilities to a tier
    ///
    /// Thermal throttling drops the result by one tier.
    pub fn classify(&self) -> Tier {
        let tier = if self.cpu_cores >= 8 && self.memory_mb >= 6144 && self.gpu_score >= 0.7 {
            Tier::High
        } else if self.cpu_cores >= 4 && self.memory_mb >= 3072 && self.gpu_score >= 0.35 {
            Tier::Mid
        } else {
            Tier::Low
        };

        if self.thermal_throttled {
            tier.downgraded()
        } else {
            tier
        }
    }
}
