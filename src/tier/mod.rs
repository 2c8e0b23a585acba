//! Quality tier policy - device classification to simulation cost knobs

pub mod device;
pub mod profile;
pub mod settings;

pub use device::DeviceCapabilities;
pub use profile::{QualityTierProfile, Tier, TierTable};
pub use settings::{TierChangeHandle, TierSettings};
