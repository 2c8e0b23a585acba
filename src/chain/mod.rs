//! Bone chain model - static description and runtime state of simulated chains

pub mod builder;
pub mod model;
pub mod pose;

pub use builder::ChainBuilder;
pub use model::{BoneChain, BoneNode};
pub use pose::{BonePose, IdlePose};
