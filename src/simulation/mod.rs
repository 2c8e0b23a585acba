//! Simulation - per-character contexts and the world that steps them

pub mod context;
pub mod stats;
pub mod world;

pub use context::{CharacterFrameInput, SimulationContext};
pub use stats::FrameStats;
pub use world::SimulationWorld;
