pub mod config;
pub mod error;
pub mod transform;
pub mod types;

pub use config::SimulationConfig;
pub use error::{ConfigurationError, Result, SimulationWarning};
pub use transform::Transform;
pub use types::{ChainId, CharacterId, Frame};
