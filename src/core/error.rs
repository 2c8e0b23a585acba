use thiserror::Error;

use crate::core::types::ChainId;
use crate::tier::Tier;

/// Build- and load-time failures
///
/// These surface while authoring data is turned into chains or while
/// settings are loaded. Nothing on the per-frame path returns one.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Chain '{chain}' cannot fit any bone within a budget of {budget}")]
    BoneBudgetUnresolved { chain: String, budget: usize },

    #[error("Bone {bone} is claimed by both chain '{first}' and chain '{second}'")]
    DuplicateBoneClaim {
        bone: usize,
        first: String,
        second: String,
    },

    #[error("Bone index {0} is not part of the skeleton")]
    UnknownBone(usize),

    #[error("Chain '{chain}': bone {bone} is not a child of the previous bone")]
    BrokenChain { chain: String, bone: usize },

    #[error("Chain '{chain}': root bone {bone} has no static anchor")]
    MissingAnchor { chain: String, bone: usize },

    #[error("Dynamic bone {bone} branches into more than one dynamic child")]
    BranchingChain { bone: usize },

    #[error("Bone {bone} has zero length and cannot swing")]
    DegenerateBone { bone: usize },

    #[error("Chain definition '{0}' lists no bones")]
    EmptyChain(String),

    #[error("Invalid tier profile for {tier:?}: {reason}")]
    InvalidTierProfile { tier: Tier, reason: String },

    #[error("Invalid simulation config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ConfigurationError>;

/// Recoverable conditions met while simulating
///
/// Logged and counted, never propagated: the worst outcome is a bone that
/// holds its pose or a chain that skips collision for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationWarning {
    /// A spring update produced a non-finite or degenerate result
    NumericInstability { chain: ChainId, bone: usize },
    /// A collider's bone was absent from the frame pose
    MissingColliderData { collider: usize },
    /// Overlapping colliders left no clear position for a bone tail
    UnresolvedCollision { chain: ChainId, bone: usize },
}

impl SimulationWarning {
    pub fn log(&self) {
        match *self {
            SimulationWarning::NumericInstability { chain, bone } => {
                tracing::warn!(?chain, bone, "Degenerate spring update, holding previous pose");
            }
            SimulationWarning::MissingColliderData { collider } => {
                tracing::warn!(collider, "Collider bone missing from frame pose, skipping it");
            }
            SimulationWarning::UnresolvedCollision { chain, bone } => {
                tracing::debug!(?chain, bone, "Tail trapped between colliders, holding previous pose");
            }
        }
    }
}
