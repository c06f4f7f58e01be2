//! Error types for agent-facing actions.
//!
//! Every variant here represents a *recovered* failure: callers convert
//! these into failed action results and continue the turn. Nothing in this
//! taxonomy is allowed to abort an epoch.

use dominion_types::{FactionId, LocationId, ResourcePool, ToolId};

/// Errors produced by the action resolvers and the tool archive.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// A referenced faction does not exist.
    #[error("faction {id} not found")]
    FactionNotFound {
        /// The missing faction.
        id: FactionId,
    },

    /// A referenced location does not exist.
    #[error("location {id} not found")]
    LocationNotFound {
        /// The missing location.
        id: LocationId,
    },

    /// A referenced tool does not exist in the archive.
    #[error("tool {id} not found")]
    ToolNotFound {
        /// The missing tool.
        id: ToolId,
    },

    /// A cost could not be fully covered. No partial deduction occurred.
    #[error("insufficient resources: need {needed:?}, have {available:?}")]
    InsufficientResources {
        /// The full cost that was required.
        needed: ResourcePool,
        /// What the faction actually held.
        available: ResourcePool,
    },

    /// A tool is still cooling down.
    #[error("tool is on cooldown until epoch {ready_at}")]
    Cooldown {
        /// First epoch at which the tool is usable again.
        ready_at: u64,
    },

    /// A definition or input failed validation at the boundary.
    #[error("validation failed: {reason}")]
    Validation {
        /// What exactly was malformed.
        reason: String,
    },
}
