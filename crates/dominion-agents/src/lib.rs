//! Agent-facing subsystems for the Dominion simulation.
//!
//! - [`memory`] -- per-NPC decay, formation, and ranked recall
//! - [`construction`] -- resource-gated building placement
//! - [`combat`] -- safe application of external combat verdicts
//! - [`armory`] -- the shared, cooldown-gated tool archive
//! - [`error`] -- the recovered-failure taxonomy for agent actions

pub mod armory;
pub mod combat;
pub mod construction;
pub mod error;
pub mod memory;

pub use combat::{CombatOutcome, CombatReport};
pub use construction::ConstructionOutcome;
pub use error::ActionError;
