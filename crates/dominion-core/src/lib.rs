//! Turn orchestration and external contracts for the Dominion simulation.
//!
//! - [`config`] -- typed engine configuration loaded from YAML
//! - [`oracle`] -- the decision/content oracle contract, stub, and retries
//! - [`genesis`] -- world generation (terrain + oracle theme content)
//! - [`turn`] -- the turn orchestrator ("advance time")
//! - [`store`] -- save-bundle persistence

pub mod config;
pub mod genesis;
pub mod oracle;
pub mod store;
pub mod turn;

pub use config::{ConfigError, EngineConfig};
pub use genesis::GenesisError;
pub use oracle::{Oracle, OracleError, RetryingOracle, StubOracle};
pub use store::{JsonFileStore, StoreError, WorldStore};
pub use turn::{TurnError, TurnOptions, TurnSummary, advance_epoch};
