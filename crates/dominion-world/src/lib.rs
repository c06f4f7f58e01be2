//! Geography and markets for the Dominion simulation.
//!
//! - [`terrain`] -- deterministic tile grid generation from the world seed
//! - [`market`] -- the per-epoch commodity pricing tick
//! - [`diff`] -- coarse epoch-to-epoch change summaries

pub mod diff;
pub mod market;
pub mod terrain;

pub use diff::diff;
pub use market::simulate_economy;
pub use terrain::{generate_grid, terrain_at};
