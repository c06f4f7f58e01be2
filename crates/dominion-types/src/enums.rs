//! Enumeration types for the Dominion simulation.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Terrain
// ---------------------------------------------------------------------------

/// The terrain of a single map tile.
///
/// Terrain is fixed at genesis: the grid is a pure function of the world
/// seed. Only ownership and location linkage change after that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Terrain {
    /// Open grassland, the default settlement ground.
    Plains,
    /// Dense woodland.
    Forest,
    /// Rolling hills.
    Hills,
    /// Impassable high peaks.
    Mountains,
    /// Rivers, lakes, and coastline.
    Water,
    /// Arid badlands.
    Desert,
}

// ---------------------------------------------------------------------------
// Buildings and routes
// ---------------------------------------------------------------------------

/// Operational status of a building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BuildingStatus {
    /// Fully operational.
    Active,
    /// Standing but degraded.
    Damaged,
    /// Destroyed; kept on the ledger for history.
    Ruined,
}

/// Whether a trade route currently carries traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RouteStatus {
    /// Caravans are moving; the route exerts price pressure.
    Active,
    /// Blocked by war, banditry, or decree; no price pressure.
    Disrupted,
}

// ---------------------------------------------------------------------------
// Diplomacy and roles
// ---------------------------------------------------------------------------

/// A faction's directed stance toward another faction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Stance {
    /// Formal alliance.
    Allied,
    /// Warm relations.
    Friendly,
    /// No particular disposition.
    #[default]
    Neutral,
    /// Distrust short of open hostility.
    Wary,
    /// Open hostility.
    Hostile,
}

/// The role an NPC plays in the simulation.
///
/// Stewards are the bounded subset of NPCs permitted to consult the
/// decision oracle each epoch; commoners are simulated only through the
/// deterministic subsystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NpcRole {
    /// Oracle-driven decision maker for their faction.
    Steward,
    /// Background populace.
    Commoner,
}
