//! Shared type definitions for the Dominion simulation.
//!
//! This crate is the single source of truth for all types used across the
//! Dominion workspace.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`enums`] -- Enumeration types (terrain, statuses, stances, roles)
//! - [`world`] -- World state, map, locations, buildings, routes, time
//! - [`faction`] -- Factions and resource pools
//! - [`npc`] -- NPCs, goals, and private memories
//! - [`economy`] -- Commodities and market history
//! - [`history`] -- Append-only audit records (events, traces, diffs)
//! - [`tools`] -- The shared tool archive and its parameter schema
//! - [`save`] -- Save bundle and versioned schema migration

pub mod economy;
pub mod enums;
pub mod faction;
pub mod history;
pub mod ids;
pub mod npc;
pub mod save;
pub mod tools;
pub mod world;

// Re-export all public types at crate root for convenience.
pub use economy::{Commodity, Economy, MarketEvent};
pub use enums::{BuildingStatus, NpcRole, RouteStatus, Stance, Terrain};
pub use faction::{Faction, ResourcePool};
pub use history::{DecisionTrace, EventLogEntry, WorldDiffRecord};
pub use ids::{
    BuildingId, EventId, FactionId, LocationId, NpcId, RouteId, ToolId, TraceId,
};
pub use npc::{Goal, MemoryItem, Npc};
pub use save::{SCHEMA_VERSION, SaveBundle, SaveError, migrate};
pub use tools::{
    AgentTool, COOLDOWN_MAX_DAYS, COOLDOWN_MIN_DAYS, ParamKind, ToolArchive, ToolParam,
};
pub use world::{
    Building, GAUGE_MAX, Location, Tile, TradeRoute, WorldMap, WorldState, WorldTime,
    clamp_gauge,
};
