//! World state: the single source of truth mutated one epoch at a time.
//!
//! [`WorldState`] bundles the map, factions, NPCs, economy, and the three
//! append-only history logs (event log, decision traces, world diffs). It is
//! created once at genesis and only ever rolled forward by the turn
//! orchestrator; nothing rolls it back.
//!
//! Gauges (`unrest`, `defense`, `prosperity`) are clamped to `0..=100`
//! everywhere they are written, via [`clamp_gauge`]. Population clamps at 0
//! only.

use serde::{Deserialize, Serialize};

use crate::economy::Economy;
use crate::enums::{BuildingStatus, RouteStatus, Terrain};
use crate::faction::Faction;
use crate::history::{DecisionTrace, EventLogEntry, WorldDiffRecord};
use crate::ids::{BuildingId, FactionId, LocationId, NpcId, RouteId, TraceId};
use crate::npc::Npc;

/// Upper bound for location gauges (unrest, defense, prosperity).
pub const GAUGE_MAX: u32 = 100;

/// Clamp a signed gauge computation into `0..=GAUGE_MAX`.
pub fn clamp_gauge(value: i64) -> u32 {
    u32::try_from(value.clamp(0, i64::from(GAUGE_MAX))).unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// The simulation's temporal state.
///
/// `epoch` is the monotone turn counter and the only totally-ordered key for
/// history. `day` and `hour` are derived presentation fields: one completed
/// turn advances `epoch` and `day` by exactly 1 and leaves `hour` fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldTime {
    /// Monotone turn counter, incremented once per committed turn.
    pub epoch: u64,
    /// In-world day, incremented in lockstep with `epoch`.
    pub day: u64,
    /// Hour of day (presentation only; a turn spans a whole day).
    pub hour: u8,
}

impl WorldTime {
    /// The time at which a freshly generated world begins.
    pub const fn genesis() -> Self {
        Self {
            epoch: 1,
            day: 1,
            hour: 8,
        }
    }

    /// Return the time after one completed turn, or `None` if the epoch
    /// counter would overflow.
    pub fn advanced(self) -> Option<Self> {
        Some(Self {
            epoch: self.epoch.checked_add(1)?,
            day: self.day.checked_add(1)?,
            hour: self.hour,
        })
    }
}

impl Default for WorldTime {
    fn default() -> Self {
        Self::genesis()
    }
}

// ---------------------------------------------------------------------------
// Map
// ---------------------------------------------------------------------------

/// One cell of the fixed terrain grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Column, `0..width`.
    pub x: u32,
    /// Row, `0..height`.
    pub y: u32,
    /// Terrain, fixed at genesis.
    pub terrain: Terrain,
    /// Settlement occupying this tile, if any.
    #[serde(default)]
    pub location_id: Option<LocationId>,
    /// Faction claiming this tile, if any.
    #[serde(default)]
    pub owner: Option<FactionId>,
}

/// A building standing at a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    /// Unique identifier.
    pub id: BuildingId,
    /// Structure kind, e.g. "granary" or "barracks" (theme-driven).
    pub kind: String,
    /// Upgrade level; new constructions start at 1.
    pub level: u32,
    /// Faction that paid for the construction.
    pub owner: FactionId,
    /// Operational status.
    pub status: BuildingStatus,
}

/// A mutable settlement on the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Unique identifier.
    pub id: LocationId,
    /// Display name.
    pub name: String,
    /// Column of the tile this settlement occupies.
    pub x: u32,
    /// Row of the tile this settlement occupies.
    pub y: u32,
    /// Owning faction. A location has at most one owner at a time.
    #[serde(default)]
    pub faction_id: Option<FactionId>,
    /// Inhabitants; clamped at 0 only, may exceed 100.
    pub population: u32,
    /// Fortification gauge, `0..=100`.
    pub defense: u32,
    /// Civil unrest gauge, `0..=100`.
    pub unrest: u32,
    /// Prosperity gauge, `0..=100`.
    pub prosperity: u32,
    /// Buildings in construction order.
    #[serde(default)]
    pub buildings: Vec<Building>,
}

impl Location {
    /// Number of buildings standing here (any status).
    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }

    /// Shift the unrest gauge by a signed delta, clamped to `0..=100`.
    pub fn adjust_unrest(&mut self, delta: i64) {
        self.unrest = clamp_gauge(i64::from(self.unrest).saturating_add(delta));
    }

    /// Shift the defense gauge by a signed delta, clamped to `0..=100`.
    pub fn adjust_defense(&mut self, delta: i64) {
        self.defense = clamp_gauge(i64::from(self.defense).saturating_add(delta));
    }

    /// Shift the prosperity gauge by a signed delta, clamped to `0..=100`.
    pub fn adjust_prosperity(&mut self, delta: i64) {
        self.prosperity = clamp_gauge(i64::from(self.prosperity).saturating_add(delta));
    }
}

/// A trade connection between two locations carrying one commodity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRoute {
    /// Unique identifier.
    pub id: RouteId,
    /// Origin settlement.
    pub from: LocationId,
    /// Destination settlement.
    pub to: LocationId,
    /// Name of the commodity this route carries.
    pub commodity: String,
    /// Caravan volume per epoch (abstract units).
    pub volume: u32,
    /// Banditry/hazard gauge, `0..=100`.
    pub risk: u32,
    /// Whether the route currently carries traffic.
    pub status: RouteStatus,
}

/// The fixed grid plus the mutable settlements and routes on top of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldMap {
    /// Grid width in tiles.
    pub width: u32,
    /// Grid height in tiles.
    pub height: u32,
    /// Row-major tile grid, `width * height` entries.
    #[serde(default)]
    pub tiles: Vec<Tile>,
    /// Settlements.
    #[serde(default)]
    pub locations: Vec<Location>,
    /// Trade routes.
    #[serde(default)]
    pub routes: Vec<TradeRoute>,
}

impl WorldMap {
    /// Whether `(x, y)` falls inside the grid.
    pub const fn in_bounds(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }

    /// Immutable tile lookup by coordinate.
    pub fn tile_at(&self, x: u32, y: u32) -> Option<&Tile> {
        if !self.in_bounds(x, y) {
            return None;
        }
        let index = y
            .checked_mul(self.width)
            .and_then(|row| row.checked_add(x))?;
        self.tiles.get(usize::try_from(index).ok()?)
    }

    /// Mutable tile lookup by coordinate.
    pub fn tile_at_mut(&mut self, x: u32, y: u32) -> Option<&mut Tile> {
        if !self.in_bounds(x, y) {
            return None;
        }
        let index = y
            .checked_mul(self.width)
            .and_then(|row| row.checked_add(x))?;
        self.tiles.get_mut(usize::try_from(index).ok()?)
    }

    /// Immutable location lookup.
    pub fn location(&self, id: LocationId) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    /// Mutable location lookup.
    pub fn location_mut(&mut self, id: LocationId) -> Option<&mut Location> {
        self.locations.iter_mut().find(|l| l.id == id)
    }

    /// Count active routes carrying the named commodity.
    pub fn active_route_count(&self, commodity: &str) -> usize {
        self.routes
            .iter()
            .filter(|r| r.status == RouteStatus::Active && r.commodity == commodity)
            .count()
    }
}

// ---------------------------------------------------------------------------
// WorldState
// ---------------------------------------------------------------------------

/// The complete simulation state, versioned by `time.epoch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    /// Display name of this world.
    pub name: String,
    /// Seed the terrain grid was generated from.
    pub seed: u64,
    /// Temporal state.
    pub time: WorldTime,
    /// Terrain grid, settlements, routes.
    pub map: WorldMap,
    /// All factions.
    #[serde(default)]
    pub factions: Vec<Faction>,
    /// All NPCs.
    #[serde(default)]
    pub npcs: Vec<Npc>,
    /// Commodities and market history.
    #[serde(default)]
    pub economy: Economy,
    /// Append-only narrative history.
    #[serde(default)]
    pub event_log: Vec<EventLogEntry>,
    /// Append-only decision audit records.
    #[serde(default)]
    pub decision_traces: Vec<DecisionTrace>,
    /// Append-only per-epoch change summaries.
    #[serde(default)]
    pub world_diffs: Vec<WorldDiffRecord>,
    /// Epoch at which a shared tool was last evolved (once-per-epoch guard).
    #[serde(default)]
    pub last_evolved_epoch: u64,
}

impl WorldState {
    /// Immutable faction lookup.
    pub fn faction(&self, id: FactionId) -> Option<&Faction> {
        self.factions.iter().find(|f| f.id == id)
    }

    /// Mutable faction lookup.
    pub fn faction_mut(&mut self, id: FactionId) -> Option<&mut Faction> {
        self.factions.iter_mut().find(|f| f.id == id)
    }

    /// Immutable NPC lookup.
    pub fn npc(&self, id: NpcId) -> Option<&Npc> {
        self.npcs.iter().find(|n| n.id == id)
    }

    /// Mutable NPC lookup.
    pub fn npc_mut(&mut self, id: NpcId) -> Option<&mut Npc> {
        self.npcs.iter_mut().find(|n| n.id == id)
    }

    /// Whether a decision trace with the given ID has been appended.
    pub fn has_trace(&self, id: TraceId) -> bool {
        self.decision_traces.iter().any(|t| t.id == id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn clamp_gauge_bounds() {
        assert_eq!(clamp_gauge(-5), 0);
        assert_eq!(clamp_gauge(0), 0);
        assert_eq!(clamp_gauge(42), 42);
        assert_eq!(clamp_gauge(100), 100);
        assert_eq!(clamp_gauge(250), 100);
    }

    #[test]
    fn time_advances_epoch_and_day_together() {
        let t = WorldTime::genesis();
        let next = t.advanced().unwrap();
        assert_eq!(next.epoch, 2);
        assert_eq!(next.day, 2);
        assert_eq!(next.hour, t.hour);
    }

    #[test]
    fn time_overflow_is_detected() {
        let t = WorldTime {
            epoch: u64::MAX,
            day: 1,
            hour: 0,
        };
        assert!(t.advanced().is_none());
    }

    #[test]
    fn location_gauges_clamp() {
        let mut loc = Location {
            id: LocationId::new(),
            name: "Thornwick".to_string(),
            x: 0,
            y: 0,
            faction_id: None,
            population: 120,
            defense: 10,
            unrest: 95,
            prosperity: 50,
            buildings: Vec::new(),
        };

        loc.adjust_defense(-30);
        assert_eq!(loc.defense, 0);

        loc.adjust_unrest(20);
        assert_eq!(loc.unrest, 100);

        loc.adjust_prosperity(5);
        assert_eq!(loc.prosperity, 55);
    }

    #[test]
    fn tile_lookup_by_coordinate() {
        let tiles = vec![
            Tile { x: 0, y: 0, terrain: Terrain::Plains, location_id: None, owner: None },
            Tile { x: 1, y: 0, terrain: Terrain::Forest, location_id: None, owner: None },
            Tile { x: 0, y: 1, terrain: Terrain::Hills, location_id: None, owner: None },
            Tile { x: 1, y: 1, terrain: Terrain::Water, location_id: None, owner: None },
        ];
        let map = WorldMap {
            width: 2,
            height: 2,
            tiles,
            locations: Vec::new(),
            routes: Vec::new(),
        };

        assert_eq!(map.tile_at(1, 1).map(|t| t.terrain), Some(Terrain::Water));
        assert_eq!(map.tile_at(0, 1).map(|t| t.terrain), Some(Terrain::Hills));
        assert!(map.tile_at(2, 0).is_none());
    }

    #[test]
    fn active_route_count_skips_disrupted() {
        let a = LocationId::new();
        let b = LocationId::new();
        let route = |status, commodity: &str| TradeRoute {
            id: RouteId::new(),
            from: a,
            to: b,
            commodity: commodity.to_string(),
            volume: 10,
            risk: 20,
            status,
        };
        let map = WorldMap {
            width: 1,
            height: 1,
            tiles: Vec::new(),
            locations: Vec::new(),
            routes: vec![
                route(RouteStatus::Active, "salt"),
                route(RouteStatus::Disrupted, "salt"),
                route(RouteStatus::Active, "timber"),
            ],
        };

        assert_eq!(map.active_route_count("salt"), 1);
        assert_eq!(map.active_route_count("timber"), 1);
        assert_eq!(map.active_route_count("silk"), 0);
    }
}
