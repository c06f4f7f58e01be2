//! The conflict resolver: safe application of an external combat verdict.
//!
//! The actual outcome of an engagement -- casualties, conquest, narrative --
//! comes from an external arbiter. This module's job is interpreting that
//! verdict defensively: casualties clamp to what each side actually fields,
//! gauges clamp to their bounds, conquest is an atomic ownership transfer
//! plus unrest reset, and a missing entity degrades to a fog-of-war no-op
//! instead of an error. Combat must never abort a turn.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use dominion_types::{FactionId, GAUGE_MAX, LocationId, WorldState};

/// Extra defense penalty applied when a settlement falls.
const CONQUEST_DEFENSE_PENALTY: i64 = 10;

/// The arbiter's verdict on one engagement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatReport {
    /// Narrative description of the engagement.
    pub narrative: String,
    /// Troops the attacker loses (clamped to their standing army).
    pub attacker_casualties: u32,
    /// Troops the defender loses (clamped to their standing army).
    pub defender_casualties: u32,
    /// Whether the location changes hands.
    pub conquered: bool,
    /// Damage to the location's defense gauge.
    pub defense_damage: u32,
    /// Shift to the location's unrest gauge (ignored on conquest).
    pub unrest_delta: i32,
}

impl CombatReport {
    /// The deterministic fallback verdict used when the arbiter is
    /// unavailable: an inconclusive skirmish with zero state changes.
    pub fn inconclusive() -> Self {
        Self {
            narrative: "An inconclusive skirmish; both sides withdraw by nightfall".to_string(),
            attacker_casualties: 0,
            defender_casualties: 0,
            conquered: false,
            defense_damage: 0,
            unrest_delta: 0,
        }
    }
}

/// What applying a combat report did to the world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombatOutcome {
    /// The engagement was applied.
    Resolved {
        /// Narrative log line for the event history.
        log: String,
        /// Whether the location changed hands.
        conquered: bool,
        /// Attacker losses actually applied.
        attacker_losses: u32,
        /// Defender losses actually applied.
        defender_losses: u32,
    },
    /// One of the referenced entities does not exist; nothing changed.
    FogOfWar,
}

/// Apply an arbiter's verdict to an engagement at a location.
///
/// Missing attacker, defender, or location yields
/// [`CombatOutcome::FogOfWar`] with zero updates -- a recovered failure,
/// not a fatal one.
pub fn resolve_combat(
    state: &mut WorldState,
    attacker: FactionId,
    defender: FactionId,
    location_id: LocationId,
    report: &CombatReport,
) -> CombatOutcome {
    if state.faction(attacker).is_none()
        || state.faction(defender).is_none()
        || state.map.location(location_id).is_none()
    {
        warn!(
            %attacker,
            %defender,
            location = %location_id,
            "combat against unknown entities; fog of war"
        );
        return CombatOutcome::FogOfWar;
    }

    let attacker_losses = state
        .faction_mut(attacker)
        .map(|f| f.suffer_casualties(report.attacker_casualties))
        .unwrap_or(0);
    let defender_losses = state
        .faction_mut(defender)
        .map(|f| f.suffer_casualties(report.defender_casualties))
        .unwrap_or(0);

    let Some(location) = state.map.location_mut(location_id) else {
        return CombatOutcome::FogOfWar;
    };

    if report.conquered {
        // Conquest is atomic: ownership, the extra defense penalty, and the
        // unrest reset land together.
        location.faction_id = Some(attacker);
        let total_damage =
            i64::from(report.defense_damage).saturating_add(CONQUEST_DEFENSE_PENALTY);
        location.adjust_defense(total_damage.saturating_neg());
        location.unrest = GAUGE_MAX;
    } else {
        location.adjust_defense(-i64::from(report.defense_damage));
        location.adjust_unrest(i64::from(report.unrest_delta));
    }

    let location_name = location.name.clone();
    let (x, y) = (location.x, location.y);

    if report.conquered {
        // The settlement's tile follows its new ruler.
        if let Some(tile) = state.map.tile_at_mut(x, y) {
            tile.owner = Some(attacker);
        }
    }

    info!(
        %attacker,
        %defender,
        location = %location_name,
        conquered = report.conquered,
        attacker_losses,
        defender_losses,
        "combat resolved"
    );

    CombatOutcome::Resolved {
        log: report.narrative.clone(),
        conquered: report.conquered,
        attacker_losses,
        defender_losses,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::collections::BTreeMap;

    use rust_decimal::Decimal;

    use dominion_types::{
        Economy, Faction, Location, ResourcePool, WorldMap, WorldState, WorldTime,
    };

    use super::*;

    fn make_state() -> (WorldState, FactionId, FactionId, LocationId) {
        let attacker = FactionId::new();
        let defender = FactionId::new();
        let location_id = LocationId::new();

        let faction = |id: FactionId, name: &str, troops: u32| Faction {
            id,
            name: name.to_string(),
            archetype: "warband".to_string(),
            resources: ResourcePool::default(),
            troops,
            troop_quality: Decimal::ONE,
            relations: BTreeMap::new(),
            laws: Vec::new(),
        };

        let state = WorldState {
            name: "Test".to_string(),
            seed: 1,
            time: WorldTime::genesis(),
            map: WorldMap {
                width: 0,
                height: 0,
                tiles: Vec::new(),
                locations: vec![Location {
                    id: location_id,
                    name: "Thornwick".to_string(),
                    x: 0,
                    y: 0,
                    faction_id: Some(defender),
                    population: 300,
                    defense: 50,
                    unrest: 30,
                    prosperity: 60,
                    buildings: Vec::new(),
                }],
                routes: Vec::new(),
            },
            factions: vec![
                faction(attacker, "Ashen Compact", 100),
                faction(defender, "Gilded Court", 80),
            ],
            npcs: Vec::new(),
            economy: Economy::default(),
            event_log: Vec::new(),
            decision_traces: Vec::new(),
            world_diffs: Vec::new(),
            last_evolved_epoch: 0,
        };

        (state, attacker, defender, location_id)
    }

    #[test]
    fn casualties_clamp_to_standing_troops() {
        let (mut state, attacker, defender, location_id) = make_state();

        let report = CombatReport {
            narrative: "A bloody rout".to_string(),
            attacker_casualties: 250, // more than the 100 fielded
            defender_casualties: 30,
            conquered: false,
            defense_damage: 10,
            unrest_delta: 5,
        };

        let outcome = resolve_combat(&mut state, attacker, defender, location_id, &report);
        let CombatOutcome::Resolved { attacker_losses, .. } = outcome else {
            panic!("expected resolved outcome");
        };

        assert_eq!(attacker_losses, 100);
        assert_eq!(state.faction(attacker).unwrap().troops, 0);
        assert_eq!(state.faction(defender).unwrap().troops, 50);
    }

    #[test]
    fn conquest_transfers_ownership_and_maxes_unrest() {
        let (mut state, attacker, defender, location_id) = make_state();

        let report = CombatReport {
            narrative: "The gates are breached".to_string(),
            attacker_casualties: 10,
            defender_casualties: 40,
            conquered: true,
            defense_damage: 20,
            unrest_delta: -50, // ignored on conquest
        };

        let outcome = resolve_combat(&mut state, attacker, defender, location_id, &report);
        assert!(matches!(outcome, CombatOutcome::Resolved { conquered: true, .. }));

        let location = state.map.location(location_id).unwrap();
        assert_eq!(location.faction_id, Some(attacker));
        assert_eq!(location.unrest, 100);
        // 50 defense - 20 damage - 10 conquest penalty.
        assert_eq!(location.defense, 20);
    }

    #[test]
    fn conquest_defense_floors_at_zero() {
        let (mut state, attacker, defender, location_id) = make_state();
        state.map.location_mut(location_id).unwrap().defense = 5;

        let report = CombatReport {
            narrative: "Walls crumble".to_string(),
            attacker_casualties: 0,
            defender_casualties: 0,
            conquered: true,
            defense_damage: 30,
            unrest_delta: 0,
        };

        resolve_combat(&mut state, attacker, defender, location_id, &report);
        assert_eq!(state.map.location(location_id).unwrap().defense, 0);
    }

    #[test]
    fn holdout_applies_damage_and_unrest() {
        let (mut state, attacker, defender, location_id) = make_state();

        let report = CombatReport {
            narrative: "The siege is repelled".to_string(),
            attacker_casualties: 30,
            defender_casualties: 15,
            conquered: false,
            defense_damage: 25,
            unrest_delta: 10,
        };

        resolve_combat(&mut state, attacker, defender, location_id, &report);

        let location = state.map.location(location_id).unwrap();
        assert_eq!(location.faction_id, Some(defender));
        assert_eq!(location.defense, 25);
        assert_eq!(location.unrest, 40);
    }

    #[test]
    fn missing_entity_is_fog_of_war() {
        let (mut state, attacker, _, location_id) = make_state();
        let before = state.clone();

        let outcome = resolve_combat(
            &mut state,
            attacker,
            FactionId::new(),
            location_id,
            &CombatReport::inconclusive(),
        );

        assert_eq!(outcome, CombatOutcome::FogOfWar);
        assert_eq!(state, before);
    }

    #[test]
    fn inconclusive_fallback_changes_nothing() {
        let (mut state, attacker, defender, location_id) = make_state();
        let before = state.clone();

        let outcome = resolve_combat(
            &mut state,
            attacker,
            defender,
            location_id,
            &CombatReport::inconclusive(),
        );

        assert!(matches!(outcome, CombatOutcome::Resolved { conquered: false, .. }));
        assert_eq!(state, before);
    }
}
