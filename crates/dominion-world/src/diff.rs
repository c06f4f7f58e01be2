//! Epoch-to-epoch world diffing.
//!
//! Produces a coarse, human-readable summary of what changed between two
//! world snapshots. This is deliberately not a structural diff: it reports
//! only the handful of changes an observer cares about -- settlements
//! founded or lost, captures, construction, and notable price moves.

use rust_decimal::Decimal;

use dominion_types::{WorldDiffRecord, WorldState};

/// Price move above which a commodity change is reported.
const PRICE_REPORT_THRESHOLD: Decimal = Decimal::ONE;

/// Summarize the changes from `prev` to `curr` as the diff for `epoch`.
pub fn diff(prev: &WorldState, curr: &WorldState, epoch: u64) -> WorldDiffRecord {
    let mut record = WorldDiffRecord {
        epoch,
        added: Vec::new(),
        updated: Vec::new(),
        removed: Vec::new(),
    };

    diff_locations(prev, curr, &mut record);
    diff_commodities(prev, curr, &mut record);

    record
}

/// Report founded/lost settlements, captures, and construction.
fn diff_locations(prev: &WorldState, curr: &WorldState, record: &mut WorldDiffRecord) {
    for location in &curr.map.locations {
        let Some(before) = prev.map.location(location.id) else {
            record
                .added
                .push(format!("New settlement founded: {}", location.name));
            continue;
        };

        if before.faction_id != location.faction_id {
            let line = match location.faction_id.and_then(|id| curr.faction(id)) {
                Some(faction) => {
                    format!("{} captured by {}", location.name, faction.name)
                }
                None => format!("{} fell into anarchy", location.name),
            };
            record.updated.push(line);
        }

        if before.building_count() != location.building_count() {
            if location.building_count() > before.building_count() {
                record
                    .updated
                    .push(format!("New building in {}", location.name));
            } else {
                record
                    .updated
                    .push(format!("Building lost in {}", location.name));
            }
        }
    }

    for location in &prev.map.locations {
        if curr.map.location(location.id).is_none() {
            record
                .removed
                .push(format!("{} was lost to the world", location.name));
        }
    }
}

/// Report commodity prices that moved more than one unit.
fn diff_commodities(prev: &WorldState, curr: &WorldState, record: &mut WorldDiffRecord) {
    for commodity in &curr.economy.commodities {
        let Some(before) = prev.economy.commodity(&commodity.name) else {
            continue;
        };
        let delta = (commodity.current_price - before.current_price).abs();
        if delta > PRICE_REPORT_THRESHOLD {
            record.updated.push(format!(
                "{} price changed from {} to {}",
                commodity.name, before.current_price, commodity.current_price
            ));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dominion_types::{
        BuildingId, BuildingStatus, Commodity, Economy, Faction, FactionId, Location, LocationId,
        ResourcePool, WorldMap, WorldState, WorldTime,
    };
    use std::collections::BTreeMap;

    use super::*;

    fn base_state() -> WorldState {
        WorldState {
            name: "Test".to_string(),
            seed: 1,
            time: WorldTime::genesis(),
            map: WorldMap {
                width: 0,
                height: 0,
                tiles: Vec::new(),
                locations: Vec::new(),
                routes: Vec::new(),
            },
            factions: Vec::new(),
            npcs: Vec::new(),
            economy: Economy::default(),
            event_log: Vec::new(),
            decision_traces: Vec::new(),
            world_diffs: Vec::new(),
            last_evolved_epoch: 0,
        }
    }

    fn faction(name: &str) -> Faction {
        Faction {
            id: FactionId::new(),
            name: name.to_string(),
            archetype: "league".to_string(),
            resources: ResourcePool::default(),
            troops: 10,
            troop_quality: Decimal::ONE,
            relations: BTreeMap::new(),
            laws: Vec::new(),
        }
    }

    fn location(name: &str, owner: Option<FactionId>) -> Location {
        Location {
            id: LocationId::new(),
            name: name.to_string(),
            x: 0,
            y: 0,
            faction_id: owner,
            population: 100,
            defense: 50,
            unrest: 10,
            prosperity: 50,
            buildings: Vec::new(),
        }
    }

    #[test]
    fn reports_capture_construction_and_price_move() {
        let f1 = faction("Gilded Court");
        let f2 = faction("Ashen Compact");
        let mut loc = location("Thornwick", Some(f1.id));

        let mut prev = base_state();
        prev.factions = vec![f1.clone(), f2.clone()];
        prev.map.locations = vec![loc.clone()];
        prev.economy.commodities = vec![Commodity {
            name: "salt".to_string(),
            base_price: Decimal::from(10),
            current_price: Decimal::new(100, 1), // 10.0
            supply: 100,
            demand: 100,
            volatility: Decimal::ZERO,
        }];

        // Epoch passes: Thornwick is captured and gains a building, salt
        // price jumps by 2.5.
        loc.faction_id = Some(f2.id);
        loc.buildings.push(dominion_types::Building {
            id: BuildingId::new(),
            kind: "barracks".to_string(),
            level: 1,
            owner: f2.id,
            status: BuildingStatus::Active,
        });

        let mut curr = base_state();
        curr.factions = vec![f1, f2];
        curr.map.locations = vec![loc];
        curr.economy.commodities = vec![Commodity {
            name: "salt".to_string(),
            base_price: Decimal::from(10),
            current_price: Decimal::new(125, 1), // 12.5
            supply: 100,
            demand: 100,
            volatility: Decimal::ZERO,
        }];

        let record = diff(&prev, &curr, 2);

        assert!(record.added.is_empty());
        assert!(record.removed.is_empty());
        assert!(
            record
                .updated
                .iter()
                .any(|l| l == "Thornwick captured by Ashen Compact"),
            "missing capture line: {:?}",
            record.updated
        );
        assert!(
            record.updated.iter().any(|l| l == "New building in Thornwick"),
            "missing construction line: {:?}",
            record.updated
        );
        assert!(
            record
                .updated
                .iter()
                .any(|l| l == "salt price changed from 10.0 to 12.5"),
            "missing price line: {:?}",
            record.updated
        );
    }

    #[test]
    fn new_location_is_added() {
        let prev = base_state();
        let mut curr = base_state();
        curr.map.locations = vec![location("Felsgard", None)];

        let record = diff(&prev, &curr, 2);
        assert_eq!(record.added, vec!["New settlement founded: Felsgard"]);
    }

    #[test]
    fn missing_location_is_removed() {
        let mut prev = base_state();
        prev.map.locations = vec![location("Felsgard", None)];
        let curr = base_state();

        let record = diff(&prev, &curr, 2);
        assert_eq!(record.removed, vec!["Felsgard was lost to the world"]);
    }

    #[test]
    fn small_price_moves_are_not_reported() {
        let mut prev = base_state();
        prev.economy.commodities = vec![Commodity {
            name: "salt".to_string(),
            base_price: Decimal::from(10),
            current_price: Decimal::from(10),
            supply: 100,
            demand: 100,
            volatility: Decimal::ZERO,
        }];
        let mut curr = prev.clone();
        curr.economy.commodities[0].current_price = Decimal::new(109, 1); // 10.9

        let record = diff(&prev, &curr, 2);
        assert!(record.is_empty());
    }

    #[test]
    fn identical_states_produce_empty_diff() {
        let state = base_state();
        let record = diff(&state, &state, 2);
        assert!(record.is_empty());
    }
}
