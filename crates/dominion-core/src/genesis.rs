//! World genesis: deterministic terrain plus oracle-supplied theme content.
//!
//! The terrain grid is a pure function of the world seed. Theme content --
//! factions, settlements, stewards, commodities, routes -- comes from the
//! generation oracle and is overlaid onto the grid: coordinates are clamped
//! into bounds and each settlement claims a free tile. Genesis is the
//! epoch 0 to 1 transition; the returned state is ready for its first turn.

use chrono::Utc;
use tracing::info;

use dominion_types::{EventId, EventLogEntry, WorldMap, WorldState, WorldTime};

use crate::config::WorldConfig;
use crate::oracle::{Oracle, OracleError, ThemeParams};

/// Errors that can occur during world genesis.
#[derive(Debug, thiserror::Error)]
pub enum GenesisError {
    /// The generation oracle failed.
    #[error("generation failed: {source}")]
    Oracle {
        /// The underlying oracle error.
        #[from]
        source: OracleError,
    },

    /// The configured grid is degenerate.
    #[error("invalid grid dimensions {width}x{height}")]
    InvalidDimensions {
        /// Configured width.
        width: u32,
        /// Configured height.
        height: u32,
    },
}

/// Generate a new world from configuration and the generation oracle.
///
/// # Errors
///
/// Returns [`GenesisError::InvalidDimensions`] for a zero-sized grid and
/// [`GenesisError::Oracle`] if the oracle cannot supply theme content.
pub fn generate(config: &WorldConfig, oracle: &mut dyn Oracle) -> Result<WorldState, GenesisError> {
    if config.width == 0 || config.height == 0 {
        return Err(GenesisError::InvalidDimensions {
            width: config.width,
            height: config.height,
        });
    }

    let tiles = dominion_world::generate_grid(config.seed, config.width, config.height);

    let theme = ThemeParams {
        theme: config.theme.clone(),
        width: config.width,
        height: config.height,
        factions: config.factions,
    };
    let generated = oracle.generate_world(config.seed, &theme)?;

    let mut map = WorldMap {
        width: config.width,
        height: config.height,
        tiles,
        locations: generated.locations,
        routes: generated.routes,
    };

    settle_locations(&mut map);

    let mut state = WorldState {
        name: generated.name,
        seed: config.seed,
        time: WorldTime::genesis(),
        map,
        factions: generated.factions,
        npcs: generated.npcs,
        economy: dominion_types::Economy {
            commodities: generated.commodities,
            market_events: Vec::new(),
        },
        event_log: Vec::new(),
        decision_traces: Vec::new(),
        world_diffs: Vec::new(),
        last_evolved_epoch: 0,
    };

    state.event_log.push(EventLogEntry {
        id: EventId::new(),
        epoch: state.time.epoch,
        day: state.time.day,
        text: format!("The world of {} awakens.", state.name),
        trace_id: None,
        created_at: Utc::now(),
    });

    info!(
        world = %state.name,
        seed = state.seed,
        factions = state.factions.len(),
        locations = state.map.locations.len(),
        commodities = state.economy.commodities.len(),
        "world generated"
    );

    Ok(state)
}

/// Clamp settlement coordinates into the grid and claim one free tile each.
///
/// If a settlement's preferred tile is taken, the search probes forward in
/// row-major order (wrapping) for the next unclaimed tile.
fn settle_locations(map: &mut WorldMap) {
    let width = map.width.max(1);
    let height = map.height.max(1);
    let tile_count = u64::from(width).saturating_mul(u64::from(height));

    let placements: Vec<(usize, u32, u32)> = map
        .locations
        .iter()
        .enumerate()
        .map(|(index, location)| {
            let x = location.x.checked_rem(width).unwrap_or(0);
            let y = location.y.checked_rem(height).unwrap_or(0);
            (index, x, y)
        })
        .collect();

    for (index, mut x, mut y) in placements {
        let mut probes: u64 = 0;
        while probes < tile_count {
            let occupied = map
                .tile_at(x, y)
                .is_some_and(|tile| tile.location_id.is_some());
            if !occupied {
                break;
            }
            // Advance in row-major order, wrapping at the grid edge.
            x = x.saturating_add(1);
            if x >= width {
                x = 0;
                y = y.saturating_add(1);
                if y >= height {
                    y = 0;
                }
            }
            probes = probes.saturating_add(1);
        }

        let (location_id, owner) = match map.locations.get_mut(index) {
            Some(location) => {
                location.x = x;
                location.y = y;
                (location.id, location.faction_id)
            }
            None => continue,
        };

        if let Some(tile) = map.tile_at_mut(x, y) {
            tile.location_id = Some(location_id);
            tile.owner = owner;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::oracle::StubOracle;

    use super::*;

    fn config() -> WorldConfig {
        WorldConfig {
            theme: "ashen".to_string(),
            seed: 42,
            width: 16,
            height: 16,
            factions: 3,
        }
    }

    #[test]
    fn genesis_starts_at_epoch_one() {
        let mut oracle = StubOracle::new();
        let state = generate(&config(), &mut oracle).unwrap();
        assert_eq!(state.time.epoch, 1);
        assert_eq!(state.time.day, 1);
    }

    #[test]
    fn genesis_populates_the_world() {
        let mut oracle = StubOracle::new();
        let state = generate(&config(), &mut oracle).unwrap();

        assert_eq!(state.factions.len(), 3);
        assert_eq!(state.npcs.len(), 3);
        assert!(!state.economy.commodities.is_empty());
        assert_eq!(state.map.tiles.len(), 256);
        assert_eq!(state.event_log.len(), 1);
    }

    #[test]
    fn settlements_claim_distinct_tiles() {
        let mut oracle = StubOracle::new();
        let state = generate(&config(), &mut oracle).unwrap();

        let claimed: Vec<_> = state
            .map
            .tiles
            .iter()
            .filter_map(|t| t.location_id)
            .collect();
        assert_eq!(claimed.len(), state.map.locations.len());

        let mut unique = claimed.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), claimed.len());
    }

    #[test]
    fn terrain_is_deterministic_per_seed() {
        let mut oracle = StubOracle::new();
        let a = generate(&config(), &mut oracle).unwrap();
        let b = generate(&config(), &mut oracle).unwrap();

        let terrains =
            |s: &dominion_types::WorldState| s.map.tiles.iter().map(|t| t.terrain).collect::<Vec<_>>();
        assert_eq!(terrains(&a), terrains(&b));
    }

    #[test]
    fn zero_grid_is_rejected() {
        let mut oracle = StubOracle::new();
        let mut bad = config();
        bad.width = 0;
        assert!(matches!(
            generate(&bad, &mut oracle),
            Err(GenesisError::InvalidDimensions { .. })
        ));
    }
}
