//! The construction resolver: resource-gated building placement.
//!
//! Validation happens before any mutation, so every failure path leaves the
//! world untouched. Deduction is all-or-nothing: either the faction covers
//! the full cost in every resource, or nothing is spent.

use tracing::info;

use dominion_types::{
    Building, BuildingId, BuildingStatus, FactionId, LocationId, ResourcePool, WorldState,
};

use crate::error::ActionError;

/// Prosperity gained by a settlement when a building goes up.
const CONSTRUCTION_PROSPERITY_BONUS: i64 = 5;

/// The applied result of a successful construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructionOutcome {
    /// The new building's ID.
    pub building_id: BuildingId,
    /// Narrative log line for the event history.
    pub log: String,
}

/// Construct a building of `kind` at a location, paid for by `owner`.
///
/// On success the faction's resources drop by exactly `cost`, the building
/// is appended at level 1 with [`BuildingStatus::Active`], and the
/// location's prosperity rises by 5 (clamped at 100).
///
/// # Errors
///
/// - [`ActionError::LocationNotFound`] / [`ActionError::FactionNotFound`]
///   if either entity is missing.
/// - [`ActionError::InsufficientResources`] if any resource dimension falls
///   short. No partial deduction ever occurs.
pub fn build_structure(
    state: &mut WorldState,
    location_id: LocationId,
    kind: &str,
    owner: FactionId,
    cost: ResourcePool,
) -> Result<ConstructionOutcome, ActionError> {
    // Validate everything up front; mutate only once nothing can fail.
    if state.map.location(location_id).is_none() {
        return Err(ActionError::LocationNotFound { id: location_id });
    }

    let Some(faction) = state.faction(owner) else {
        return Err(ActionError::FactionNotFound { id: owner });
    };

    if !faction.resources.covers(&cost) {
        return Err(ActionError::InsufficientResources {
            needed: cost,
            available: faction.resources,
        });
    }

    let faction_name = faction.name.clone();

    if let Some(faction) = state.faction_mut(owner) {
        faction.resources.spend(&cost);
    }

    let building_id = BuildingId::new();
    let Some(location) = state.map.location_mut(location_id) else {
        // Unreachable: existence was checked above, nothing removed it since.
        return Err(ActionError::LocationNotFound { id: location_id });
    };

    location.buildings.push(Building {
        id: building_id,
        kind: kind.to_string(),
        level: 1,
        owner,
        status: BuildingStatus::Active,
    });
    location.adjust_prosperity(CONSTRUCTION_PROSPERITY_BONUS);

    let log = format!(
        "{faction_name} raised a {kind} in {name}",
        name = location.name
    );
    info!(location = %location_id, faction = %owner, kind, "building constructed");

    Ok(ConstructionOutcome { building_id, log })
}
