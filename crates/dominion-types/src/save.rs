//! Save bundle and versioned schema migration.
//!
//! The full world state, audit logs, and tool archive serialize to one
//! self-describing JSON document. Loading runs [`migrate`], which fills
//! forward-compatible defaults for array fields absent in older saves,
//! repairs clampable numeric drift, and rejects structural corruption with
//! an explicit error instead of masking nulls deep inside business logic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::tools::{COOLDOWN_MAX_DAYS, COOLDOWN_MIN_DAYS, ToolArchive};
use crate::world::{GAUGE_MAX, WorldState, clamp_gauge};

/// The schema version this build writes.
pub const SCHEMA_VERSION: u32 = 1;

/// Recall strength at or below which a memory no longer exists.
const STRENGTH_FLOOR: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

/// Errors produced by save hydration.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// The document is structurally invalid and cannot be repaired.
    #[error("corrupt save: {reason}")]
    Corrupt {
        /// What exactly is wrong.
        reason: String,
    },

    /// The document was written by a newer build.
    #[error("unsupported schema version {found} (this build reads <= {supported})")]
    UnsupportedVersion {
        /// Version found in the document.
        found: u32,
        /// Newest version this build understands.
        supported: u32,
    },
}

/// Everything that must round-trip through persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveBundle {
    /// Schema version the document was written with. Documents predating
    /// the field hydrate as version 0 and are normalized during migration.
    #[serde(default)]
    pub schema_version: u32,
    /// The world itself, including audit logs.
    pub state: WorldState,
    /// The shared tool archive.
    #[serde(default)]
    pub archive: ToolArchive,
}

impl SaveBundle {
    /// Wrap a world and archive at the current schema version.
    pub const fn new(state: WorldState, archive: ToolArchive) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            state,
            archive,
        }
    }
}

/// Hydrate a save document, applying the versioned migration.
///
/// Absent array fields hydrate as empty (never null), clampable numeric
/// drift is repaired in place, and structural violations -- a dangling
/// decision-trace reference, a malformed tile grid, entity references to
/// nothing -- are rejected.
///
/// # Errors
///
/// Returns [`SaveError::UnsupportedVersion`] for documents written by newer
/// builds, and [`SaveError::Corrupt`] for anything unsalvageable.
pub fn migrate(document: serde_json::Value) -> Result<SaveBundle, SaveError> {
    let Some(root) = document.as_object() else {
        return Err(SaveError::Corrupt {
            reason: "root is not a JSON object".to_owned(),
        });
    };

    // Documents predating the version field are treated as version 1.
    let found_version = root
        .get("schema_version")
        .and_then(serde_json::Value::as_u64)
        .map_or(1, |v| u32::try_from(v).unwrap_or(u32::MAX));

    if found_version > SCHEMA_VERSION {
        return Err(SaveError::UnsupportedVersion {
            found: found_version,
            supported: SCHEMA_VERSION,
        });
    }

    let mut bundle: SaveBundle =
        serde_json::from_value(document).map_err(|err| SaveError::Corrupt {
            reason: format!("deserialization failed: {err}"),
        })?;
    bundle.schema_version = SCHEMA_VERSION;

    repair(&mut bundle);
    validate(&bundle)?;

    Ok(bundle)
}

/// Repair clampable drift: gauges beyond 100, cooldowns outside `1..=10`,
/// memory strengths outside `(0, 1]`.
fn repair(bundle: &mut SaveBundle) {
    for location in &mut bundle.state.map.locations {
        location.unrest = location.unrest.min(GAUGE_MAX);
        location.defense = location.defense.min(GAUGE_MAX);
        location.prosperity = location.prosperity.min(GAUGE_MAX);
    }

    for route in &mut bundle.state.map.routes {
        route.risk = clamp_gauge(i64::from(route.risk));
    }

    for tool in &mut bundle.archive.tools {
        tool.cooldown_days = tool.cooldown_days.clamp(COOLDOWN_MIN_DAYS, COOLDOWN_MAX_DAYS);
    }

    for npc in &mut bundle.state.npcs {
        npc.memories.retain(|m| m.strength > STRENGTH_FLOOR);
        for memory in &mut npc.memories {
            if memory.strength > Decimal::ONE {
                memory.strength = Decimal::ONE;
            }
        }
    }
}

/// Reject structural violations that cannot be repaired.
fn validate(bundle: &SaveBundle) -> Result<(), SaveError> {
    let state = &bundle.state;
    let map = &state.map;

    let expected_tiles = u64::from(map.width).saturating_mul(u64::from(map.height));
    if !map.tiles.is_empty() && map.tiles.len() as u64 != expected_tiles {
        return Err(SaveError::Corrupt {
            reason: format!(
                "tile grid has {} entries, expected {expected_tiles} for a {}x{} map",
                map.tiles.len(),
                map.width,
                map.height
            ),
        });
    }

    for entry in &state.event_log {
        if let Some(trace_id) = entry.trace_id
            && !state.has_trace(trace_id)
        {
            return Err(SaveError::Corrupt {
                reason: format!("event {} references missing decision trace {trace_id}", entry.id),
            });
        }
    }

    for npc in &state.npcs {
        if state.faction(npc.faction_id).is_none() {
            return Err(SaveError::Corrupt {
                reason: format!("npc {} references missing faction {}", npc.id, npc.faction_id),
            });
        }
        if map.location(npc.location_id).is_none() {
            return Err(SaveError::Corrupt {
                reason: format!("npc {} references missing location {}", npc.id, npc.location_id),
            });
        }
    }

    Ok(())
}
