//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every entity in the simulation has a strongly-typed ID to prevent
//! accidental mixing of identifiers at compile time. All IDs use UUID v7
//! (time-ordered) so that freshly minted entities sort in creation order,
//! which keeps log output and save files stable to read.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a faction.
    FactionId
}

define_id! {
    /// Unique identifier for a location (settlement on the map).
    LocationId
}

define_id! {
    /// Unique identifier for a non-player character.
    NpcId
}

define_id! {
    /// Unique identifier for a building placed at a location.
    BuildingId
}

define_id! {
    /// Unique identifier for a trade route between two locations.
    RouteId
}

define_id! {
    /// Unique identifier for a shared agent tool in the archive.
    ToolId
}

define_id! {
    /// Unique identifier for a decision trace (audit record).
    TraceId
}

define_id! {
    /// Unique identifier for an event log entry.
    EventId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let faction = FactionId::new();
        let location = LocationId::new();
        // These are different types -- the compiler enforces no mixing.
        assert_ne!(faction.into_inner(), Uuid::nil());
        assert_ne!(location.into_inner(), Uuid::nil());
    }

    #[test]
    fn id_roundtrip_serde() {
        let original = NpcId::new();
        let json = serde_json::to_string(&original).ok();
        assert!(json.is_some());
        let restored: Result<NpcId, _> =
            serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(restored.ok(), Some(original));
    }

    #[test]
    fn id_display_matches_uuid() {
        let id = ToolId::new();
        assert_eq!(id.to_string(), id.into_inner().to_string());
    }
}
