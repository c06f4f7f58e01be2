//! Non-player characters and their private memories.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::NpcRole;
use crate::faction::ResourcePool;
use crate::ids::{FactionId, LocationId, NpcId};

/// A prioritized objective an NPC is pursuing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    /// What the NPC wants, in plain words.
    pub text: String,
    /// Priority, higher is more urgent.
    pub priority: u8,
}

/// One remembered fact, owned exclusively by a single NPC.
///
/// Strength starts at 1.0 and decays multiplicatively each epoch; an item
/// whose strength falls to 0.1 or below is pruned and never resurfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryItem {
    /// Unique identifier.
    pub id: Uuid,
    /// The remembered fact.
    pub text: String,
    /// Topic tags used for retrieval.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Recall strength in `(0, 1]`.
    pub strength: Decimal,
    /// Epoch the memory was formed.
    pub created_epoch: u64,
    /// Epoch the memory was last reinforced.
    pub last_reinforced_epoch: u64,
}

/// An agent belonging to a faction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    /// Unique identifier.
    pub id: NpcId,
    /// Display name.
    pub name: String,
    /// Role; stewards may consult the oracle, commoners may not.
    pub role: NpcRole,
    /// Faction this NPC belongs to.
    pub faction_id: FactionId,
    /// Settlement the NPC currently resides in.
    pub location_id: LocationId,
    /// Objectives, most urgent first.
    #[serde(default)]
    pub goals: Vec<Goal>,
    /// Personal resource pool.
    #[serde(default)]
    pub resources: ResourcePool,
    /// Affinity toward other NPCs, clamped to `-100..=100`.
    #[serde(default)]
    pub relations: BTreeMap<NpcId, i32>,
    /// Private memories, newest first.
    #[serde(default)]
    pub memories: Vec<MemoryItem>,
}

impl Npc {
    /// Shift affinity toward another NPC, clamped to `-100..=100`.
    pub fn adjust_relation(&mut self, other: NpcId, delta: i32) {
        let current = self.relations.get(&other).copied().unwrap_or(0);
        self.relations
            .insert(other, current.saturating_add(delta).clamp(-100, 100));
    }

    /// The NPC's most urgent goal, if any.
    pub fn top_goal(&self) -> Option<&Goal> {
        self.goals.iter().max_by_key(|g| g.priority)
    }
}
