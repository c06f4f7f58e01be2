//! The per-NPC memory subsystem: decay, formation, and ranked recall.
//!
//! Memories are owned exclusively by their NPC and never shared. Each
//! epoch, every memory's strength is multiplied by a configured decay
//! factor; items whose strength falls to the floor (0.1) or below are
//! pruned and never resurface.
//!
//! Recall is an approximate relevance heuristic, not semantic search: a
//! memory scores its current strength plus 0.5 for every query token that
//! appears as a case-insensitive substring of its text. The sort is stable,
//! so equal scores keep their newest-first order and the whole operation is
//! reproducible byte-for-byte.

use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use dominion_types::{MemoryItem, Npc};

/// Strength at or below which a memory is pruned.
pub const STRENGTH_FLOOR: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

/// Score contribution of one matched query token.
const TOKEN_WEIGHT: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Apply one epoch of decay to every memory of every NPC.
///
/// Each strength is multiplied by `multiplier` (a constant in `(0, 1)`,
/// typically 0.9), then items at or below the floor are dropped. Pure and
/// total: this never fails.
pub fn decay_all(npcs: &mut [Npc], multiplier: Decimal) {
    for npc in npcs {
        let before = npc.memories.len();
        for memory in &mut npc.memories {
            memory.strength = (memory.strength * multiplier).normalize();
        }
        npc.memories.retain(|m| m.strength > STRENGTH_FLOOR);

        let pruned = before.saturating_sub(npc.memories.len());
        if pruned > 0 {
            debug!(npc = %npc.id, pruned, remaining = npc.memories.len(), "memories faded");
        }
    }
}

/// Form a new memory at full strength.
///
/// The memory list is newest-first, so the fresh item is prepended.
/// Returns the new memory's ID.
pub fn remember(npc: &mut Npc, text: &str, epoch: u64, tags: Vec<String>) -> Uuid {
    let id = Uuid::now_v7();
    npc.memories.insert(
        0,
        MemoryItem {
            id,
            text: text.to_string(),
            tags,
            strength: Decimal::ONE,
            created_epoch: epoch,
            last_reinforced_epoch: epoch,
        },
    );
    id
}

/// Reinforce an existing memory back to full strength.
///
/// Returns `false` if the memory has already been pruned.
pub fn reinforce(npc: &mut Npc, memory_id: Uuid, epoch: u64) -> bool {
    let Some(memory) = npc.memories.iter_mut().find(|m| m.id == memory_id) else {
        return false;
    };
    memory.strength = Decimal::ONE;
    memory.last_reinforced_epoch = epoch;
    true
}

/// Retrieve the `limit` most relevant memories for a query.
///
/// Scoring: `strength + 0.5 x (query tokens found as substrings of the
/// text)`. Tokens are whitespace-separated and matched case-insensitively.
/// Ties keep their original (newest-first) order.
pub fn recall<'a>(npc: &'a Npc, query: &str, limit: usize) -> Vec<&'a MemoryItem> {
    let tokens: Vec<String> = query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();

    let mut scored: Vec<(Decimal, &MemoryItem)> = npc
        .memories
        .iter()
        .map(|memory| {
            let haystack = memory.text.to_lowercase();
            let matches = tokens
                .iter()
                .filter(|token| haystack.contains(token.as_str()))
                .count();
            let score = memory.strength
                + TOKEN_WEIGHT * Decimal::from(u64::try_from(matches).unwrap_or(u64::MAX));
            (score, memory)
        })
        .collect();

    // Stable: equal scores keep list order, which keeps recall deterministic.
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    scored
        .into_iter()
        .take(limit)
        .map(|(_, memory)| memory)
        .collect()
}
