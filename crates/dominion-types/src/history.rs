//! Append-only audit history: narrative events, decision traces, diffs.
//!
//! History records are immutable once appended. A [`DecisionTrace`] is
//! assembled in full -- including any tool outputs -- before it is pushed;
//! nothing reaches back to patch a trace after the fact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{EventId, FactionId, NpcId, TraceId};

/// One entry in the narrative history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLogEntry {
    /// Unique identifier.
    pub id: EventId,
    /// Epoch during which the event occurred.
    pub epoch: u64,
    /// In-world day of the event.
    pub day: u64,
    /// Narrative text.
    pub text: String,
    /// The decision trace this event arose from, if any. When present it
    /// must reference an appended trace.
    #[serde(default)]
    pub trace_id: Option<TraceId>,
    /// Wall-clock timestamp of the append.
    pub created_at: DateTime<Utc>,
}

/// Audit record of one steward decision cycle: context in, action out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTrace {
    /// Unique identifier.
    pub id: TraceId,
    /// Epoch during which the decision was made.
    pub epoch: u64,
    /// The steward who decided.
    pub npc_id: NpcId,
    /// The steward's faction.
    pub faction_id: FactionId,
    /// Goal context presented to the oracle.
    pub goal_context: String,
    /// Memories retrieved for the consult, most relevant first.
    #[serde(default)]
    pub recalled_memories: Vec<String>,
    /// The action that was chosen, e.g. `"build"`, `"attack"`, `"wait"`.
    pub chosen_action: String,
    /// The oracle's stated reasoning (or a local note on failure).
    pub reasoning: String,
    /// Inputs supplied to a tool invocation, if one ran.
    #[serde(default)]
    pub tool_inputs: Option<serde_json::Value>,
    /// Outputs produced by a tool invocation, if one ran.
    #[serde(default)]
    pub tool_outputs: Option<serde_json::Value>,
    /// Wall-clock timestamp of the append.
    pub created_at: DateTime<Utc>,
}

/// A coarse, human-readable summary of what changed across one epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldDiffRecord {
    /// The epoch this diff describes (the epoch just committed).
    pub epoch: u64,
    /// Entities that appeared.
    #[serde(default)]
    pub added: Vec<String>,
    /// Entities that changed in a reportable way.
    #[serde(default)]
    pub updated: Vec<String>,
    /// Entities that disappeared.
    #[serde(default)]
    pub removed: Vec<String>,
}

impl WorldDiffRecord {
    /// Whether the diff reports no changes at all.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_diff_detected() {
        let diff = WorldDiffRecord {
            epoch: 4,
            added: Vec::new(),
            updated: Vec::new(),
            removed: Vec::new(),
        };
        assert!(diff.is_empty());
    }

    #[test]
    fn trace_roundtrips_with_tool_payloads() {
        let trace = DecisionTrace {
            id: TraceId::new(),
            epoch: 9,
            npc_id: NpcId::new(),
            faction_id: FactionId::new(),
            goal_context: "secure the granary".to_string(),
            recalled_memories: vec!["the granary roof leaks".to_string()],
            chosen_action: "use_tool".to_string(),
            reasoning: "the harvest is at risk".to_string(),
            tool_inputs: Some(serde_json::json!({ "target": "granary" })),
            tool_outputs: Some(serde_json::json!({ "repaired": true })),
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&trace).ok();
        let back: Option<DecisionTrace> =
            json.as_deref().and_then(|j| serde_json::from_str(j).ok());
        assert_eq!(back, Some(trace));
    }
}
