//! The shared tool archive: dynamically invented agent capabilities.
//!
//! Tools are global (not per-agent); usage is tracked per tool regardless of
//! which agent invoked it. Parameter shapes are a closed tagged union rather
//! than free-form structures, so inputs can be validated against a declared
//! schema before anything executes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::ToolId;

/// Smallest allowed cooldown, in days.
pub const COOLDOWN_MIN_DAYS: u8 = 1;

/// Largest allowed cooldown, in days.
pub const COOLDOWN_MAX_DAYS: u8 = 10;

/// The kind of value a tool parameter accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamKind {
    /// Free text.
    Text,
    /// A number (integer or decimal).
    Number,
    /// A boolean flag.
    Flag,
    /// One of a fixed set of options.
    Choice {
        /// The allowed option values.
        options: Vec<String>,
    },
}

/// One declared parameter of a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolParam {
    /// Parameter name, unique within the tool.
    pub name: String,
    /// Accepted value kind.
    pub kind: ParamKind,
    /// Whether the parameter must be supplied.
    pub required: bool,
}

/// A shared, cooldown-gated agent capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentTool {
    /// Unique identifier.
    pub id: ToolId,
    /// Tool name, unique case-insensitively across the archive.
    pub name: String,
    /// What the tool does.
    pub description: String,
    /// Guidance for the oracle on when and how to invoke it.
    pub action_guidance: String,
    /// Declared parameter schema.
    #[serde(default)]
    pub parameters: Vec<ToolParam>,
    /// Days that must elapse between uses, clamped to `1..=10`.
    pub cooldown_days: u8,
    /// Epoch the tool was invented.
    pub created_epoch: u64,
}

/// The persistent registry of tools plus per-tool usage bookkeeping.
///
/// This is the system's only cross-agent shared mutable store. Within a
/// single-threaded turn it is queried and updated once per tool-invocation
/// event; there is exactly one writer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ToolArchive {
    /// All registered tools, in registration order.
    #[serde(default)]
    pub tools: Vec<AgentTool>,
    /// Last-used epoch per tool.
    #[serde(default)]
    pub usage: BTreeMap<ToolId, u64>,
}

impl ToolArchive {
    /// Immutable tool lookup by ID.
    pub fn tool(&self, id: ToolId) -> Option<&AgentTool> {
        self.tools.iter().find(|t| t.id == id)
    }

    /// Case-insensitive tool lookup by name.
    pub fn tool_by_name(&self, name: &str) -> Option<&AgentTool> {
        self.tools
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the archive holds no tools.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_lookup_is_case_insensitive() {
        let archive = ToolArchive {
            tools: vec![AgentTool {
                id: ToolId::new(),
                name: "Ritual of Ashes".to_string(),
                description: "Calms unrest through ceremony.".to_string(),
                action_guidance: "Invoke when unrest climbs.".to_string(),
                parameters: Vec::new(),
                cooldown_days: 3,
                created_epoch: 1,
            }],
            usage: BTreeMap::new(),
        };

        assert!(archive.tool_by_name("ritual of ashes").is_some());
        assert!(archive.tool_by_name("RITUAL OF ASHES").is_some());
        assert!(archive.tool_by_name("rite of ashes").is_none());
    }
}
