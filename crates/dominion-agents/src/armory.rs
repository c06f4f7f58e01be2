//! Tool archive operations: registration, cooldowns, and input validation.
//!
//! The archive is the system's only cross-agent shared mutable store.
//! Registration validates definitions at the boundary and rejects
//! duplicates by case-insensitive name; malformed definitions never reach
//! the archive. Usage is rate-limited per tool with a per-epoch cooldown,
//! tracked independently of which agent invoked the tool.

use serde_json::Value;
use tracing::{debug, info};

use dominion_types::{
    AgentTool, COOLDOWN_MAX_DAYS, COOLDOWN_MIN_DAYS, ParamKind, ToolArchive, ToolId,
};

use crate::error::ActionError;

/// Register a tool, normalizing its cooldown into `1..=10` days.
///
/// # Errors
///
/// Returns [`ActionError::Validation`] -- leaving the archive unchanged --
/// when the definition is malformed or a tool with the same name (compared
/// case-insensitively) already exists.
pub fn add_tool(archive: &mut ToolArchive, mut tool: AgentTool) -> Result<ToolId, ActionError> {
    validate_tool(&tool)?;

    if archive.tool_by_name(&tool.name).is_some() {
        return Err(ActionError::Validation {
            reason: format!("a tool named \"{}\" already exists", tool.name),
        });
    }

    tool.cooldown_days = tool.cooldown_days.clamp(COOLDOWN_MIN_DAYS, COOLDOWN_MAX_DAYS);
    let id = tool.id;
    info!(tool = %id, name = %tool.name, cooldown_days = tool.cooldown_days, "tool registered");
    archive.tools.push(tool);
    Ok(id)
}

/// Whether a tool exists and is off cooldown at `current_epoch`.
///
/// A tool that has never been used is always ready.
pub fn can_use(archive: &ToolArchive, tool_id: ToolId, current_epoch: u64) -> bool {
    let Some(tool) = archive.tool(tool_id) else {
        return false;
    };
    match archive.usage.get(&tool_id) {
        None => true,
        Some(&last_used) => {
            current_epoch.saturating_sub(last_used) >= u64::from(tool.cooldown_days)
        }
    }
}

/// First epoch at which the tool will be ready again, if it exists.
pub fn ready_at(archive: &ToolArchive, tool_id: ToolId) -> Option<u64> {
    let tool = archive.tool(tool_id)?;
    match archive.usage.get(&tool_id) {
        None => Some(0),
        Some(&last_used) => Some(last_used.saturating_add(u64::from(tool.cooldown_days))),
    }
}

/// Record a use of the tool at `epoch`. Idempotent overwrite.
pub fn mark_used(archive: &mut ToolArchive, tool_id: ToolId, epoch: u64) {
    debug!(tool = %tool_id, epoch, "tool used");
    archive.usage.insert(tool_id, epoch);
}

/// Render the tool catalog for an oracle consult.
///
/// One line per tool: name, readiness, guidance, and the parameter
/// signature.
pub fn describe(archive: &ToolArchive, current_epoch: u64) -> String {
    archive
        .tools
        .iter()
        .map(|tool| {
            let readiness = if can_use(archive, tool.id, current_epoch) {
                "ready".to_string()
            } else {
                let ready = ready_at(archive, tool.id).unwrap_or(0);
                format!("on cooldown until epoch {ready}")
            };
            let params = tool
                .parameters
                .iter()
                .map(describe_param)
                .collect::<Vec<_>>()
                .join(", ");
            if params.is_empty() {
                format!("- {} ({readiness}): {}", tool.name, tool.action_guidance)
            } else {
                format!(
                    "- {} ({readiness}): {} [{params}]",
                    tool.name, tool.action_guidance
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render one parameter as `name:kind` with a `?` suffix when optional.
fn describe_param(param: &dominion_types::ToolParam) -> String {
    let kind = match &param.kind {
        ParamKind::Text => "text".to_string(),
        ParamKind::Number => "number".to_string(),
        ParamKind::Flag => "flag".to_string(),
        ParamKind::Choice { options } => format!("one of {}", options.join("|")),
    };
    if param.required {
        format!("{}:{kind}", param.name)
    } else {
        format!("{}?:{kind}", param.name)
    }
}

/// Validate supplied inputs against a tool's declared parameter schema.
///
/// # Errors
///
/// Returns [`ActionError::Validation`] when inputs are not an object, a
/// required parameter is missing, an unknown key is supplied, or a value
/// does not match its declared kind.
pub fn validate_inputs(tool: &AgentTool, inputs: &Value) -> Result<(), ActionError> {
    let Some(map) = inputs.as_object() else {
        return Err(ActionError::Validation {
            reason: "tool inputs must be a JSON object".to_owned(),
        });
    };

    for param in &tool.parameters {
        match map.get(&param.name) {
            None if param.required => {
                return Err(ActionError::Validation {
                    reason: format!("missing required parameter \"{}\"", param.name),
                });
            }
            None => {}
            Some(value) => check_kind(&param.name, &param.kind, value)?,
        }
    }

    for key in map.keys() {
        if !tool.parameters.iter().any(|p| &p.name == key) {
            return Err(ActionError::Validation {
                reason: format!("unknown parameter \"{key}\""),
            });
        }
    }

    Ok(())
}

/// Check one supplied value against its declared kind.
fn check_kind(name: &str, kind: &ParamKind, value: &Value) -> Result<(), ActionError> {
    let ok = match kind {
        ParamKind::Text => value.is_string(),
        ParamKind::Number => value.is_number(),
        ParamKind::Flag => value.is_boolean(),
        ParamKind::Choice { options } => value
            .as_str()
            .is_some_and(|s| options.iter().any(|o| o == s)),
    };
    if ok {
        Ok(())
    } else {
        Err(ActionError::Validation {
            reason: format!("parameter \"{name}\" does not match its declared kind"),
        })
    }
}

/// Validate a tool definition at the registration boundary.
fn validate_tool(tool: &AgentTool) -> Result<(), ActionError> {
    if tool.name.trim().is_empty() {
        return Err(ActionError::Validation {
            reason: "tool name is empty".to_owned(),
        });
    }
    if tool.description.trim().is_empty() {
        return Err(ActionError::Validation {
            reason: "tool description is empty".to_owned(),
        });
    }
    if tool.action_guidance.trim().is_empty() {
        return Err(ActionError::Validation {
            reason: "tool action guidance is empty".to_owned(),
        });
    }

    for (index, param) in tool.parameters.iter().enumerate() {
        if param.name.trim().is_empty() {
            return Err(ActionError::Validation {
                reason: format!("parameter {index} has an empty name"),
            });
        }
        if tool
            .parameters
            .iter()
            .filter(|p| p.name == param.name)
            .count()
            > 1
        {
            return Err(ActionError::Validation {
                reason: format!("duplicate parameter name \"{}\"", param.name),
            });
        }
        if let ParamKind::Choice { options } = &param.kind
            && options.is_empty()
        {
            return Err(ActionError::Validation {
                reason: format!("choice parameter \"{}\" has no options", param.name),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use dominion_types::ToolParam;

    use super::*;

    fn make_tool(name: &str, cooldown_days: u8) -> AgentTool {
        AgentTool {
            id: ToolId::new(),
            name: name.to_string(),
            description: "A shared capability.".to_string(),
            action_guidance: "Invoke when appropriate.".to_string(),
            parameters: Vec::new(),
            cooldown_days,
            created_epoch: 1,
        }
    }

    #[test]
    fn cooldown_window_is_exact() {
        let mut archive = ToolArchive::default();
        let id = add_tool(&mut archive, make_tool("Ritual", 3)).unwrap();

        mark_used(&mut archive, id, 10);
        assert!(!can_use(&archive, id, 10));
        assert!(!can_use(&archive, id, 11));
        assert!(!can_use(&archive, id, 12));
        assert!(can_use(&archive, id, 13));
    }

    #[test]
    fn never_used_tool_is_ready() {
        let mut archive = ToolArchive::default();
        let id = add_tool(&mut archive, make_tool("Ritual", 5)).unwrap();
        assert!(can_use(&archive, id, 1));
    }

    #[test]
    fn unknown_tool_is_never_usable() {
        let archive = ToolArchive::default();
        assert!(!can_use(&archive, ToolId::new(), 1));
    }

    #[test]
    fn duplicate_names_differ_only_by_case() {
        let mut archive = ToolArchive::default();
        add_tool(&mut archive, make_tool("Ritual", 3)).unwrap();

        let err = add_tool(&mut archive, make_tool("ritual", 3));
        assert!(matches!(err, Err(ActionError::Validation { .. })));
        assert_eq!(archive.len(), 1);
    }

    #[test]
    fn cooldown_is_clamped_into_range() {
        let mut archive = ToolArchive::default();
        let low = add_tool(&mut archive, make_tool("Whisper", 0)).unwrap();
        let high = add_tool(&mut archive, make_tool("Decree", 200)).unwrap();

        assert_eq!(archive.tool(low).unwrap().cooldown_days, 1);
        assert_eq!(archive.tool(high).unwrap().cooldown_days, 10);
    }

    #[test]
    fn malformed_definitions_are_rejected() {
        let mut archive = ToolArchive::default();

        let mut unnamed = make_tool("", 3);
        unnamed.name = "  ".to_string();
        assert!(add_tool(&mut archive, unnamed).is_err());

        let mut blank_guidance = make_tool("Edict", 3);
        blank_guidance.action_guidance = String::new();
        assert!(add_tool(&mut archive, blank_guidance).is_err());

        let mut empty_choice = make_tool("Census", 3);
        empty_choice.parameters.push(ToolParam {
            name: "district".to_string(),
            kind: ParamKind::Choice { options: Vec::new() },
            required: true,
        });
        assert!(add_tool(&mut archive, empty_choice).is_err());

        assert!(archive.is_empty());
    }

    #[test]
    fn mark_used_overwrites_idempotently() {
        let mut archive = ToolArchive::default();
        let id = add_tool(&mut archive, make_tool("Ritual", 2)).unwrap();

        mark_used(&mut archive, id, 5);
        mark_used(&mut archive, id, 8);
        assert_eq!(archive.usage.get(&id).copied(), Some(8));
        assert!(!can_use(&archive, id, 9));
        assert!(can_use(&archive, id, 10));
    }

    #[test]
    fn describe_reports_readiness() {
        let mut archive = ToolArchive::default();
        let id = add_tool(&mut archive, make_tool("Ritual", 3)).unwrap();
        mark_used(&mut archive, id, 10);

        let catalog = describe(&archive, 11);
        assert!(catalog.contains("Ritual"));
        assert!(catalog.contains("on cooldown until epoch 13"));

        let catalog = describe(&archive, 13);
        assert!(catalog.contains("(ready)"));
    }

    #[test]
    fn input_validation_covers_every_kind() {
        let mut tool = make_tool("Census", 3);
        tool.parameters = vec![
            ToolParam {
                name: "district".to_string(),
                kind: ParamKind::Text,
                required: true,
            },
            ToolParam {
                name: "head_count".to_string(),
                kind: ParamKind::Number,
                required: true,
            },
            ToolParam {
                name: "thorough".to_string(),
                kind: ParamKind::Flag,
                required: false,
            },
            ToolParam {
                name: "season".to_string(),
                kind: ParamKind::Choice {
                    options: vec!["spring".to_string(), "autumn".to_string()],
                },
                required: false,
            },
        ];

        let valid = json!({
            "district": "riverside",
            "head_count": 412,
            "thorough": true,
            "season": "autumn"
        });
        assert!(validate_inputs(&tool, &valid).is_ok());

        let missing = json!({ "head_count": 412 });
        assert!(validate_inputs(&tool, &missing).is_err());

        let wrong_kind = json!({ "district": "riverside", "head_count": "many" });
        assert!(validate_inputs(&tool, &wrong_kind).is_err());

        let bad_choice = json!({
            "district": "riverside",
            "head_count": 412,
            "season": "winter"
        });
        assert!(validate_inputs(&tool, &bad_choice).is_err());

        let unknown = json!({
            "district": "riverside",
            "head_count": 412,
            "surprise": 1
        });
        assert!(validate_inputs(&tool, &unknown).is_err());

        let not_object = json!([1, 2, 3]);
        assert!(validate_inputs(&tool, &not_object).is_err());
    }
}
