//! The turn orchestrator: one epoch transition, start to commit.
//!
//! A turn is a single linear pass with no branching back:
//!
//! 1. **Snapshot** -- deep-copy the state for end-of-turn diffing.
//! 2. **Decay** -- age every NPC's memories.
//! 3. **Economy** -- run the commodity pricing tick.
//! 4. **Steward loop** -- consult the oracle for a bounded, deterministic
//!    subset of steward NPCs, one at a time. Every consult appends a full
//!    [`DecisionTrace`] (assembled, tool outputs included, before the
//!    append) and dispatches at most one action to the construction,
//!    combat, or tool subsystems. A failing consult degrades that steward
//!    to a forced wait; it never aborts the turn.
//! 5. **Summary** -- compress the epoch's action logs into one history
//!    line, via the oracle or a deterministic local fallback.
//! 6. **World event** -- optionally append one ambient narrative.
//! 7. **Tool evolution** -- at most once per epoch, let the oracle invent
//!    a new shared tool (guarded by `last_evolved_epoch`).
//! 8. **Advance** -- epoch and day both move forward by exactly 1.
//! 9. **Diff and commit** -- append the change summary against the
//!    snapshot.
//!
//! The orchestrator takes `&mut WorldState`, so the borrow checker is the
//! one-turn-at-a-time gate: two advances cannot overlap. Embedders sharing
//! an engine across threads must serialize turns behind a mutex.

use std::thread;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use dominion_agents::{
    CombatOutcome, CombatReport, armory, combat, construction, memory,
};
use dominion_types::{
    AgentTool, DecisionTrace, EventId, EventLogEntry, NpcId, NpcRole, ToolArchive, ToolId,
    TraceId, WorldState,
};
use dominion_world::{diff, simulate_economy};
use rust_decimal::Decimal;

use crate::config::SimulationConfig;
use crate::oracle::{
    CombatContext, Decision, DecisionContext, FactionBrief, LocationBrief, Oracle,
    PlannedAction, ToolEffect,
};

/// Most sub-effects a single tool execution may apply.
const MAX_TOOL_EFFECTS: usize = 3;

/// Errors that can abort a turn before it starts.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    /// The epoch counter cannot advance further.
    #[error("epoch counter overflow")]
    EpochOverflow,
}

/// Pacing and subsystem constants for a turn.
#[derive(Debug, Clone)]
pub struct TurnOptions {
    /// Per-epoch multiplicative memory decay factor.
    pub memory_decay: Decimal,
    /// How many memories a steward recalls per consult.
    pub recall_limit: usize,
    /// Upper bound on stewards consulted per epoch.
    pub max_stewards: usize,
    /// Delay inserted between consecutive oracle consults.
    pub throttle: Duration,
}

impl TurnOptions {
    /// Derive turn options from the simulation config section.
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            memory_decay: config.memory_decay,
            recall_limit: config.recall_limit,
            max_stewards: config.max_stewards,
            throttle: Duration::from_millis(config.oracle_throttle_ms),
        }
    }
}

impl Default for TurnOptions {
    fn default() -> Self {
        Self::from_config(&SimulationConfig::default())
    }
}

/// What one committed turn did.
#[derive(Debug, Clone)]
pub struct TurnSummary {
    /// The epoch the world is now at.
    pub epoch: u64,
    /// Stewards that were consulted.
    pub stewards_consulted: usize,
    /// Action log lines produced by steward actions.
    pub actions_logged: usize,
    /// Event-log entries appended during the turn.
    pub events_appended: usize,
}

/// Advance the world by exactly one epoch.
///
/// Once started, a turn always completes: every oracle failure is recovered
/// at its call site and degrades to a no-op for that step only. The only
/// error is epoch-counter overflow, detected before anything mutates.
///
/// # Errors
///
/// Returns [`TurnError::EpochOverflow`] if the epoch counter is exhausted.
pub fn advance_epoch<R: Rng + ?Sized>(
    state: &mut WorldState,
    archive: &mut ToolArchive,
    oracle: &mut dyn Oracle,
    options: &TurnOptions,
    rng: &mut R,
) -> Result<TurnSummary, TurnError> {
    let next_time = state.time.advanced().ok_or(TurnError::EpochOverflow)?;
    let epoch = state.time.epoch;
    let events_before = state.event_log.len();

    info!(epoch, world = %state.name, "turn started");

    // --- 1. Snapshot ---
    let snapshot = state.clone();

    // --- 2. Memory decay ---
    memory::decay_all(&mut state.npcs, options.memory_decay);

    // --- 3. Economy tick ---
    simulate_economy(state, rng);

    // --- 4. Steward loop ---
    let (stewards_consulted, action_logs) =
        run_steward_loop(state, archive, oracle, options);

    // --- 5. History summary ---
    if !action_logs.is_empty() {
        let text = oracle
            .summarize_epoch(epoch, &action_logs)
            .unwrap_or_else(|err| {
                warn!(epoch, %err, "summary oracle failed, composing locally");
                format!("Epoch {epoch}: {}", action_logs.join("; "))
            });
        let trace_id = state.decision_traces.last().map(|t| t.id);
        push_event(state, text, trace_id);
    }

    // --- 6. Ambient world event ---
    match oracle.world_event(epoch) {
        Ok(Some(text)) => push_event(state, text, None),
        Ok(None) => {}
        Err(err) => warn!(epoch, %err, "world-event oracle failed, skipping"),
    }

    // --- 7. Tool evolution (at most once per epoch) ---
    evolve_tool_once(state, archive, oracle, epoch);

    // A turn always leaves a mark in the chronicle, even a quiet one.
    if state.event_log.len() == events_before {
        let quiet = format!("Day {} passes quietly in {}.", state.time.day, state.name);
        push_event(state, quiet, None);
    }

    // --- 8. Advance time ---
    state.time = next_time;

    // --- 9. Diff and commit ---
    let record = diff(&snapshot, state, state.time.epoch);
    state.world_diffs.push(record);

    let summary = TurnSummary {
        epoch: state.time.epoch,
        stewards_consulted,
        actions_logged: action_logs.len(),
        events_appended: state.event_log.len().saturating_sub(events_before),
    };

    info!(
        epoch = summary.epoch,
        stewards = summary.stewards_consulted,
        actions = summary.actions_logged,
        events = summary.events_appended,
        "turn committed"
    );

    Ok(summary)
}

/// Consult the oracle for each steward and dispatch their actions.
///
/// Returns how many stewards were consulted and the collected action logs.
fn run_steward_loop(
    state: &mut WorldState,
    archive: &mut ToolArchive,
    oracle: &mut dyn Oracle,
    options: &TurnOptions,
) -> (usize, Vec<String>) {
    let epoch = state.time.epoch;

    // Deterministic selection: the first N stewards in NPC order.
    let steward_ids: Vec<NpcId> = state
        .npcs
        .iter()
        .filter(|n| n.role == NpcRole::Steward)
        .map(|n| n.id)
        .take(options.max_stewards)
        .collect();

    let mut action_logs: Vec<String> = Vec::new();

    for (index, npc_id) in steward_ids.iter().copied().enumerate() {
        // Externally imposed rate limits: pace consecutive consults.
        if index > 0 && !options.throttle.is_zero() {
            thread::sleep(options.throttle);
        }

        let Some((ctx, recalled_ids)) = build_context(state, archive, npc_id, options) else {
            continue;
        };

        // Feeding a memory back to the oracle reinforces it.
        if let Some(npc) = state.npc_mut(npc_id) {
            for memory_id in &recalled_ids {
                memory::reinforce(npc, *memory_id, epoch);
            }
        }

        let (chosen_action, reasoning, tool_inputs, tool_outputs) = match oracle.decide(&ctx) {
            Ok(decision) => {
                dispatch(state, archive, oracle, &ctx, decision, &mut action_logs)
            }
            Err(err) => {
                // One steward's failure never aborts the turn; the attempt
                // is still recorded in the audit trail.
                warn!(epoch, npc = %npc_id, %err, "consult failed, steward waits");
                (
                    "wait".to_string(),
                    format!("Consult failed; the steward holds position ({err})"),
                    None,
                    None,
                )
            }
        };

        // The trace is assembled in full -- outputs included -- before the
        // append. Traces are immutable once logged.
        state.decision_traces.push(DecisionTrace {
            id: TraceId::new(),
            epoch,
            npc_id,
            faction_id: ctx.faction_id,
            goal_context: ctx.goal_context.clone(),
            recalled_memories: ctx.recalled_memories.clone(),
            chosen_action,
            reasoning,
            tool_inputs,
            tool_outputs,
            created_at: Utc::now(),
        });
    }

    (steward_ids.len(), action_logs)
}

/// Assemble the decision context for one steward.
///
/// Returns `None` if the steward or their faction has vanished.
fn build_context(
    state: &WorldState,
    archive: &ToolArchive,
    npc_id: NpcId,
    options: &TurnOptions,
) -> Option<(DecisionContext, Vec<Uuid>)> {
    let npc = state.npc(npc_id)?;
    let faction = state.faction(npc.faction_id)?;

    let mut goals = npc.goals.clone();
    goals.sort_by(|a, b| b.priority.cmp(&a.priority));
    let goal_context = goals
        .iter()
        .map(|g| g.text.clone())
        .collect::<Vec<_>>()
        .join("; ");

    let recalled = memory::recall(npc, &goal_context, options.recall_limit);
    let recalled_ids: Vec<Uuid> = recalled.iter().map(|m| m.id).collect();
    let recalled_memories: Vec<String> = recalled.iter().map(|m| m.text.clone()).collect();

    let rivals = state
        .factions
        .iter()
        .filter(|f| f.id != faction.id)
        .map(|f| FactionBrief {
            id: f.id,
            name: f.name.clone(),
            troops: f.troops,
            stance: faction.stance_toward(f.id),
        })
        .collect();

    let settlements = state
        .map
        .locations
        .iter()
        .map(|l| LocationBrief {
            id: l.id,
            name: l.name.clone(),
            faction_id: l.faction_id,
            unrest: l.unrest,
            defense: l.defense,
        })
        .collect();

    let ctx = DecisionContext {
        epoch: state.time.epoch,
        npc_id,
        npc_name: npc.name.clone(),
        faction_id: faction.id,
        faction_name: faction.name.clone(),
        resources: faction.resources,
        troops: faction.troops,
        location_id: npc.location_id,
        goals,
        goal_context,
        recalled_memories,
        rivals,
        settlements,
        available_actions: vec![
            "wait".to_string(),
            "build".to_string(),
            "attack".to_string(),
            "use_tool".to_string(),
        ],
        tool_catalog: armory::describe(archive, state.time.epoch),
    };

    Some((ctx, recalled_ids))
}

/// Dispatch one decided action and report what to record in the trace:
/// `(chosen_action, reasoning, tool_inputs, tool_outputs)`.
fn dispatch(
    state: &mut WorldState,
    archive: &mut ToolArchive,
    oracle: &mut dyn Oracle,
    ctx: &DecisionContext,
    decision: Decision,
    action_logs: &mut Vec<String>,
) -> (String, String, Option<serde_json::Value>, Option<serde_json::Value>) {
    match decision.action {
        PlannedAction::Wait => ("wait".to_string(), decision.reasoning, None, None),

        PlannedAction::Build {
            location_id,
            kind,
            cost,
        } => {
            match construction::build_structure(state, location_id, &kind, ctx.faction_id, cost)
            {
                Ok(outcome) => action_logs.push(outcome.log),
                Err(err) => {
                    warn!(npc = %ctx.npc_id, %err, "construction rejected");
                }
            }
            ("build".to_string(), decision.reasoning, None, None)
        }

        PlannedAction::Attack {
            defender,
            location_id,
        } => {
            let report = match build_combat_context(state, ctx, defender, location_id) {
                Some(combat_ctx) => {
                    oracle.arbitrate_combat(&combat_ctx).unwrap_or_else(|err| {
                        // Mandatory fallback: combat never crashes the turn.
                        warn!(%err, "combat arbiter failed, inconclusive skirmish");
                        CombatReport::inconclusive()
                    })
                }
                None => CombatReport::inconclusive(),
            };

            match combat::resolve_combat(state, ctx.faction_id, defender, location_id, &report)
            {
                CombatOutcome::Resolved { log, .. } => action_logs.push(log),
                CombatOutcome::FogOfWar => {
                    debug!(npc = %ctx.npc_id, "attack dissolved into fog of war");
                }
            }
            ("attack".to_string(), decision.reasoning, None, None)
        }

        PlannedAction::UseTool { name, inputs } => {
            let outputs = run_tool(state, archive, oracle, ctx, &name, &inputs, action_logs);
            (
                "use_tool".to_string(),
                decision.reasoning,
                Some(inputs),
                Some(outputs),
            )
        }
    }
}

/// Assemble the arbiter's view of an engagement, if every party exists.
fn build_combat_context(
    state: &WorldState,
    ctx: &DecisionContext,
    defender: dominion_types::FactionId,
    location_id: dominion_types::LocationId,
) -> Option<CombatContext> {
    let attacker = state.faction(ctx.faction_id)?;
    let defender_faction = state.faction(defender)?;
    let location = state.map.location(location_id)?;

    Some(CombatContext {
        epoch: state.time.epoch,
        attacker_id: attacker.id,
        attacker_name: attacker.name.clone(),
        attacker_troops: attacker.troops,
        attacker_quality: attacker.troop_quality,
        defender_id: defender_faction.id,
        defender_name: defender_faction.name.clone(),
        defender_troops: defender_faction.troops,
        defender_quality: defender_faction.troop_quality,
        location_id: location.id,
        location_name: location.name.clone(),
        location_defense: location.defense,
        location_unrest: location.unrest,
    })
}

/// Execute a tool invocation end to end, returning the audit payload.
///
/// Every failure mode is recovered into the returned JSON so the decision
/// trace captures what actually happened.
fn run_tool(
    state: &mut WorldState,
    archive: &mut ToolArchive,
    oracle: &mut dyn Oracle,
    ctx: &DecisionContext,
    name: &str,
    inputs: &serde_json::Value,
    action_logs: &mut Vec<String>,
) -> serde_json::Value {
    let epoch = state.time.epoch;

    let Some(tool) = archive.tool_by_name(name).cloned() else {
        warn!(npc = %ctx.npc_id, tool = name, "unknown tool requested");
        return json!({ "error": format!("no tool named \"{name}\"") });
    };

    if let Err(err) = armory::validate_inputs(&tool, inputs) {
        warn!(npc = %ctx.npc_id, tool = %tool.name, %err, "tool inputs rejected");
        return json!({ "error": err.to_string() });
    }

    if !armory::can_use(archive, tool.id, epoch) {
        let ready_at = armory::ready_at(archive, tool.id).unwrap_or(0);
        debug!(npc = %ctx.npc_id, tool = %tool.name, ready_at, "tool on cooldown");
        return json!({ "error": "tool is on cooldown", "ready_at": ready_at });
    }

    let execution = match oracle.execute_tool(&tool, inputs, ctx) {
        Ok(execution) => execution,
        Err(err) => {
            warn!(npc = %ctx.npc_id, tool = %tool.name, %err, "tool execution failed");
            return json!({ "error": err.to_string() });
        }
    };

    // A secondary oracle call may fan out, but only so far.
    let mut applied = 0_usize;
    for effect in execution.effects.iter().take(MAX_TOOL_EFFECTS) {
        if apply_tool_effect(state, effect) {
            applied = applied.saturating_add(1);
        }
    }

    armory::mark_used(archive, tool.id, epoch);
    action_logs.push(execution.narrative.clone());

    json!({
        "narrative": execution.narrative,
        "effects_applied": applied,
    })
}

/// Apply one bounded tool effect. Returns `false` if the target is gone.
fn apply_tool_effect(state: &mut WorldState, effect: &ToolEffect) -> bool {
    match effect {
        ToolEffect::GrantResources { faction_id, income } => {
            let Some(faction) = state.faction_mut(*faction_id) else {
                return false;
            };
            faction.resources.grant(income);
            true
        }
        ToolEffect::AdjustUnrest { location_id, delta } => {
            let Some(location) = state.map.location_mut(*location_id) else {
                return false;
            };
            location.adjust_unrest(i64::from(*delta));
            true
        }
        ToolEffect::AdjustProsperity { location_id, delta } => {
            let Some(location) = state.map.location_mut(*location_id) else {
                return false;
            };
            location.adjust_prosperity(i64::from(*delta));
            true
        }
        ToolEffect::DisruptRoute { route_id } => {
            let Some(route) = state.map.routes.iter_mut().find(|r| r.id == *route_id) else {
                return false;
            };
            route.status = dominion_types::RouteStatus::Disrupted;
            true
        }
        ToolEffect::InspireMemory { npc_id, text } => {
            let epoch = state.time.epoch;
            let Some(npc) = state.npc_mut(*npc_id) else {
                return false;
            };
            memory::remember(npc, text, epoch, Vec::new());
            true
        }
    }
}

/// Let the oracle invent one shared tool, gated to once per epoch.
///
/// The guard is stamped only when an evolved tool passes validation and is
/// actually registered.
fn evolve_tool_once(
    state: &mut WorldState,
    archive: &mut ToolArchive,
    oracle: &mut dyn Oracle,
    epoch: u64,
) {
    if state.last_evolved_epoch >= epoch {
        return;
    }

    let existing_names: Vec<String> =
        archive.tools.iter().map(|t| t.name.clone()).collect();

    match oracle.evolve_tool(epoch, &existing_names) {
        Ok(Some(proposal)) => {
            let tool = AgentTool {
                id: ToolId::new(),
                name: proposal.name,
                description: proposal.description,
                action_guidance: proposal.action_guidance,
                parameters: proposal.parameters,
                cooldown_days: proposal.cooldown_days,
                created_epoch: epoch,
            };
            match armory::add_tool(archive, tool) {
                Ok(tool_id) => {
                    state.last_evolved_epoch = epoch;
                    let name = archive
                        .tool(tool_id)
                        .map_or_else(String::new, |t| t.name.clone());
                    push_event(
                        state,
                        format!("A new craft spreads through the realm: {name}"),
                        None,
                    );
                }
                Err(err) => {
                    warn!(epoch, %err, "evolved tool rejected at the boundary");
                }
            }
        }
        Ok(None) => {}
        Err(err) => warn!(epoch, %err, "tool-evolution oracle failed, skipping"),
    }
}

/// Append a narrative event stamped with the current in-world time.
fn push_event(state: &mut WorldState, text: String, trace_id: Option<TraceId>) {
    let (epoch, day) = (state.time.epoch, state.time.day);
    state.event_log.push(EventLogEntry {
        id: EventId::new(),
        epoch,
        day,
        text,
        trace_id,
        created_at: Utc::now(),
    });
}
