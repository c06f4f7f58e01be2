//! The decision oracle contract.
//!
//! During a turn, the orchestrator presents each steward with a
//! [`DecisionContext`] and awaits a [`Decision`] in response. The
//! [`Oracle`] trait abstracts the mechanism by which decisions and
//! generated content are obtained -- an LLM backend over HTTP, a scripted
//! bot, or a test stub. The core never sees prompts or models, only this
//! contract.
//!
//! Every call site in the orchestrator tolerates the oracle being
//! unavailable: decisions degrade to a forced wait, combat falls back to a
//! deterministic inconclusive skirmish, and the optional narrative steps
//! are skipped for the epoch. [`RetryingOracle`] adds bounded retries with
//! exponential backoff in front of any implementation.

use std::thread;
use std::time::Duration;

use rand::Rng as _;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use dominion_agents::CombatReport;
use dominion_types::{
    AgentTool, Commodity, Faction, FactionId, Goal, Location, LocationId, Npc, NpcId, NpcRole,
    ResourcePool, Stance, ToolParam, TradeRoute,
};

/// Errors produced at the oracle boundary.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// The oracle could not be reached or refused to answer.
    #[error("oracle unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },

    /// The oracle answered with something the contract cannot interpret.
    #[error("oracle response malformed: {message}")]
    Malformed {
        /// Description of the problem.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Contract payloads
// ---------------------------------------------------------------------------

/// A rival faction as presented to the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionBrief {
    /// Faction identifier.
    pub id: FactionId,
    /// Display name.
    pub name: String,
    /// Standing troops.
    pub troops: u32,
    /// The deciding faction's stance toward this one.
    pub stance: Stance,
}

/// A settlement as presented to the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationBrief {
    /// Location identifier.
    pub id: LocationId,
    /// Display name.
    pub name: String,
    /// Current owner, if any.
    pub faction_id: Option<FactionId>,
    /// Unrest gauge.
    pub unrest: u32,
    /// Defense gauge.
    pub defense: u32,
}

/// Everything a steward knows when consulting the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionContext {
    /// Current epoch.
    pub epoch: u64,
    /// The deciding steward.
    pub npc_id: NpcId,
    /// The steward's name.
    pub npc_name: String,
    /// The steward's faction.
    pub faction_id: FactionId,
    /// The faction's name.
    pub faction_name: String,
    /// The faction's resource stockpile.
    pub resources: ResourcePool,
    /// The faction's standing troops.
    pub troops: u32,
    /// Where the steward currently is.
    pub location_id: LocationId,
    /// The steward's goals, most urgent first.
    pub goals: Vec<Goal>,
    /// Goal text presented as one line of context.
    pub goal_context: String,
    /// Memories retrieved for this consult, most relevant first.
    pub recalled_memories: Vec<String>,
    /// Other factions in the world.
    pub rivals: Vec<FactionBrief>,
    /// Known settlements.
    pub settlements: Vec<LocationBrief>,
    /// Action names the steward may choose from.
    pub available_actions: Vec<String>,
    /// Rendered catalog of archive tools and their readiness.
    pub tool_catalog: String,
}

/// The action a steward chose, with structured arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlannedAction {
    /// Do nothing this epoch.
    Wait,
    /// Construct a building.
    Build {
        /// Where to build.
        location_id: LocationId,
        /// Structure kind, e.g. "granary".
        kind: String,
        /// Full cost to deduct.
        cost: ResourcePool,
    },
    /// Assault a rival-held settlement.
    Attack {
        /// The defending faction.
        defender: FactionId,
        /// The contested settlement.
        location_id: LocationId,
    },
    /// Invoke a shared tool from the archive.
    UseTool {
        /// Tool name (matched case-insensitively).
        name: String,
        /// Inputs, validated against the declared parameter schema.
        inputs: serde_json::Value,
    },
}

/// A steward decision: one action plus the oracle's stated reasoning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// The chosen action.
    pub action: PlannedAction,
    /// Why the oracle chose it.
    pub reasoning: String,
}

/// The engagement as presented to the combat arbiter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatContext {
    /// Current epoch.
    pub epoch: u64,
    /// Attacking faction.
    pub attacker_id: FactionId,
    /// Attacker display name.
    pub attacker_name: String,
    /// Attacker troops.
    pub attacker_troops: u32,
    /// Attacker troop quality multiplier.
    pub attacker_quality: Decimal,
    /// Defending faction.
    pub defender_id: FactionId,
    /// Defender display name.
    pub defender_name: String,
    /// Defender troops.
    pub defender_troops: u32,
    /// Defender troop quality multiplier.
    pub defender_quality: Decimal,
    /// Contested settlement.
    pub location_id: LocationId,
    /// Settlement display name.
    pub location_name: String,
    /// Settlement defense gauge.
    pub location_defense: u32,
    /// Settlement unrest gauge.
    pub location_unrest: u32,
}

/// A bounded side effect produced by a tool execution.
///
/// The closed set keeps oracle-invented tools from mutating the world in
/// unchecked ways: every effect is validated and clamped on application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolEffect {
    /// Grant resources to a faction.
    GrantResources {
        /// Receiving faction.
        faction_id: FactionId,
        /// Amounts to add.
        income: ResourcePool,
    },
    /// Shift a settlement's unrest gauge.
    AdjustUnrest {
        /// Target settlement.
        location_id: LocationId,
        /// Signed shift, clamped into `0..=100` on application.
        delta: i32,
    },
    /// Shift a settlement's prosperity gauge.
    AdjustProsperity {
        /// Target settlement.
        location_id: LocationId,
        /// Signed shift, clamped into `0..=100` on application.
        delta: i32,
    },
    /// Disrupt a trade route.
    DisruptRoute {
        /// Target route.
        route_id: dominion_types::RouteId,
    },
    /// Plant a memory in an NPC's mind.
    InspireMemory {
        /// Target NPC.
        npc_id: NpcId,
        /// The remembered fact.
        text: String,
    },
}

/// The result of executing a tool: narrative plus bounded side effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolExecution {
    /// What happened, in prose.
    pub narrative: String,
    /// Side effects; the orchestrator applies at most three.
    pub effects: Vec<ToolEffect>,
}

/// A newly evolved tool proposed by the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolProposal {
    /// Tool name.
    pub name: String,
    /// What it does.
    pub description: String,
    /// Guidance on when to invoke it.
    pub action_guidance: String,
    /// Declared parameter schema.
    pub parameters: Vec<ToolParam>,
    /// Requested cooldown; clamped into `1..=10` on registration.
    pub cooldown_days: u8,
}

/// Theme parameters for world generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeParams {
    /// Flavor text steering generated content.
    pub theme: String,
    /// Grid width the generated coordinates must fit.
    pub width: u32,
    /// Grid height the generated coordinates must fit.
    pub height: u32,
    /// How many factions to generate.
    pub factions: u32,
}

/// Freshly generated theme content, to be overlaid on the terrain grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedWorld {
    /// World display name.
    pub name: String,
    /// Starting factions.
    pub factions: Vec<Faction>,
    /// Starting settlements.
    pub locations: Vec<Location>,
    /// Starting NPCs.
    pub npcs: Vec<Npc>,
    /// Starting commodity set.
    pub commodities: Vec<Commodity>,
    /// Starting trade routes.
    #[serde(default)]
    pub routes: Vec<TradeRoute>,
}

// ---------------------------------------------------------------------------
// The trait
// ---------------------------------------------------------------------------

/// The external decision and content-generation collaborator.
///
/// Implementations may be backed by an LLM, a script, or a stub; the core
/// only relies on this contract and on every call being allowed to fail
/// with [`OracleError`].
pub trait Oracle {
    /// Choose an action for a steward.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError`] if no decision could be obtained; the caller
    /// degrades the steward to a forced wait.
    fn decide(&mut self, ctx: &DecisionContext) -> Result<Decision, OracleError>;

    /// Arbitrate a military engagement.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError`] if no verdict could be obtained; the caller
    /// falls back to [`CombatReport::inconclusive`].
    fn arbitrate_combat(&mut self, ctx: &CombatContext) -> Result<CombatReport, OracleError>;

    /// Execute a tool invocation, returning narrative and bounded effects.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError`] if execution failed; the caller treats the
    /// invocation as a no-op.
    fn execute_tool(
        &mut self,
        tool: &AgentTool,
        inputs: &serde_json::Value,
        ctx: &DecisionContext,
    ) -> Result<ToolExecution, OracleError>;

    /// Compress an epoch's action logs into a one-line history summary.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError`] if summarization failed; the caller composes
    /// a deterministic local line instead.
    fn summarize_epoch(&mut self, epoch: u64, logs: &[String]) -> Result<String, OracleError>;

    /// Optionally produce one ambient world-event narrative.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError`] if generation failed; the step is skipped
    /// for the epoch.
    fn world_event(&mut self, epoch: u64) -> Result<Option<String>, OracleError>;

    /// Optionally propose one brand-new shared tool.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError`] if generation failed; the step is skipped
    /// for the epoch.
    fn evolve_tool(
        &mut self,
        epoch: u64,
        existing_names: &[String],
    ) -> Result<Option<ToolProposal>, OracleError>;

    /// Generate starting theme content for a new world.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError`] if generation failed; genesis cannot proceed
    /// without it.
    fn generate_world(
        &mut self,
        seed: u64,
        theme: &ThemeParams,
    ) -> Result<GeneratedWorld, OracleError>;
}

// ---------------------------------------------------------------------------
// Stub implementation
// ---------------------------------------------------------------------------

/// A deterministic offline oracle.
///
/// Stewards always wait, combat is arbitrated by a simple strength
/// comparison, and world generation is seeded content from small name
/// pools. Used by tests and by `--oracle stub` runs.
#[derive(Debug, Clone, Default)]
pub struct StubOracle;

/// Faction name pool for stub generation.
const FACTION_NAMES: &[&str] = &[
    "Gilded Court",
    "Ashen Compact",
    "River Clans",
    "Thorned Pact",
    "Saltborn League",
    "Ember Synod",
];

/// Settlement name pool for stub generation.
const SETTLEMENT_NAMES: &[&str] = &[
    "Thornwick", "Felsgard", "Maribel", "Duskhollow", "Crowmere", "Aldershade",
    "Veydrin", "Lowmarch", "Brackenford", "Solenne",
];

/// Steward name pool for stub generation.
const STEWARD_NAMES: &[&str] = &[
    "Maren", "Oswin", "Petra", "Caldus", "Ilsa", "Roderic", "Yole", "Sabine",
];

/// Starting commodity set for stub generation.
const COMMODITIES: &[(&str, i64)] = &[("salt", 10), ("timber", 6), ("iron", 14)];

impl StubOracle {
    /// Create a new stub oracle.
    pub const fn new() -> Self {
        Self
    }
}

impl Oracle for StubOracle {
    fn decide(&mut self, ctx: &DecisionContext) -> Result<Decision, OracleError> {
        debug!(npc = %ctx.npc_id, epoch = ctx.epoch, "stub decision: wait");
        Ok(Decision {
            action: PlannedAction::Wait,
            reasoning: "Holds position and watches the roads.".to_string(),
        })
    }

    fn arbitrate_combat(&mut self, ctx: &CombatContext) -> Result<CombatReport, OracleError> {
        let attacker_strength = Decimal::from(ctx.attacker_troops) * ctx.attacker_quality;
        let defender_strength = Decimal::from(ctx.defender_troops) * ctx.defender_quality
            + Decimal::from(ctx.location_defense);
        let conquered = attacker_strength > defender_strength;

        Ok(CombatReport {
            narrative: if conquered {
                format!(
                    "{} storms {} and drives out {}",
                    ctx.attacker_name, ctx.location_name, ctx.defender_name
                )
            } else {
                format!(
                    "{} assaults {} but {} holds the walls",
                    ctx.attacker_name, ctx.location_name, ctx.defender_name
                )
            },
            attacker_casualties: ctx.defender_troops.saturating_div(8),
            defender_casualties: ctx.attacker_troops.saturating_div(6),
            conquered,
            defense_damage: if conquered { 15 } else { 5 },
            unrest_delta: 10,
        })
    }

    fn execute_tool(
        &mut self,
        tool: &AgentTool,
        _inputs: &serde_json::Value,
        ctx: &DecisionContext,
    ) -> Result<ToolExecution, OracleError> {
        Ok(ToolExecution {
            narrative: format!("{} invokes {}", ctx.npc_name, tool.name),
            effects: Vec::new(),
        })
    }

    fn summarize_epoch(&mut self, epoch: u64, logs: &[String]) -> Result<String, OracleError> {
        Ok(format!("Epoch {epoch}: {}", logs.join("; ")))
    }

    fn world_event(&mut self, _epoch: u64) -> Result<Option<String>, OracleError> {
        Ok(None)
    }

    fn evolve_tool(
        &mut self,
        _epoch: u64,
        _existing_names: &[String],
    ) -> Result<Option<ToolProposal>, OracleError> {
        Ok(None)
    }

    fn generate_world(
        &mut self,
        seed: u64,
        theme: &ThemeParams,
    ) -> Result<GeneratedWorld, OracleError> {
        let mut rng = SmallRng::seed_from_u64(seed);
        let faction_count = usize::try_from(theme.factions.clamp(1, 6)).unwrap_or(3);

        let mut factions = Vec::new();
        let mut locations = Vec::new();
        let mut npcs = Vec::new();

        for index in 0..faction_count {
            let faction_id = FactionId::new();
            let name = FACTION_NAMES
                .get(index % FACTION_NAMES.len())
                .copied()
                .unwrap_or("Nameless Banner");

            factions.push(Faction {
                id: faction_id,
                name: name.to_string(),
                archetype: theme.theme.clone(),
                resources: ResourcePool::new(
                    rng.random_range(60..=140),
                    rng.random_range(40..=120),
                    rng.random_range(10..=60),
                ),
                troops: rng.random_range(40..=120),
                troop_quality: Decimal::new(i64::from(rng.random_range(5..=20_u32)), 1),
                relations: std::collections::BTreeMap::new(),
                laws: Vec::new(),
            });

            let location_id = LocationId::new();
            locations.push(Location {
                id: location_id,
                name: SETTLEMENT_NAMES
                    .get(index % SETTLEMENT_NAMES.len())
                    .copied()
                    .unwrap_or("Nameless Town")
                    .to_string(),
                x: rng.random_range(0..theme.width.max(1)),
                y: rng.random_range(0..theme.height.max(1)),
                faction_id: Some(faction_id),
                population: rng.random_range(150..=600),
                defense: rng.random_range(20..=60),
                unrest: rng.random_range(0..=25),
                prosperity: rng.random_range(35..=70),
                buildings: Vec::new(),
            });

            npcs.push(Npc {
                id: NpcId::new(),
                name: STEWARD_NAMES
                    .get(index % STEWARD_NAMES.len())
                    .copied()
                    .unwrap_or("Nameless Steward")
                    .to_string(),
                role: NpcRole::Steward,
                faction_id,
                location_id,
                goals: vec![Goal {
                    text: "keep the faction fed and feared".to_string(),
                    priority: 5,
                }],
                resources: ResourcePool::new(rng.random_range(5..=30), 0, 0),
                relations: std::collections::BTreeMap::new(),
                memories: Vec::new(),
            });
        }

        // Chain neighboring settlements with routes, one commodity each.
        let mut routes = Vec::new();
        for pair in locations.windows(2) {
            if let [from, to] = pair {
                let (commodity, _) = COMMODITIES[routes.len() % COMMODITIES.len()];
                routes.push(TradeRoute {
                    id: dominion_types::RouteId::new(),
                    from: from.id,
                    to: to.id,
                    commodity: commodity.to_string(),
                    volume: rng.random_range(5..=20),
                    risk: rng.random_range(5..=40),
                    status: dominion_types::RouteStatus::Active,
                });
            }
        }

        let commodities = COMMODITIES
            .iter()
            .map(|&(name, base)| Commodity {
                name: name.to_string(),
                base_price: Decimal::from(base),
                current_price: Decimal::from(base),
                supply: rng.random_range(60..=140),
                demand: rng.random_range(60..=140),
                volatility: Decimal::new(i64::from(rng.random_range(5..=20_u32)), 1),
            })
            .collect();

        Ok(GeneratedWorld {
            name: format!("The {} Reaches", capitalize(&theme.theme)),
            factions,
            locations,
            npcs,
            commodities,
            routes,
        })
    }
}

/// Uppercase the first character of a theme word.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Quiet".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Retry wrapper
// ---------------------------------------------------------------------------

/// Wraps any oracle with bounded retries and exponential backoff.
///
/// Only [`OracleError::Unavailable`] is retried; a malformed response is
/// returned immediately, since retrying it rarely helps and the call sites
/// already degrade gracefully.
pub struct RetryingOracle<O> {
    inner: O,
    attempts: u32,
    base_delay: Duration,
}

impl<O: Oracle> RetryingOracle<O> {
    /// Wrap `inner`, retrying each call up to `attempts` times with delays
    /// of `base_delay`, `2 x base_delay`, `4 x base_delay`, ...
    pub const fn new(inner: O, attempts: u32, base_delay: Duration) -> Self {
        Self {
            inner,
            attempts,
            base_delay,
        }
    }

    /// Run one oracle call with the retry policy.
    fn with_retry<T>(
        &mut self,
        mut call: impl FnMut(&mut O) -> Result<T, OracleError>,
    ) -> Result<T, OracleError> {
        let attempts = self.attempts.max(1);
        let mut delay = self.base_delay;

        for attempt in 1..=attempts {
            match call(&mut self.inner) {
                Ok(value) => return Ok(value),
                Err(err @ OracleError::Malformed { .. }) => return Err(err),
                Err(OracleError::Unavailable { message }) => {
                    if attempt == attempts {
                        return Err(OracleError::Unavailable { message });
                    }
                    warn!(attempt, %message, "oracle call failed, backing off");
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    delay = delay.saturating_mul(2);
                }
            }
        }

        Err(OracleError::Unavailable {
            message: "retry budget exhausted".to_owned(),
        })
    }
}

impl<O: Oracle> Oracle for RetryingOracle<O> {
    fn decide(&mut self, ctx: &DecisionContext) -> Result<Decision, OracleError> {
        self.with_retry(|oracle| oracle.decide(ctx))
    }

    fn arbitrate_combat(&mut self, ctx: &CombatContext) -> Result<CombatReport, OracleError> {
        self.with_retry(|oracle| oracle.arbitrate_combat(ctx))
    }

    fn execute_tool(
        &mut self,
        tool: &AgentTool,
        inputs: &serde_json::Value,
        ctx: &DecisionContext,
    ) -> Result<ToolExecution, OracleError> {
        self.with_retry(|oracle| oracle.execute_tool(tool, inputs, ctx))
    }

    fn summarize_epoch(&mut self, epoch: u64, logs: &[String]) -> Result<String, OracleError> {
        self.with_retry(|oracle| oracle.summarize_epoch(epoch, logs))
    }

    fn world_event(&mut self, epoch: u64) -> Result<Option<String>, OracleError> {
        self.with_retry(|oracle| oracle.world_event(epoch))
    }

    fn evolve_tool(
        &mut self,
        epoch: u64,
        existing_names: &[String],
    ) -> Result<Option<ToolProposal>, OracleError> {
        self.with_retry(|oracle| oracle.evolve_tool(epoch, existing_names))
    }

    fn generate_world(
        &mut self,
        seed: u64,
        theme: &ThemeParams,
    ) -> Result<GeneratedWorld, OracleError> {
        self.with_retry(|oracle| oracle.generate_world(seed, theme))
    }
}
