//! Engine binary for the Dominion simulation.
//!
//! Exposes the world lifecycle as a small CLI:
//!
//! - `init` -- generate a new world from the configured theme and seed
//! - `advance` -- advance the world by exactly one epoch
//! - `export` -- write the current save bundle to a file
//! - `reset` -- discard the persisted world
//!
//! Exit codes distinguish failure classes: 0 success, 2 oracle
//! unavailable, 3 invalid save data, 1 anything else.

mod error;
mod http_oracle;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use dominion_core::config::{EngineConfig, OracleConfig};
use dominion_core::{
    JsonFileStore, Oracle, RetryingOracle, StubOracle, TurnOptions, WorldStore, genesis,
    turn,
};
use dominion_types::{SaveBundle, ToolArchive};

use crate::error::CliError;
use crate::http_oracle::HttpOracle;

/// The Dominion world simulation engine.
#[derive(Debug, Parser)]
#[command(name = "dominion-engine", version, about)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long, default_value = "dominion-config.yaml")]
    config: PathBuf,

    /// What to do.
    #[command(subcommand)]
    command: Command,
}

/// Engine subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a new world and persist it.
    Init {
        /// Override the configured theme.
        #[arg(long)]
        theme: Option<String>,

        /// Override the configured seed.
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Advance the world by exactly one epoch.
    Advance,

    /// Export the current save bundle to a file.
    Export {
        /// Destination path.
        #[arg(long)]
        out: PathBuf,
    },

    /// Discard the persisted world.
    Reset,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "command failed");
            ExitCode::from(err.exit_code())
        }
    }
}

/// Dispatch the parsed command.
fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(&cli.config)?;
    let store = JsonFileStore::new(&config.store.path);

    match cli.command {
        Command::Init { theme, seed } => init(&config, &store, theme, seed),
        Command::Advance => advance(&config, &store),
        Command::Export { out } => export(&config, &store, &out),
        Command::Reset => {
            store.reset()?;
            info!("world reset to empty state");
            Ok(())
        }
    }
}

/// Load configuration, falling back to defaults when the file is absent.
fn load_config(path: &Path) -> Result<EngineConfig, CliError> {
    if path.exists() {
        Ok(EngineConfig::from_file(path)?)
    } else {
        info!(path = %path.display(), "config file not found, using defaults");
        Ok(EngineConfig::default())
    }
}

/// `init`: generate a fresh world and persist the bundle.
fn init(
    config: &EngineConfig,
    store: &JsonFileStore,
    theme: Option<String>,
    seed: Option<u64>,
) -> Result<(), CliError> {
    let mut world_config = config.world.clone();
    if let Some(theme) = theme {
        world_config.theme = theme;
    }
    if let Some(seed) = seed {
        world_config.seed = seed;
    }

    let mut oracle = make_oracle(&config.oracle)?;
    let state = genesis::generate(&world_config, oracle.as_mut())?;

    info!(
        world = %state.name,
        seed = state.seed,
        factions = state.factions.len(),
        "world initialized"
    );

    let bundle = SaveBundle::new(state, ToolArchive::default());
    store.save(&bundle)?;
    Ok(())
}

/// `advance`: run one turn and persist the committed state.
fn advance(config: &EngineConfig, store: &JsonFileStore) -> Result<(), CliError> {
    let bundle = store.load()?.ok_or_else(|| CliError::NoWorld {
        path: config.store.path.clone(),
    })?;
    let mut state = bundle.state;
    let mut archive = bundle.archive;

    let mut oracle = make_oracle(&config.oracle)?;
    let options = TurnOptions::from_config(&config.simulation);
    let mut rng = rand::rng();

    let summary = turn::advance_epoch(
        &mut state,
        &mut archive,
        oracle.as_mut(),
        &options,
        &mut rng,
    )?;

    info!(
        epoch = summary.epoch,
        stewards = summary.stewards_consulted,
        actions = summary.actions_logged,
        events = summary.events_appended,
        "epoch committed"
    );

    // Persistence is a fire-and-forget side effect of commit: a failed
    // write must not un-commit the turn.
    let bundle = SaveBundle::new(state, archive);
    if let Err(err) = store.save(&bundle) {
        error!(%err, "failed to persist committed turn");
    }
    Ok(())
}

/// `export`: write the current bundle to the given path.
fn export(config: &EngineConfig, store: &JsonFileStore, out: &Path) -> Result<(), CliError> {
    let bundle = store.load()?.ok_or_else(|| CliError::NoWorld {
        path: config.store.path.clone(),
    })?;

    let contents = serde_json::to_string_pretty(&bundle).map_err(|source| {
        CliError::Store {
            source: dominion_core::StoreError::Json { source },
        }
    })?;
    std::fs::write(out, contents)?;

    info!(
        out = %out.display(),
        epoch = bundle.state.time.epoch,
        "bundle exported"
    );
    Ok(())
}

/// Build the configured oracle: `stub` for offline runs, `http` for a
/// remote decision service. Both are wrapped in retry-with-backoff.
fn make_oracle(config: &OracleConfig) -> Result<Box<dyn Oracle>, CliError> {
    let backoff = Duration::from_millis(config.backoff_ms);
    match config.mode.as_str() {
        "http" => {
            let client = HttpOracle::new(config)?;
            Ok(Box::new(RetryingOracle::new(client, config.retries, backoff)))
        }
        _ => Ok(Box::new(RetryingOracle::new(
            StubOracle::new(),
            config.retries,
            backoff,
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn config_with_store(path: &Path) -> EngineConfig {
        let mut config = EngineConfig::default();
        config.store.path = path.to_string_lossy().into_owned();
        config.world.width = 8;
        config.world.height = 8;
        config.world.factions = 2;
        config.simulation.oracle_throttle_ms = 0;
        config
    }

    #[test]
    fn init_then_advance_roundtrips_through_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let save_path = dir.path().join("world.json");
        let config = config_with_store(&save_path);
        let store = JsonFileStore::new(&config.store.path);

        init(&config, &store, Some("ashen".to_string()), Some(7)).unwrap();
        let bundle = store.load().unwrap().unwrap();
        assert_eq!(bundle.state.time.epoch, 1);

        advance(&config, &store).unwrap();
        let bundle = store.load().unwrap().unwrap();
        assert_eq!(bundle.state.time.epoch, 2);
        assert_eq!(bundle.state.world_diffs.len(), 1);
    }

    #[test]
    fn advance_without_world_reports_no_world() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_store(&dir.path().join("missing.json"));
        let store = JsonFileStore::new(&config.store.path);

        let err = advance(&config, &store);
        assert!(matches!(err, Err(CliError::NoWorld { .. })));
    }

    #[test]
    fn export_writes_a_loadable_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let save_path = dir.path().join("world.json");
        let out_path = dir.path().join("export.json");
        let config = config_with_store(&save_path);
        let store = JsonFileStore::new(&config.store.path);

        init(&config, &store, None, None).unwrap();
        export(&config, &store, &out_path).unwrap();

        let contents = std::fs::read_to_string(&out_path).unwrap();
        let document: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert!(dominion_types::migrate(document).is_ok());
    }

    #[test]
    fn stub_mode_advances_offline() {
        let dir = tempfile::tempdir().unwrap();
        let save_path = dir.path().join("world.json");
        let config = config_with_store(&save_path);
        let store = JsonFileStore::new(&config.store.path);

        init(&config, &store, None, None).unwrap();

        // Several epochs back to back, entirely offline.
        for expected in 2..=4_u64 {
            advance(&config, &store).unwrap();
            let bundle = store.load().unwrap().unwrap();
            assert_eq!(bundle.state.time.epoch, expected);
        }
    }

    #[test]
    fn turn_options_respect_config() {
        let mut config = EngineConfig::default();
        config.simulation.oracle_throttle_ms = 0;
        config.simulation.max_stewards = 1;
        let options = TurnOptions::from_config(&config.simulation);
        assert_eq!(options.max_stewards, 1);
        assert!(options.throttle.is_zero());

        // The options drive a real turn.
        let mut oracle = StubOracle::new();
        let mut world_config = config.world.clone();
        world_config.width = 8;
        world_config.height = 8;
        let mut state = genesis::generate(&world_config, &mut oracle).unwrap();
        let mut archive = ToolArchive::default();
        let mut rng = SmallRng::seed_from_u64(1);

        let summary =
            turn::advance_epoch(&mut state, &mut archive, &mut oracle, &options, &mut rng)
                .unwrap();
        assert_eq!(summary.stewards_consulted, 1);
    }
}
