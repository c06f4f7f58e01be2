//! Configuration loading and typed config structures.
//!
//! The canonical configuration lives in `dominion-config.yaml` next to the
//! binary. This module defines strongly-typed structs that mirror the YAML
//! structure and provides a loader that reads and validates the file. All
//! fields have defaults, so an absent file yields a fully usable config.
//!
//! The config object is built once at process start and passed into the
//! orchestrator; nothing reads configuration from global state.

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// World generation settings.
    #[serde(default)]
    pub world: WorldConfig,

    /// Turn pacing and subsystem constants.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Oracle connection settings.
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Persistence settings.
    #[serde(default)]
    pub store: StoreConfig,
}

impl EngineConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_yml::from_str(&contents)?)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// World generation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Theme flavor passed to the generation oracle.
    #[serde(default = "default_theme")]
    pub theme: String,

    /// Random seed for terrain and theme content.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Grid width in tiles.
    #[serde(default = "default_grid")]
    pub width: u32,

    /// Grid height in tiles.
    #[serde(default = "default_grid")]
    pub height: u32,

    /// Number of factions to generate.
    #[serde(default = "default_factions")]
    pub factions: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            seed: default_seed(),
            width: default_grid(),
            height: default_grid(),
            factions: default_factions(),
        }
    }
}

/// Turn pacing and subsystem constants.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Per-epoch multiplicative memory decay factor.
    #[serde(default = "default_memory_decay")]
    pub memory_decay: Decimal,

    /// How many memories a steward recalls per consult.
    #[serde(default = "default_recall_limit")]
    pub recall_limit: usize,

    /// Upper bound on stewards consulted per epoch.
    #[serde(default = "default_max_stewards")]
    pub max_stewards: usize,

    /// Delay inserted between consecutive oracle consults, in milliseconds.
    /// Respects externally imposed rate limits.
    #[serde(default = "default_throttle_ms")]
    pub oracle_throttle_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            memory_decay: default_memory_decay(),
            recall_limit: default_recall_limit(),
            max_stewards: default_max_stewards(),
            oracle_throttle_ms: default_throttle_ms(),
        }
    }
}

/// Oracle connection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OracleConfig {
    /// Oracle mode: `stub` (offline, deterministic) or `http`.
    #[serde(default = "default_oracle_mode")]
    pub mode: String,

    /// Base URL for the HTTP oracle.
    #[serde(default = "default_oracle_url")]
    pub url: String,

    /// Per-request timeout, in milliseconds.
    #[serde(default = "default_oracle_timeout_ms")]
    pub timeout_ms: u64,

    /// Retry attempts per call.
    #[serde(default = "default_oracle_retries")]
    pub retries: u32,

    /// Base backoff delay between retries, in milliseconds.
    #[serde(default = "default_oracle_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            mode: default_oracle_mode(),
            url: default_oracle_url(),
            timeout_ms: default_oracle_timeout_ms(),
            retries: default_oracle_retries(),
            backoff_ms: default_oracle_backoff_ms(),
        }
    }
}

/// Persistence configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// Path of the save bundle.
    #[serde(default = "default_save_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_save_path(),
        }
    }
}

fn default_theme() -> String {
    "borderland".to_string()
}

const fn default_seed() -> u64 {
    1_848
}

const fn default_grid() -> u32 {
    24
}

const fn default_factions() -> u32 {
    3
}

fn default_memory_decay() -> Decimal {
    Decimal::new(9, 1) // 0.9
}

const fn default_recall_limit() -> usize {
    5
}

const fn default_max_stewards() -> usize {
    4
}

const fn default_throttle_ms() -> u64 {
    250
}

fn default_oracle_mode() -> String {
    "stub".to_string()
}

fn default_oracle_url() -> String {
    "http://127.0.0.1:8787".to_string()
}

const fn default_oracle_timeout_ms() -> u64 {
    20_000
}

const fn default_oracle_retries() -> u32 {
    3
}

const fn default_oracle_backoff_ms() -> u64 {
    500
}

fn default_save_path() -> String {
    "dominion-save.json".to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = EngineConfig::default();
        assert_eq!(config.simulation.memory_decay, Decimal::new(9, 1));
        assert_eq!(config.simulation.max_stewards, 4);
        assert_eq!(config.world.width, 24);
        assert_eq!(config.oracle.mode, "stub");
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config = EngineConfig::parse(
            "world:\n  theme: ashfall\n  seed: 99\nsimulation:\n  max_stewards: 2\n",
        )
        .unwrap();

        assert_eq!(config.world.theme, "ashfall");
        assert_eq!(config.world.seed, 99);
        assert_eq!(config.world.width, 24);
        assert_eq!(config.simulation.max_stewards, 2);
        assert_eq!(config.simulation.recall_limit, 5);
    }

    #[test]
    fn memory_decay_parses_from_yaml() {
        let config = EngineConfig::parse("simulation:\n  memory_decay: '0.85'\n").unwrap();
        assert_eq!(config.simulation.memory_decay, Decimal::new(85, 2));
    }

    #[test]
    fn invalid_yaml_errors() {
        let result = EngineConfig::parse("world: [not, a, mapping");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }
}
