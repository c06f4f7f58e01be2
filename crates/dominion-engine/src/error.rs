//! Error types for the engine binary.
//!
//! [`CliError`] wraps every subsystem failure `main` can encounter and maps
//! each to a process exit code: callers can distinguish "oracle
//! unavailable" (2) from "invalid save data" (3) from success (0); anything
//! else exits 1.

use dominion_core::{ConfigError, GenesisError, OracleError, StoreError, TurnError};

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// World genesis failed.
    #[error("genesis error: {source}")]
    Genesis {
        /// The underlying genesis error.
        #[from]
        source: GenesisError,
    },

    /// An oracle call failed outside of a turn (e.g. while connecting).
    #[error("oracle error: {source}")]
    Oracle {
        /// The underlying oracle error.
        #[from]
        source: OracleError,
    },

    /// Persistence failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },

    /// The turn orchestrator failed.
    #[error("turn error: {source}")]
    Turn {
        /// The underlying turn error.
        #[from]
        source: TurnError,
    },

    /// A file operation outside the store failed.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// A command needs an existing world and none has been initialized.
    #[error("no world found at {path}; run `init` first")]
    NoWorld {
        /// The configured save path.
        path: String,
    },
}

impl CliError {
    /// Map this error to the process exit code contract.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Oracle { .. }
            | Self::Genesis {
                source: GenesisError::Oracle { .. },
            } => 2,
            Self::Store {
                source: StoreError::Save(_),
            } => 3,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use dominion_types::SaveError;

    use super::*;

    #[test]
    fn oracle_failures_exit_two() {
        let err = CliError::Oracle {
            source: OracleError::Unavailable {
                message: "down".to_owned(),
            },
        };
        assert_eq!(err.exit_code(), 2);

        let err = CliError::Genesis {
            source: GenesisError::Oracle {
                source: OracleError::Unavailable {
                    message: "down".to_owned(),
                },
            },
        };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn invalid_saves_exit_three() {
        let err = CliError::Store {
            source: StoreError::Save(SaveError::Corrupt {
                reason: "bad".to_owned(),
            }),
        };
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn everything_else_exits_one() {
        let err = CliError::NoWorld {
            path: "dominion-save.json".to_owned(),
        };
        assert_eq!(err.exit_code(), 1);
    }
}
