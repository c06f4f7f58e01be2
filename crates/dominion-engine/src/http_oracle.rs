//! HTTP oracle client.
//!
//! Implements the [`Oracle`] contract over plain JSON-over-HTTP: each
//! contract call POSTs its request payload to one endpoint and expects the
//! JSON serialization of the return type back. What sits behind the
//! endpoint -- an LLM gateway, a scripted bot, a human -- is none of the
//! engine's business; prompts and model selection live entirely on the
//! server side.
//!
//! | Call             | Endpoint          |
//! |------------------|-------------------|
//! | `decide`         | `/decide`         |
//! | `arbitrate_combat` | `/combat`       |
//! | `execute_tool`   | `/tool/execute`   |
//! | `summarize_epoch`| `/summarize`      |
//! | `world_event`    | `/world-event`    |
//! | `evolve_tool`    | `/tool/evolve`    |
//! | `generate_world` | `/generate`       |
//!
//! Transport and HTTP-status failures map to [`OracleError::Unavailable`]
//! (and are retried by the [`RetryingOracle`] wrapper the binary installs);
//! unparseable responses map to [`OracleError::Malformed`].
//!
//! [`RetryingOracle`]: dominion_core::RetryingOracle

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use dominion_agents::CombatReport;
use dominion_core::config::OracleConfig;
use dominion_core::oracle::{
    CombatContext, Decision, DecisionContext, GeneratedWorld, Oracle, OracleError, ThemeParams,
    ToolExecution, ToolProposal,
};
use dominion_types::AgentTool;

/// A JSON-over-HTTP implementation of the oracle contract.
pub struct HttpOracle {
    runtime: tokio::runtime::Runtime,
    client: reqwest::Client,
    base_url: String,
}

impl HttpOracle {
    /// Build a client from oracle configuration.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Unavailable`] if the async runtime or HTTP
    /// client cannot be constructed.
    pub fn new(config: &OracleConfig) -> Result<Self, OracleError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| OracleError::Unavailable {
                message: format!("failed to start async runtime: {err}"),
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| OracleError::Unavailable {
                message: format!("failed to build HTTP client: {err}"),
            })?;

        Ok(Self {
            runtime,
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    /// POST `body` to `path` and parse the response as `T`.
    fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, OracleError> {
        let url = format!("{}/{path}", self.base_url);

        self.runtime.block_on(async {
            let response = self
                .client
                .post(&url)
                .json(body)
                .send()
                .await
                .map_err(|err| OracleError::Unavailable {
                    message: format!("request to /{path} failed: {err}"),
                })?;

            let status = response.status();
            if !status.is_success() {
                let error_body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "unable to read error body".to_owned());
                return Err(OracleError::Unavailable {
                    message: format!("/{path} returned {status}: {error_body}"),
                });
            }

            response
                .json::<T>()
                .await
                .map_err(|err| OracleError::Malformed {
                    message: format!("/{path} response parse failed: {err}"),
                })
        })
    }
}

impl Oracle for HttpOracle {
    fn decide(&mut self, ctx: &DecisionContext) -> Result<Decision, OracleError> {
        self.post("decide", ctx)
    }

    fn arbitrate_combat(&mut self, ctx: &CombatContext) -> Result<CombatReport, OracleError> {
        self.post("combat", ctx)
    }

    fn execute_tool(
        &mut self,
        tool: &AgentTool,
        inputs: &serde_json::Value,
        ctx: &DecisionContext,
    ) -> Result<ToolExecution, OracleError> {
        self.post(
            "tool/execute",
            &json!({
                "tool": tool,
                "inputs": inputs,
                "context": ctx,
            }),
        )
    }

    fn summarize_epoch(&mut self, epoch: u64, logs: &[String]) -> Result<String, OracleError> {
        self.post("summarize", &json!({ "epoch": epoch, "logs": logs }))
    }

    fn world_event(&mut self, epoch: u64) -> Result<Option<String>, OracleError> {
        self.post("world-event", &json!({ "epoch": epoch }))
    }

    fn evolve_tool(
        &mut self,
        epoch: u64,
        existing_names: &[String],
    ) -> Result<Option<ToolProposal>, OracleError> {
        self.post(
            "tool/evolve",
            &json!({ "epoch": epoch, "existing_names": existing_names }),
        )
    }

    fn generate_world(
        &mut self,
        seed: u64,
        theme: &ThemeParams,
    ) -> Result<GeneratedWorld, OracleError> {
        self.post("generate", &json!({ "seed": seed, "theme": theme }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let config = OracleConfig {
            mode: "http".to_string(),
            url: "http://127.0.0.1:8787///".to_string(),
            timeout_ms: 1_000,
            retries: 1,
            backoff_ms: 0,
        };
        let oracle = HttpOracle::new(&config).unwrap();
        assert_eq!(oracle.base_url, "http://127.0.0.1:8787");
    }

    #[test]
    fn unreachable_endpoint_is_unavailable() {
        let config = OracleConfig {
            mode: "http".to_string(),
            // Reserved port with nothing listening.
            url: "http://127.0.0.1:1".to_string(),
            timeout_ms: 300,
            retries: 1,
            backoff_ms: 0,
        };
        let mut oracle = HttpOracle::new(&config).unwrap();
        let err = oracle.summarize_epoch(1, &[]);
        assert!(matches!(err, Err(OracleError::Unavailable { .. })));
    }
}
