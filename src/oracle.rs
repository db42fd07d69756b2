//! Generative-text oracle abstraction and implementations.
//!
//! The oracle is an opaque prompt-in, text-out service. The assistant
//! pipelines build prompts with [`study_harness_core::prompts`] and hand
//! them to a [`TextOracle`]:
//!
//! - **[`DisabledOracle`]**: always fails; used when no provider is configured.
//! - **[`GeminiOracle`]**: calls the Gemini `generateContent` REST endpoint.
//!
//! # Retry Strategy
//!
//! Transport-level only, inside the Gemini client:
//! - HTTP 429 and 5xx → retry
//! - other HTTP 4xx → fail immediately
//! - network errors → retry
//! - backoff: 1s, 2s, 4s, … (capped at 2^5)
//!
//! Callers above this module never retry.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::OracleConfig;

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// A text-completion backend.
#[async_trait]
pub trait TextOracle: Send + Sync {
    /// Identifier of the backing model, for logs.
    fn model_name(&self) -> &str;

    /// Complete `prompt` and return the generated text.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

// ============ Disabled Oracle ============

/// An oracle that refuses every request.
pub struct DisabledOracle;

#[async_trait]
impl TextOracle for DisabledOracle {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _prompt: &str) -> Result<String> {
        bail!("Oracle provider is disabled; set [oracle].provider in the config")
    }
}

// ============ Gemini Oracle ============

/// Oracle backed by the Gemini API.
///
/// Requires the `GEMINI_API_KEY` environment variable.
pub struct GeminiOracle {
    model: String,
    api_key: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl GeminiOracle {
    /// # Errors
    ///
    /// Returns an error if `model` is not configured, `GEMINI_API_KEY` is
    /// not set, or the HTTP client cannot be built.
    pub fn new(config: &OracleConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("oracle.model required for Gemini provider"))?;

        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| anyhow::anyhow!("GEMINI_API_KEY environment variable not set"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            model,
            api_key,
            max_retries: config.max_retries,
            client,
        })
    }
}

#[async_trait]
impl TextOracle for GeminiOracle {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/{}:generateContent", GEMINI_ENDPOINT, self.model);
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                debug!(attempt, ?delay, "retrying Gemini request");
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        return parse_gemini_response(&json);
                    }

                    // Rate limited or server error, retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        warn!(%status, attempt, "Gemini request failed, will retry");
                        last_err = Some(anyhow::anyhow!(
                            "Gemini API error {}: {}",
                            status,
                            body_text
                        ));
                        continue;
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    bail!("Gemini API error {}: {}", status, body_text);
                }
                Err(e) => {
                    warn!(error = %e, attempt, "Gemini request did not complete");
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Generation failed after retries")))
    }
}

/// Concatenate the text parts of the first candidate.
fn parse_gemini_response(json: &serde_json::Value) -> Result<String> {
    let parts = json
        .pointer("/candidates/0/content/parts")
        .and_then(|p| p.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid Gemini response: missing candidate parts"))?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();

    if text.trim().is_empty() {
        bail!("Invalid Gemini response: empty text");
    }
    Ok(text)
}

/// Create the [`TextOracle`] named by the configuration.
///
/// | Config Value | Oracle |
/// |-------------|--------|
/// | `"disabled"` | [`DisabledOracle`] |
/// | `"gemini"` | [`GeminiOracle`] |
pub fn create_oracle(config: &OracleConfig) -> Result<Box<dyn TextOracle>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledOracle)),
        "gemini" => Ok(Box::new(GeminiOracle::new(config)?)),
        other => bail!("Unknown oracle provider: {}", other),
    }
}
