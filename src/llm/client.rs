use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::llm::parse::parse_correction_response;
use crate::llm::prompts::{build_chunk_payload, CORRECTION_SYSTEM_PROMPT};
use crate::models::CorrectionRecord;

/// Configuration for the correction oracle client
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// API key (from ANTHROPIC_API_KEY env var)
    pub api_key: String,
    /// Model to use (e.g., "claude-sonnet-4-20250514")
    pub model: String,
    /// API base URL
    pub base_url: String,
    /// Temperature (0-1, lower = more deterministic)
    pub temperature: f64,
    /// Maximum tokens in response
    pub max_tokens: u32,
    /// Per-request timeout in seconds; a timed-out chunk degrades alone
    pub request_timeout_secs: u64,
    /// Retries per request on transport failure
    pub max_retries: u32,
    /// Initial retry delay in milliseconds, doubled per attempt
    pub retry_delay_ms: u64,
}

impl OracleConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .context("ANTHROPIC_API_KEY environment variable not set")?;

        Ok(Self::new(api_key, "claude-sonnet-4-20250514".to_string()))
    }

    /// Create with custom settings
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            base_url: "https://api.anthropic.com".to_string(),
            temperature: 0.1,
            max_tokens: 4096,
            request_timeout_secs: 120,
            max_retries: 2,
            retry_delay_ms: 2_000,
        }
    }
}

/// Correction oracle client
#[derive(Clone)]
pub struct OracleClient {
    client: Client,
    config: OracleConfig,
}

impl OracleClient {
    pub fn new(config: OracleConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Send one chunk for correction and parse the structured response.
    ///
    /// Transport failures retry internally; a final failure or an entirely
    /// unparseable response surfaces as an error the orchestrator converts
    /// into a per-chunk degrade.
    pub async fn correct_chunk(
        &self,
        records: &[CorrectionRecord],
    ) -> Result<Vec<CorrectionRecord>> {
        let payload = build_chunk_payload(records);
        let body = self.send_message(CORRECTION_SYSTEM_PROMPT, &payload).await?;
        let parsed = parse_correction_response(&body)
            .context("Oracle response contained no parseable records")?;
        Ok(parsed)
    }

    /// Send a message to the oracle and get the response text.
    ///
    /// Retries transport failures with exponential backoff; each attempt
    /// carries its own timeout so one slow request cannot hold the overall
    /// gather hostage.
    pub async fn send_message(&self, system: &str, user: &str) -> Result<String> {
        let max_attempts = 1 + self.config.max_retries;
        let mut attempt = 1;

        loop {
            match self.send_once(system, user).await {
                Ok(text) => return Ok(text),
                Err(e) if attempt < max_attempts => {
                    let delay = self.config.retry_delay_ms * (1 << (attempt - 1));
                    warn!(
                        "Oracle attempt {}/{} failed, retry in {}ms: {:#}",
                        attempt, max_attempts, delay, e
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once(&self, system: &str, user: &str) -> Result<String> {
        let request = OracleRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: Some(self.config.temperature),
            system: Some(system.to_string()),
            messages: vec![Message {
                role: "user".to_string(),
                content: user.to_string(),
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.base_url))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .timeout(Duration::from_secs(self.config.request_timeout_secs))
            .json(&request)
            .send()
            .await
            .context("Failed to send request to oracle")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Oracle API error: {} - {}", status, body);
        }

        let response: OracleResponse = response
            .json()
            .await
            .context("Failed to parse oracle API response")?;

        // Extract text from the first content block
        response
            .content
            .first()
            .and_then(|c| {
                if c.content_type == "text" {
                    Some(c.text.clone())
                } else {
                    None
                }
            })
            .context("No text content in oracle response")
    }
}

#[derive(Debug, Serialize)]
struct OracleRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OracleResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = OracleConfig::new("key".to_string(), "model".to_string());

        assert_eq!(config.request_timeout_secs, 120);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.retry_delay_ms, 2_000);
        assert_eq!(config.base_url, "https://api.anthropic.com");
    }
}
