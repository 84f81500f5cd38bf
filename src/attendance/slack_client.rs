//! Slack Web API client used to acknowledge attendance messages.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::SlackConfig;

#[derive(Debug, thiserror::Error)]
pub enum SlackClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Slack API returned status {0}")]
    Status(u16),

    #[error("Slack API error: {0}")]
    Api(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Outbound message-platform operations
#[async_trait]
pub trait SlackApi: Send + Sync {
    /// Adds an emoji reaction (name without colons) to a message.
    async fn add_reaction(&self, channel: &str, ts: &str, name: &str) -> Result<(), SlackClientError>;

    /// Posts a message, threaded under `thread_ts` when given.
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<(), SlackClientError>;
}

/// Envelope shared by every Web API response
#[derive(Debug, Deserialize)]
struct SlackApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// `reqwest` implementation of [`SlackApi`] authenticated with a bot token
#[derive(Debug, Clone)]
pub struct SlackWebClient {
    http: Client,
    api_base: String,
    bot_token: String,
}

impl SlackWebClient {
    pub fn new(api_base: impl Into<String>, bot_token: impl Into<String>) -> Result<Self, SlackClientError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| SlackClientError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
        })
    }

    async fn call(&self, method: &str, body: serde_json::Value) -> Result<(), SlackClientError> {
        let url = format!("{}/{}", self.api_base, method);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.bot_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| SlackClientError::Network(format!("{} request failed: {}", method, e)))?;

        if !response.status().is_success() {
            return Err(SlackClientError::Status(response.status().as_u16()));
        }

        let envelope: SlackApiResponse = response.json().await.map_err(|e| {
            SlackClientError::InvalidResponse(format!("Failed to parse {} response: {}", method, e))
        })?;

        if envelope.ok {
            debug!(method, "Slack API call succeeded");
            return Ok(());
        }

        Err(SlackClientError::Api(
            envelope.error.unwrap_or_else(|| "unknown_error".to_string()),
        ))
    }
}

#[async_trait]
impl SlackApi for SlackWebClient {
    async fn add_reaction(&self, channel: &str, ts: &str, name: &str) -> Result<(), SlackClientError> {
        match self
            .call(
                "reactions.add",
                json!({ "channel": channel, "timestamp": ts, "name": name }),
            )
            .await
        {
            // Redelivered events may try to react twice.
            Err(SlackClientError::Api(code)) if code == "already_reacted" => Ok(()),
            other => other,
        }
    }

    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<(), SlackClientError> {
        let mut body = json!({ "channel": channel, "text": text });
        if let Some(thread_ts) = thread_ts {
            body["thread_ts"] = json!(thread_ts);
        }
        self.call("chat.postMessage", body).await
    }
}

/// Client used when no bot token is configured; every call succeeds silently.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSlackClient;

#[async_trait]
impl SlackApi for NoopSlackClient {
    async fn add_reaction(&self, channel: &str, ts: &str, name: &str) -> Result<(), SlackClientError> {
        debug!(channel, ts, name, "Slack bot token not configured; skipping reaction");
        Ok(())
    }

    async fn post_message(
        &self,
        channel: &str,
        _text: &str,
        _thread_ts: Option<&str>,
    ) -> Result<(), SlackClientError> {
        debug!(channel, "Slack bot token not configured; skipping message");
        Ok(())
    }
}

/// Builds the Web API client from configuration, falling back to [`NoopSlackClient`].
pub fn client_from_config(config: &SlackConfig) -> Result<Arc<dyn SlackApi>, SlackClientError> {
    match config.bot_token.as_deref().filter(|token| !token.is_empty()) {
        Some(token) => Ok(Arc::new(SlackWebClient::new(config.api_base.clone(), token)?)),
        None => Ok(Arc::new(NoopSlackClient)),
    }
}
