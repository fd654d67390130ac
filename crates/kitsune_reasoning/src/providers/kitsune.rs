//! Client for the plain Kitsune chat server.
//!
//! `GET /health` answers 200 when the model is loaded; `POST /chat` takes the
//! new message plus history and answers `{"response": "..."}`.

use crate::api_types::{Message, MessagesResponse};
use crate::llm::{CompletionParams, LlmClient};
use crate::retry::{with_retry, RetryConfig};
use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct KitsuneServerClient {
    client: Client,
    base_url: String,
    retry: RetryConfig,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    history: &'a [Message],
    system: &'a str,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    response: String,
}

impl KitsuneServerClient {
    pub fn new(endpoint: &str, timeout: Duration, retry: RetryConfig) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: endpoint.trim_end_matches('/').to_string(),
            retry,
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for KitsuneServerClient {
    fn name(&self) -> &str {
        "Kitsune"
    }

    async fn complete(
        &self,
        system: &str,
        mut messages: Vec<Message>,
        params: CompletionParams,
    ) -> Result<MessagesResponse> {
        // The server takes the newest user message separately from the history.
        let latest = messages
            .pop()
            .context("No message to send to the Kitsune server")?;
        let body = ChatRequest {
            message: &latest.content,
            history: &messages,
            system,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        };

        let url = format!("{}/chat", self.base_url);
        let client = &self.client;
        let response =
            with_retry(&self.retry, "Kitsune", || client.post(&url).json(&body).send()).await?;

        let parsed: ChatResponse = response
            .json()
            .await
            .context("Kitsune server returned an unexpected body")?;
        Ok(MessagesResponse {
            text: parsed.response,
            stop_reason: None,
        })
    }

    async fn health_check(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);
        let resp = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .with_context(|| format!("Cannot reach {}", url))?;
        tracing::debug!("Health check status: {}", resp.status());
        if !resp.status().is_success() {
            anyhow::bail!("Health check failed with status {}", resp.status());
        }
        Ok(())
    }
}
