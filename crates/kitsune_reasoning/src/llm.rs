use crate::api_types::{Message, MessagesResponse};
use anyhow::Result;
use async_trait::async_trait;

/// Sampling parameters sent with every completion.
#[derive(Debug, Clone)]
pub struct CompletionParams {
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature (0.0 - 2.0)
    pub temperature: f32,
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self {
            max_tokens: 500,
            temperature: 0.7,
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Short provider label for logs.
    fn name(&self) -> &str;

    /// Send the system prompt plus a role-tagged conversation and return the
    /// assistant's reply.
    async fn complete(
        &self,
        system: &str,
        messages: Vec<Message>,
        params: CompletionParams,
    ) -> Result<MessagesResponse>;

    /// Cheap reachability check. Providers without a health route report Ok.
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
