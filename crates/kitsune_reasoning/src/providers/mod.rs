//! Language-model backends and the factory that picks one from config.

pub mod kitsune;
pub mod mock;
pub mod openai;

pub use kitsune::KitsuneServerClient;
pub use mock::MockProvider;
pub use openai::OpenAiCompatClient;

use crate::llm::LlmClient;
use crate::retry::RetryConfig;
use anyhow::Result;
use kitsune_core::LlmConfig;
use std::time::Duration;

/// Build the client named by `config.provider`.
pub fn build_client(config: &LlmConfig) -> Result<Box<dyn LlmClient>> {
    let timeout = Duration::from_secs(config.timeout_secs.max(1));
    let retry = RetryConfig::from(&config.retry);

    let client: Box<dyn LlmClient> = match config.provider.to_lowercase().as_str() {
        "kitsune" | "chat" => Box::new(KitsuneServerClient::new(&config.endpoint, timeout, retry)?),
        "ollama" => Box::new(OpenAiCompatClient::new(
            "Ollama",
            &config.endpoint,
            &config.model,
            None,
            timeout,
            retry,
        )?),
        "openai" => Box::new(OpenAiCompatClient::new(
            "OpenAI",
            &config.endpoint,
            &config.model,
            std::env::var("OPENAI_API_KEY").ok(),
            timeout,
            retry,
        )?),
        "mock" => Box::new(MockProvider::new(&config.model)),
        other => anyhow::bail!(
            "Unknown LLM provider `{}` (expected kitsune, ollama, openai or mock)",
            other
        ),
    };
    tracing::info!(
        "Using {} provider at {} (model {})",
        client.name(),
        config.endpoint,
        config.model
    );
    Ok(client)
}
