//! Mock LLM Provider: deterministic replies for running without a model server.

use crate::api_types::{Message, MessagesResponse, Role};
use crate::llm::{CompletionParams, LlmClient};
use anyhow::Result;

#[derive(Debug, Clone)]
pub struct MockProvider {
    model: String,
}

impl MockProvider {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for MockProvider {
    fn name(&self) -> &str {
        "Mock"
    }

    async fn complete(
        &self,
        _system: &str,
        messages: Vec<Message>,
        _params: CompletionParams,
    ) -> Result<MessagesResponse> {
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        let last = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("");
        Ok(MessagesResponse {
            text: format!("(Mock {}) I received: {}", self.model, last),
            stop_reason: Some("end_turn".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_complete() {
        let provider = MockProvider::new("test-model");
        let resp = provider
            .complete(
                "system",
                vec![Message::user("first"), Message::assistant("ok"), Message::user("second")],
                CompletionParams::default(),
            )
            .await
            .unwrap();
        assert!(resp.text.contains("test-model"));
        assert!(resp.text.ends_with("second"));
    }
}
