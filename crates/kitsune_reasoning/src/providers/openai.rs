use crate::api_types::{Message, MessagesResponse};
use crate::llm::{CompletionParams, LlmClient};
use crate::retry::{with_retry, RetryConfig};
use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

/// Any server speaking the OpenAI `/chat/completions` dialect. Ollama exposes
/// it under `http://localhost:11434/v1`.
#[derive(Debug, Clone)]
pub struct OpenAiCompatClient {
    name: String,
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    retry: RetryConfig,
}

impl OpenAiCompatClient {
    pub fn new(
        name: &str,
        endpoint: &str,
        model: &str,
        api_key: Option<String>,
        timeout: Duration,
        retry: RetryConfig,
    ) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            client: Client::builder().timeout(timeout).build()?,
            base_url: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            retry,
        })
    }

    fn request_body(&self, system: &str, messages: &[Message], params: &CompletionParams) -> Value {
        let mut wire = Vec::with_capacity(messages.len() + 1);
        if !system.is_empty() {
            wire.push(json!({"role": "system", "content": system}));
        }
        for msg in messages {
            wire.push(json!({"role": msg.role.as_str(), "content": msg.content}));
        }
        json!({
            "model": self.model,
            "messages": wire,
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
            "stream": false,
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiCompatClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        system: &str,
        messages: Vec<Message>,
        params: CompletionParams,
    ) -> Result<MessagesResponse> {
        let body = self.request_body(system, &messages, &params);
        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!("{} request to {} with {} messages", self.name, url, messages.len());

        let client = &self.client;
        let api_key = self.api_key.as_deref();
        let response = with_retry(&self.retry, &self.name, || {
            let mut req = client.post(&url).json(&body);
            if let Some(key) = api_key {
                req = req.bearer_auth(key);
            }
            req.send()
        })
        .await?;

        let resp_json: Value = response.json().await?;
        parse_openai_response(&resp_json)
    }

    async fn health_check(&self) -> Result<()> {
        let url = format!("{}/models", self.base_url);
        let mut req = self.client.get(&url).timeout(Duration::from_secs(5));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req
            .send()
            .await
            .with_context(|| format!("Cannot reach {}", url))?;
        if !resp.status().is_success() {
            anyhow::bail!("{} health check failed with status {}", self.name, resp.status());
        }
        Ok(())
    }
}

pub(crate) fn parse_openai_response(resp_json: &Value) -> Result<MessagesResponse> {
    let choice = &resp_json["choices"][0];
    let finish_reason = choice["finish_reason"].as_str().map(|s| s.to_string());
    let text = choice["message"]["content"]
        .as_str()
        .context("Response has no choices[0].message.content")?
        .to_string();

    Ok(MessagesResponse {
        text,
        stop_reason: finish_reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(endpoint: &str, key: Option<&str>) -> OpenAiCompatClient {
        let retry = RetryConfig {
            max_attempts: 1,
            ..RetryConfig::default()
        };
        OpenAiCompatClient::new(
            "Ollama",
            endpoint,
            "llama3",
            key.map(str::to_string),
            Duration::from_secs(5),
            retry,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_text_response() {
        let resp = json!({
            "choices": [{
                "message": {"role": "assistant", "content": "Yip! Hello."},
                "finish_reason": "stop"
            }]
        });
        let parsed = parse_openai_response(&resp).unwrap();
        assert_eq!(parsed.text, "Yip! Hello.");
        assert_eq!(parsed.stop_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn test_parse_missing_content_is_error() {
        assert!(parse_openai_response(&json!({"choices": []})).is_err());
        assert!(parse_openai_response(&json!({"error": "boom"})).is_err());
    }

    #[test]
    fn test_request_body_puts_system_first() {
        let c = client("http://localhost:11434/v1/", None);
        assert_eq!(c.base_url, "http://localhost:11434/v1");
        let body = c.request_body(
            "be kind",
            &[Message::user("hi"), Message::assistant("hello")],
            &CompletionParams::default(),
        );
        let msgs = body["messages"].as_array().unwrap();
        assert_eq!(msgs.len(), 3);
        assert_eq!(msgs[0]["role"], "system");
        assert_eq!(msgs[2]["role"], "assistant");
        assert_eq!(body["model"], "llama3");
    }

    #[tokio::test]
    async fn test_complete_against_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({"model": "llama3", "max_tokens": 500})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "Hi there"}, "finish_reason": "stop"}]
            })))
            .mount(&server)
            .await;

        let resp = client(&server.uri(), Some("sk-test"))
            .complete("sys", vec![Message::user("hello")], CompletionParams::default())
            .await
            .unwrap();
        assert_eq!(resp.text, "Hi there");
    }

    #[tokio::test]
    async fn test_health_check_uses_models_route() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&server)
            .await;
        assert!(client(&server.uri(), None).health_check().await.is_ok());
    }
}
