//! Backoff for calls to the model server.
//!
//! Transient failures (408, 429, 5xx, network errors) are retried on the
//! `[llm.retry]` schedule. Anything else fails on the first attempt. Both
//! outcomes surface as [`UpstreamError`], which the controller reports as
//! `CompanionError::UpstreamUnavailable`.

use kitsune_core::{CompanionError, RetrySettings};
use reqwest::{Response, StatusCode};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Attempts including the first, never below 1.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.attempts.max(1),
            initial_delay: Duration::from_millis(settings.initial_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms.max(settings.initial_delay_ms)),
            backoff_factor: settings.backoff_factor.max(1.0),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl RetryConfig {
    /// Pause after failed attempt `attempt` (1-based) before the next one.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// The server answered with a status that retrying will not fix.
    #[error("{provider} rejected the request ({status}): {body}")]
    Rejected {
        provider: String,
        status: StatusCode,
        body: String,
    },
    #[error("{provider} unavailable after {attempts} attempt(s): {last}")]
    Exhausted {
        provider: String,
        attempts: u32,
        last: String,
    },
}

impl UpstreamError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            UpstreamError::Rejected { status, .. } => Some(*status),
            UpstreamError::Exhausted { .. } => None,
        }
    }
}

impl From<UpstreamError> for CompanionError {
    fn from(e: UpstreamError) -> Self {
        CompanionError::UpstreamUnavailable(e.to_string())
    }
}

fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

/// Send the request built by `operation` until it succeeds, hits a
/// non-transient status, or the attempts run out.
pub async fn with_retry<F, Fut>(
    config: &RetryConfig,
    provider: &str,
    operation: F,
) -> Result<Response, UpstreamError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = reqwest::Result<Response>>,
{
    let attempts = config.max_attempts.max(1);
    let mut last = String::new();

    for attempt in 1..=attempts {
        let failure = match operation().await {
            Ok(resp) if resp.status().is_success() => {
                if attempt > 1 {
                    tracing::info!("{} answered on attempt {}", provider, attempt);
                }
                return Ok(resp);
            }
            Ok(resp) => {
                let status = resp.status();
                let body: String = resp
                    .text()
                    .await
                    .unwrap_or_default()
                    .chars()
                    .take(200)
                    .collect();
                if !is_transient(status) {
                    return Err(UpstreamError::Rejected {
                        provider: provider.to_string(),
                        status,
                        body,
                    });
                }
                format!("{}: {}", status, body)
            }
            Err(e) => e.to_string(),
        };

        tracing::warn!("{} attempt {}/{} failed: {}", provider, attempt, attempts, failure);
        last = failure;
        if attempt < attempts {
            tokio::time::sleep(config.delay_after(attempt)).await;
        }
    }

    Err(UpstreamError::Exhausted {
        provider: provider.to_string(),
        attempts,
        last,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast(attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts: attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            backoff_factor: 2.0,
        }
    }

    #[test]
    fn test_transient_statuses() {
        assert!(is_transient(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_transient(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_transient(StatusCode::REQUEST_TIMEOUT));
        assert!(!is_transient(StatusCode::BAD_REQUEST));
        assert!(!is_transient(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_config_follows_settings() {
        let settings = RetrySettings {
            attempts: 0,
            initial_delay_ms: 200,
            max_delay_ms: 100,
            backoff_factor: 0.5,
        };
        let config = RetryConfig::from(&settings);
        assert_eq!(config.max_attempts, 1);
        assert_eq!(config.max_delay, Duration::from_millis(200));
        assert_eq!(config.backoff_factor, 1.0);
        assert_eq!(RetryConfig::default().max_attempts, 3);
    }

    #[test]
    fn test_backoff_schedule_doubles_then_caps() {
        let config = RetryConfig::from(&RetrySettings {
            attempts: 5,
            initial_delay_ms: 500,
            max_delay_ms: 1_500,
            backoff_factor: 2.0,
        });
        assert_eq!(config.delay_after(1), Duration::from_millis(500));
        assert_eq!(config.delay_after(2), Duration::from_millis(1_000));
        assert_eq!(config.delay_after(3), Duration::from_millis(1_500));
        assert_eq!(config.delay_after(40), Duration::from_millis(1_500));
    }

    #[tokio::test]
    async fn test_transient_failures_then_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/flaky", server.uri());
        let resp = with_retry(&fast(3), "test", || client.get(&url).send())
            .await
            .unwrap();
        assert!(resp.status().is_success());
    }

    #[tokio::test]
    async fn test_rejected_status_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/auth", server.uri());
        let err = with_retry(&fast(3), "Kitsune", || client.get(&url).send())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert!(err.to_string().contains("bad key"));
    }

    #[tokio::test]
    async fn test_exhausted_attempts_become_upstream_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/down", server.uri());
        let err = with_retry(&fast(3), "Kitsune", || client.get(&url).send())
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Exhausted { attempts: 3, .. }));

        let companion: CompanionError = err.into();
        match companion {
            CompanionError::UpstreamUnavailable(msg) => {
                assert!(msg.contains("Kitsune unavailable after 3 attempt(s)"));
                assert!(msg.contains("500"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
