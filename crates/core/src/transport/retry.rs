//! Bounded retry with exponential backoff around any [`Transport`].

use crate::transport::base::{ChatRequest, Transport, TransportError};
use async_trait::async_trait;
use cf_protocol::config_models::RetrySettings;
use std::sync::Arc;
use std::time::Duration;

/// How many attempts to make and how long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay after the failed attempt with zero-based index `attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(RetrySettings::default())
    }
}

impl From<RetrySettings> for RetryPolicy {
    fn from(settings: RetrySettings) -> Self {
        Self::new(
            settings.max_attempts,
            Duration::from_millis(settings.base_delay_ms),
        )
    }
}

/// Wraps a transport and retries transient failures.
///
/// Non-transient errors are returned immediately. When the budget is spent the
/// last error is surfaced unchanged, so the caller sees a single terminal error.
pub struct RetryingTransport {
    inner: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl RetryingTransport {
    pub fn new(inner: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }
}

#[async_trait]
impl Transport for RetryingTransport {
    async fn is_configured(&self) -> bool {
        self.inner.is_configured().await
    }

    async fn chat(&self, request: &ChatRequest) -> Result<String, TransportError> {
        let mut attempt = 0;
        loop {
            match self.inner.chat(request).await {
                Ok(text) => return Ok(text),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    if attempt + 1 >= self.policy.max_attempts {
                        tracing::error!(
                            mode = request.mode.as_str(),
                            attempts = attempt + 1,
                            error = %e,
                            "transport retries exhausted"
                        );
                        return Err(e);
                    }
                    let delay = self.policy.backoff(attempt);
                    tracing::warn!(
                        mode = request.mode.as_str(),
                        retry_attempt = attempt + 1,
                        retry_in_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying request after transient error"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::base::ChatMode;
    use crate::transport::mock::MockTransport;

    fn unreachable() -> TransportError {
        TransportError::Unreachable("connection refused".to_string())
    }

    #[test]
    fn test_backoff_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.backoff(0), Duration::from_millis(1000));
        assert_eq!(policy.backoff(1), Duration::from_millis(2000));
        assert_eq!(policy.backoff(2), Duration::from_millis(4000));
    }

    #[test]
    fn test_policy_requires_one_attempt() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let mock = Arc::new(MockTransport::new(vec![
            Err(unreachable()),
            Err(unreachable()),
            Ok("third time lucky".to_string()),
        ]));
        let transport = RetryingTransport::new(mock.clone(), RetryPolicy::new(3, Duration::ZERO));

        let reply = transport
            .chat(&ChatRequest::new("hi", ChatMode::Chat))
            .await
            .unwrap();

        assert_eq!(reply, "third time lucky");
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_surfaces_last_error() {
        let mock = Arc::new(MockTransport::new(vec![
            Err(unreachable()),
            Err(unreachable()),
            Err(TransportError::Provider {
                status: 502,
                body: "bad gateway".to_string(),
            }),
            Ok("never reached".to_string()),
        ]));
        let transport = RetryingTransport::new(mock.clone(), RetryPolicy::new(3, Duration::ZERO));

        let result = transport.chat(&ChatRequest::new("hi", ChatMode::Chat)).await;

        assert!(matches!(
            result,
            Err(TransportError::Provider { status: 502, .. })
        ));
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_non_transient_error_not_retried() {
        let mock = Arc::new(MockTransport::new(vec![Err(TransportError::Provider {
            status: 401,
            body: "unauthorized".to_string(),
        })]));
        let transport = RetryingTransport::new(mock.clone(), RetryPolicy::new(3, Duration::ZERO));

        let result = transport.chat(&ChatRequest::new("hi", ChatMode::Chat)).await;

        assert!(matches!(
            result,
            Err(TransportError::Provider { status: 401, .. })
        ));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_between_attempts() {
        let mock = Arc::new(MockTransport::new(vec![
            Err(unreachable()),
            Err(unreachable()),
            Ok("ok".to_string()),
        ]));
        let transport = RetryingTransport::new(mock, RetryPolicy::default());

        let started = tokio::time::Instant::now();
        transport
            .chat(&ChatRequest::new("hi", ChatMode::Chat))
            .await
            .unwrap();

        // 1s after the first failure, 2s after the second.
        assert!(started.elapsed() >= Duration::from_millis(3000));
    }
}
