use async_trait::async_trait;
use vigil_common::retry::{retry_async, RetryConfig};

use super::channel::{Notification, Notifier, NotifyError};

/// Retries a channel with exponential backoff: `base_delay_ms * 2^attempt`.
pub struct RetryNotifier<N: Notifier> {
    inner: N,
    config: RetryConfig,
}

impl<N: Notifier> RetryNotifier<N> {
    pub fn new(inner: N, max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            inner,
            config: RetryConfig::exponential(max_retries, base_delay_ms),
        }
    }
}

#[async_trait]
impl<N: Notifier> Notifier for RetryNotifier<N> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        retry_async(&self.config, self.inner.name(), || self.inner.send(notification)).await
    }

    async fn test_connection(&self) -> Result<(), NotifyError> {
        self.inner.test_connection().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FlakyNotifier;
    use vigil_common::Severity;

    fn note() -> Notification {
        Notification::new("t", "m", Severity::Warning)
    }

    #[tokio::test]
    async fn succeeds_on_first_try() {
        let retry = RetryNotifier::new(FlakyNotifier::new(0), 3, 1);
        assert!(retry.send(&note()).await.is_ok());
    }

    #[tokio::test]
    async fn succeeds_after_retries() {
        let retry = RetryNotifier::new(FlakyNotifier::new(2), 3, 1);
        assert!(retry.send(&note()).await.is_ok());
    }

    #[tokio::test]
    async fn fails_after_max_retries() {
        let inner = FlakyNotifier::new(10);
        let retry = RetryNotifier::new(inner, 2, 1);
        let err = retry.send(&note()).await.unwrap_err();
        assert_eq!(err.to_string(), "notify: fail #3");
    }

    #[tokio::test]
    async fn keeps_inner_name() {
        let retry = RetryNotifier::new(FlakyNotifier::new(0), 1, 1);
        assert_eq!(retry.name(), "flaky");
    }
}
