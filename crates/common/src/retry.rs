use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            backoff_factor: 2.0,
        }
    }
}

impl RetryConfig {
    /// `max_retries` extra attempts after the first, doubling from `base_delay_ms`.
    pub fn exponential(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_retries + 1,
            initial_delay: Duration::from_millis(base_delay_ms),
            backoff_factor: 2.0,
        }
    }
}

/// Runs `f` until it succeeds or `max_attempts` is exhausted, returning the
/// last error. A config with zero attempts still runs once.
pub async fn retry_async<F, Fut, T, E>(config: &RetryConfig, label: &str, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let attempts = config.max_attempts.max(1);
    let mut delay = config.initial_delay;
    let mut attempt = 1;

    loop {
        match f().await {
            Ok(v) => return Ok(v),
            Err(e) => {
                tracing::warn!(
                    operation = label,
                    attempt,
                    max_attempts = attempts,
                    error = %e,
                    "attempt failed"
                );
                if attempt >= attempts {
                    return Err(e);
                }
                tokio::time::sleep(delay).await;
                delay = Duration::from_secs_f64(delay.as_secs_f64() * config.backoff_factor);
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_on_first_try() {
        let config = RetryConfig::default();
        let result = retry_async(&config, "test", || async { Ok::<_, &str>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn succeeds_after_retries() {
        let counter = AtomicU32::new(0);
        let config = RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            backoff_factor: 1.0,
        };

        let result: Result<u32, &str> = retry_async(&config, "test", || {
            let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if attempt < 3 {
                    Err("not yet")
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn returns_last_error_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let config = RetryConfig::exponential(1, 1);

        let result: Result<(), String> = retry_async(&config, "test", || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Err(format!("fail #{n}")) }
        })
        .await;

        assert_eq!(result.unwrap_err(), "fail #2");
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn zero_attempts_still_runs_once() {
        let counter = AtomicU32::new(0);
        let config = RetryConfig {
            max_attempts: 0,
            ..RetryConfig::default()
        };
        let _: Result<(), &str> = retry_async(&config, "test", || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err("nope") }
        })
        .await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
