use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use super::channel::{Notification, Notifier, NotifyError};
use crate::metrics::MonitorMetrics;

/// Upper bound on one channel's delivery, retries included.
pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl DeliveryReport {
    pub fn all_delivered(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Delivers one notification to every configured channel concurrently.
/// A failing or hung channel is logged and reported, never propagated.
#[derive(Clone)]
pub struct NotificationHub {
    channels: Vec<Arc<dyn Notifier>>,
    metrics: Arc<MonitorMetrics>,
    timeout: Duration,
}

impl NotificationHub {
    pub fn new(metrics: Arc<MonitorMetrics>) -> Self {
        Self {
            channels: Vec::new(),
            metrics,
            timeout: DEFAULT_NOTIFY_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn bounded<F>(&self, call: F) -> Result<(), NotifyError>
    where
        F: Future<Output = Result<(), NotifyError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(outcome) => outcome,
            Err(_) => Err(NotifyError(format!("timed out after {}ms", self.timeout.as_millis()))),
        }
    }

    pub fn with_channel(mut self, channel: Arc<dyn Notifier>) -> Self {
        self.channels.push(channel);
        self
    }

    pub fn channel_names(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.name().to_string()).collect()
    }

    pub async fn send(&self, notification: &Notification) -> DeliveryReport {
        self.deliver(self.channels.iter(), notification).await
    }

    /// Delivers only to the named channels. An empty list, or one naming no
    /// configured channel, falls back to every channel.
    pub async fn send_to(&self, notification: &Notification, names: &[String]) -> DeliveryReport {
        let targeted = self.channels.iter().filter(|c| names.iter().any(|n| n == c.name()));
        if targeted.clone().next().is_none() {
            if !names.is_empty() {
                tracing::warn!(channels = ?names, title = %notification.title, "no requested channel configured, sending to all");
            }
            return self.send(notification).await;
        }
        self.deliver(targeted, notification).await
    }

    async fn deliver<'a>(
        &self,
        channels: impl Iterator<Item = &'a Arc<dyn Notifier>>,
        notification: &Notification,
    ) -> DeliveryReport {
        let outcomes = join_all(channels.map(|c| async move {
            (c.name().to_string(), self.bounded(c.send(notification)).await)
        }))
        .await;

        let mut report = DeliveryReport::default();
        for (name, outcome) in outcomes {
            match outcome {
                Ok(()) => {
                    self.metrics.inc_notifications_sent();
                    report.delivered.push(name);
                }
                Err(e) => {
                    self.metrics.inc_notifications_failed();
                    tracing::error!(channel = %name, title = %notification.title, error = %e, "notification delivery failed");
                    report.failed.push((name, e.to_string()));
                }
            }
        }
        report
    }

    /// Checks each channel independently. Meant for startup, not the hot path.
    pub async fn test_connections(&self) -> BTreeMap<String, bool> {
        let outcomes = join_all(self.channels.iter().map(|c| async move {
            let result = self.bounded(c.test_connection()).await;
            if let Err(ref e) = result {
                tracing::error!(channel = %c.name(), error = %e, "channel connection test failed");
            }
            (c.name().to_string(), result.is_ok())
        }))
        .await;
        outcomes.into_iter().collect()
    }
}
