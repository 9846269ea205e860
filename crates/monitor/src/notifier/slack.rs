use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::channel::{Notification, Notifier, NotifyError};
use super::format::slack_blocks;
use crate::probe::{http_client, REQUEST_TIMEOUT};

const DEFAULT_API_BASE: &str = "https://slack.com/api";

/// Team-chat channel backed by the Slack Web API.
pub struct SlackNotifier {
    token: String,
    default_channel: String,
    api_base: String,
    client: Client,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl SlackNotifier {
    pub fn new(token: String, default_channel: String) -> Self {
        Self {
            token,
            default_channel,
            api_base: DEFAULT_API_BASE.to_string(),
            client: http_client(REQUEST_TIMEOUT),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn payload(&self, notification: &Notification) -> serde_json::Value {
        let channel = notification
            .channel
            .as_deref()
            .unwrap_or(&self.default_channel);
        serde_json::json!({
            "channel": channel,
            "blocks": slack_blocks(notification),
            "text": &notification.message,
        })
    }

    async fn call(&self, method: &str, body: &serde_json::Value) -> Result<(), NotifyError> {
        let resp: ApiResponse = self
            .client
            .post(format!("{}/{method}", self.api_base))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| NotifyError(e.to_string()))?
            .error_for_status()
            .map_err(|e| NotifyError(e.to_string()))?
            .json()
            .await
            .map_err(|e| NotifyError(e.to_string()))?;

        if !resp.ok {
            return Err(NotifyError(format!(
                "{method}: {}",
                resp.error.unwrap_or_else(|| "unknown error".into())
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn name(&self) -> &str {
        "slack"
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let payload = self.payload(notification);
        self.call("chat.postMessage", &payload).await?;
        tracing::info!(title = %notification.title, channel = %payload["channel"], "slack notification sent");
        Ok(())
    }

    async fn test_connection(&self) -> Result<(), NotifyError> {
        self.call("auth.test", &serde_json::json!({})).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_common::Severity;

    #[test]
    fn payload_uses_default_channel() {
        let n = SlackNotifier::new("t".into(), "#ops".into());
        let p = n.payload(&Notification::new("Title", "Body", Severity::Info));
        assert_eq!(p["channel"], "#ops");
        assert_eq!(p["text"], "Body");
        assert_eq!(p["blocks"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn payload_honours_channel_override() {
        let n = SlackNotifier::new("t".into(), "#ops".into());
        let note = Notification::new("Title", "Body", Severity::Error).with_channel("#security");
        assert_eq!(n.payload(&note)["channel"], "#security");
    }

    #[tokio::test]
    async fn unreachable_api_is_an_error() {
        let n = SlackNotifier::new("t".into(), "#ops".into()).with_api_base("http://127.0.0.1:1");
        let err = n
            .send(&Notification::new("x", "y", Severity::Info))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("notify:"));
    }
}
