use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::channel::{Notification, Notifier, NotifyError};
use super::format::{email_html, email_subject};
use crate::probe::REQUEST_TIMEOUT;

pub struct EmailNotifier {
    from: String,
    recipients: Vec<String>,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailNotifier {
    pub fn new(
        host: &str,
        port: u16,
        username: &str,
        password: &str,
        from: String,
        recipients: Vec<String>,
    ) -> Result<Self, NotifyError> {
        let creds = Credentials::new(username.to_string(), password.to_string());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| NotifyError(e.to_string()))?
            .port(port)
            .credentials(creds)
            .timeout(Some(REQUEST_TIMEOUT))
            .build();
        Ok(Self {
            from,
            recipients,
            transport,
        })
    }

    /// Per-message recipients win over the configured list.
    pub fn recipients_for<'a>(&'a self, notification: &'a Notification) -> &'a [String] {
        if notification.recipients.is_empty() {
            &self.recipients
        } else {
            &notification.recipients
        }
    }

    fn build(&self, notification: &Notification, to: &[String]) -> Result<Message, NotifyError> {
        let mut builder = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e: lettre::address::AddressError| NotifyError(e.to_string()))?,
            )
            .subject(email_subject(notification))
            .header(ContentType::TEXT_HTML);
        for addr in to {
            builder = builder.to(addr
                .parse()
                .map_err(|e: lettre::address::AddressError| NotifyError(e.to_string()))?);
        }
        builder
            .body(email_html(notification))
            .map_err(|e| NotifyError(e.to_string()))
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn name(&self) -> &str {
        "email"
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let to = self.recipients_for(notification);
        if to.is_empty() {
            tracing::debug!(title = %notification.title, "no email recipients, skipping");
            return Ok(());
        }

        let email = self.build(notification, to)?;
        self.transport
            .send(email)
            .await
            .map_err(|e| NotifyError(e.to_string()))?;

        tracing::info!(title = %notification.title, recipients = to.len(), "email notification sent");
        Ok(())
    }

    async fn test_connection(&self) -> Result<(), NotifyError> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(NotifyError("smtp server rejected NOOP".into())),
            Err(e) => Err(NotifyError(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_common::Severity;

    fn notifier(recipients: Vec<String>) -> EmailNotifier {
        EmailNotifier::new(
            "smtp.example.com",
            587,
            "user",
            "pass",
            "vigil@example.com".into(),
            recipients,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn skips_when_no_recipients() {
        let n = notifier(Vec::new());
        let note = Notification::new("t", "m", Severity::Info);
        assert!(n.send(&note).await.is_ok());
    }

    #[tokio::test]
    async fn notification_recipients_override_configured() {
        let n = notifier(vec!["ops@example.com".into()]);
        let plain = Notification::new("t", "m", Severity::Info);
        assert_eq!(n.recipients_for(&plain), ["ops@example.com".to_string()]);
        let targeted = plain.clone().with_recipients(vec!["oncall@example.com".into()]);
        assert_eq!(n.recipients_for(&targeted), ["oncall@example.com".to_string()]);
    }

    #[tokio::test]
    async fn builds_html_message_with_subject() {
        let n = notifier(vec!["ops@example.com".into()]);
        let note = Notification::new("Ledger down", "slot stalled", Severity::Critical);
        let msg = n.build(&note, &n.recipients).unwrap();
        let raw = String::from_utf8(msg.formatted()).unwrap();
        assert!(raw.contains("Subject: [CRITICAL] Ledger down"));
        assert!(raw.contains("text/html"));
    }

    #[tokio::test]
    async fn bad_recipient_is_an_error() {
        let n = notifier(Vec::new());
        let note = Notification::new("t", "m", Severity::Info).with_recipients(vec!["not an address".into()]);
        assert!(n.send(&note).await.is_err());
    }
}
