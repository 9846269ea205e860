mod channel;
mod email;
pub mod format;
mod hub;
mod retry;
mod slack;

pub use channel::{Notification, Notifier, NotifyError};
pub use email::EmailNotifier;
pub use hub::{DeliveryReport, NotificationHub, DEFAULT_NOTIFY_TIMEOUT};
pub use retry::RetryNotifier;
pub use slack::SlackNotifier;
