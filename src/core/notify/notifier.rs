use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::sheets::ConfigSource;

#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    #[error("Chat delivery failed: {0}")]
    Delivery(String),
}

/// Sends one HTML-formatted message to a chat.
#[async_trait]
pub trait ChatSender: Send + Sync {
    async fn send_message(&self, bot_token: &str, chat_id: &str, text: &str)
        -> Result<(), NotifyError>;
}

/// Which configured destination to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Stakeholder chat for daily lists and duty judges.
    Primary,
    /// Operator chat for sync reports.
    Admin,
}

impl Channel {
    fn config_keys(self) -> (&'static str, &'static str) {
        match self {
            Channel::Primary => ("TELEGRAM_TOKEN", "CHAT_ID"),
            Channel::Admin => ("ADMIN_TELEGRAM_TOKEN", "ADMIN_CHAT_ID"),
        }
    }
}

/// How a notification attempt ended. Never an error for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Token or chat id for the channel is missing from config.
    NotConfigured,
    Failed,
}

/// Best-effort chat notifications.
///
/// The destination is looked up in config on every call so edits to the
/// config sheet apply without a restart.
pub struct Notifier {
    config: Arc<dyn ConfigSource>,
    sender: Arc<dyn ChatSender>,
}

impl Notifier {
    pub fn new(config: Arc<dyn ConfigSource>, sender: Arc<dyn ChatSender>) -> Self {
        Self { config, sender }
    }

    pub async fn notify(&self, channel: Channel, message: &str) -> Delivery {
        let config = match self.config.read_config().await {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Error fetching notification config: {}", e);
                return Delivery::NotConfigured;
            }
        };

        let (token_key, chat_key) = channel.config_keys();
        let (Some(token), Some(chat_id)) = (config.get(token_key), config.get(chat_key)) else {
            tracing::warn!(?channel, "Notification channel is not configured");
            return Delivery::NotConfigured;
        };

        match self.sender.send_message(token, chat_id, message).await {
            Ok(()) => {
                tracing::debug!(?channel, "Notification sent");
                Delivery::Sent
            }
            Err(e) => {
                tracing::error!(?channel, "Failed to send notification: {}", e);
                Delivery::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{FakeChat, FakeSheets};

    fn configured_sheets() -> Arc<FakeSheets> {
        let sheets = Arc::new(FakeSheets::new());
        sheets.set_config("TELEGRAM_TOKEN", "main-token");
        sheets.set_config("CHAT_ID", "100");
        sheets.set_config("ADMIN_TELEGRAM_TOKEN", "admin-token");
        sheets.set_config("ADMIN_CHAT_ID", "200");
        sheets
    }

    #[tokio::test]
    async fn test_routes_to_channel_destination() {
        let chat = Arc::new(FakeChat::new());
        let notifier = Notifier::new(configured_sheets(), chat.clone());

        assert_eq!(notifier.notify(Channel::Primary, "hello").await, Delivery::Sent);
        assert_eq!(notifier.notify(Channel::Admin, "report").await, Delivery::Sent);

        let sent = chat.sent();
        assert_eq!(sent[0], ("main-token".into(), "100".into(), "hello".into()));
        assert_eq!(sent[1], ("admin-token".into(), "200".into(), "report".into()));
    }

    #[tokio::test]
    async fn test_missing_config_is_reported_not_raised() {
        let sheets = Arc::new(FakeSheets::new());
        sheets.set_config("TELEGRAM_TOKEN", "only-token");
        let chat = Arc::new(FakeChat::new());
        let notifier = Notifier::new(sheets, chat.clone());

        assert_eq!(notifier.notify(Channel::Primary, "x").await, Delivery::NotConfigured);
        assert!(chat.sent().is_empty());
    }

    #[tokio::test]
    async fn test_config_read_failure_is_not_configured() {
        let sheets = configured_sheets();
        sheets.fail_reads(true);
        let notifier = Notifier::new(sheets, Arc::new(FakeChat::new()));

        assert_eq!(notifier.notify(Channel::Admin, "x").await, Delivery::NotConfigured);
    }

    #[tokio::test]
    async fn test_delivery_failure_is_swallowed() {
        let chat = Arc::new(FakeChat::new());
        chat.fail_deliveries(true);
        let notifier = Notifier::new(configured_sheets(), chat);

        assert_eq!(notifier.notify(Channel::Primary, "x").await, Delivery::Failed);
    }

    #[tokio::test]
    async fn test_config_is_read_fresh_each_time() {
        let sheets = Arc::new(FakeSheets::new());
        let chat = Arc::new(FakeChat::new());
        let notifier = Notifier::new(sheets.clone(), chat.clone());

        assert_eq!(notifier.notify(Channel::Primary, "x").await, Delivery::NotConfigured);

        sheets.set_config("TELEGRAM_TOKEN", "t");
        sheets.set_config("CHAT_ID", "1");
        assert_eq!(notifier.notify(Channel::Primary, "x").await, Delivery::Sent);
    }
}
