use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::core::notify::{ChatSender, NotifyError};

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Telegram Bot API sender. The bot token is part of the URL, so it is
/// stripped from every error before the error leaves this module.
pub struct TelegramClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

impl TelegramClient {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: TELEGRAM_API_BASE.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[async_trait]
impl ChatSender for TelegramClient {
    async fn send_message(&self, bot_token: &str, chat_id: &str, text: &str) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, bot_token);
        let response = self
            .client
            .post(url)
            .json(&SendMessage {
                chat_id,
                text,
                parse_mode: "HTML",
            })
            .send()
            .await
            .map_err(|e| NotifyError::Delivery(e.without_url().to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(NotifyError::Delivery(format!("{}: {}", status, text)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_sends_html_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_json(serde_json::json!({
                "chat_id": "-100",
                "text": "<b>hi</b>",
                "parse_mode": "HTML"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        TelegramClient::new(Client::new())
            .with_base_url(server.uri())
            .send_message("123:abc", "-100", "<b>hi</b>")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_rejection_is_delivery_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"ok": false, "description": "chat not found"})),
            )
            .mount(&server)
            .await;

        let err = TelegramClient::new(Client::new())
            .with_base_url(server.uri())
            .send_message("123:abc", "-1", "x")
            .await
            .unwrap_err();

        let NotifyError::Delivery(msg) = err;
        assert!(msg.contains("chat not found"));
        assert!(!msg.contains("123:abc"));
    }

    #[tokio::test]
    async fn test_transport_error_hides_token() {
        // Nothing listens on port 9.
        let err = TelegramClient::new(Client::new())
            .with_base_url("http://127.0.0.1:9")
            .send_message("secret-token", "1", "x")
            .await
            .unwrap_err();

        assert!(!err.to_string().contains("secret-token"));
    }
}
