//! Telegram transport backed by the Bot API.

use async_trait::async_trait;
use serde::Serialize;

use crate::transport::{TelegramTransport, TransportError, check_status};

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

pub struct TelegramBotTransport {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl TelegramBotTransport {
    /// `api_url` is the Bot API prefix the token is appended to,
    /// e.g. `https://api.telegram.org/bot`.
    pub fn new(
        client: reqwest::Client,
        api_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            token: token.into(),
        }
    }

    fn send_message_url(&self) -> String {
        format!("{}{}/sendMessage", self.api_url, self.token)
    }
}

#[async_trait]
impl TelegramTransport for TelegramBotTransport {
    async fn send_telegram(&self, chat_id: &str, message: &str) -> Result<(), TransportError> {
        let response = self
            .client
            .post(self.send_message_url())
            .json(&SendMessage {
                chat_id,
                text: message,
            })
            .send()
            .await?;

        check_status("Telegram", response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_message_url() {
        let transport = TelegramBotTransport::new(
            reqwest::Client::new(),
            "https://api.telegram.org/bot",
            "123:ABC",
        );
        assert_eq!(
            transport.send_message_url(),
            "https://api.telegram.org/bot123:ABC/sendMessage"
        );
    }

    #[test]
    fn test_payload_shape() {
        let payload = SendMessage {
            chat_id: "987654321",
            text: "ping",
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({ "chat_id": "987654321", "text": "ping" })
        );
    }
}
