//! Channel transport capabilities used by the dispatcher.

use async_trait::async_trait;
use thiserror::Error;

use herald_common::types::ChannelType;

/// Send-time failure, owned entirely by the delivery side.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} returned {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{0} transport is not configured")]
    NotConfigured(ChannelType),
}

/// Sends a single email.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send_email(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), TransportError>;
}

/// Sends a single Telegram message to a chat.
#[async_trait]
pub trait TelegramTransport: Send + Sync {
    async fn send_telegram(&self, chat_id: &str, message: &str) -> Result<(), TransportError>;
}

/// Turn a non-2xx response into a `TransportError::Status`.
pub(crate) async fn check_status(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<(), TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    Err(TransportError::Status {
        provider,
        status: status.as_u16(),
        body,
    })
}
