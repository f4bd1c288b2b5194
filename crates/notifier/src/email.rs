//! Email transport backed by the Resend HTTP API.

use async_trait::async_trait;
use serde::Serialize;

use crate::transport::{EmailTransport, TransportError, check_status};

/// Request body for `POST /emails`.
#[derive(Debug, Serialize, PartialEq, Eq)]
struct ResendEmail<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
}

pub struct ResendEmailTransport {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl ResendEmailTransport {
    pub fn new(
        client: reqwest::Client,
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        from: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
            from: from.into(),
        }
    }
}

#[async_trait]
impl EmailTransport for ResendEmailTransport {
    async fn send_email(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), TransportError> {
        let payload = ResendEmail {
            from: &self.from,
            to: [recipient],
            subject,
            text: body,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        check_status("Resend", response).await
    }
}
