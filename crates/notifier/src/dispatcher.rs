//! Routes a claimed dispatch unit to the transport for its channel.

use std::sync::Arc;

use herald_common::types::{ChannelType, DispatchUnit};

use crate::transport::{EmailTransport, TelegramTransport, TransportError};

/// Executes dispatch units. A channel without a transport is disabled:
/// its units fail with `TransportError::NotConfigured`.
#[derive(Clone, Default)]
pub struct Dispatcher {
    email: Option<Arc<dyn EmailTransport>>,
    telegram: Option<Arc<dyn TelegramTransport>>,
}

impl Dispatcher {
    pub fn new(
        email: Option<Arc<dyn EmailTransport>>,
        telegram: Option<Arc<dyn TelegramTransport>>,
    ) -> Self {
        Self { email, telegram }
    }

    pub fn enabled_channels(&self) -> Vec<ChannelType> {
        let mut channels = Vec::new();
        if self.email.is_some() {
            channels.push(ChannelType::Email);
        }
        if self.telegram.is_some() {
            channels.push(ChannelType::Telegram);
        }
        channels
    }

    /// Send one unit and log the result.
    pub async fn execute(&self, unit: &DispatchUnit) -> Result<(), TransportError> {
        let result = match unit.channel {
            ChannelType::Email => match &self.email {
                Some(email) => {
                    email
                        .send_email(&unit.recipient, &unit.subject, &unit.body)
                        .await
                }
                None => Err(TransportError::NotConfigured(ChannelType::Email)),
            },
            ChannelType::Telegram => match &self.telegram {
                Some(telegram) => telegram.send_telegram(&unit.recipient, &unit.body).await,
                None => Err(TransportError::NotConfigured(ChannelType::Telegram)),
            },
        };

        match &result {
            Ok(()) => tracing::info!(
                unit_id = %unit.id,
                notification_id = %unit.notification_id,
                channel = %unit.channel,
                recipient = %unit.recipient,
                "Notification delivered"
            ),
            Err(e) => tracing::error!(
                unit_id = %unit.id,
                notification_id = %unit.notification_id,
                channel = %unit.channel,
                recipient = %unit.recipient,
                error = %e,
                "Notification delivery failed"
            ),
        }

        result
    }
}
