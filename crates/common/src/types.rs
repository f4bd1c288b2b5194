use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

/// Subject used when a request does not provide one.
pub const DEFAULT_SUBJECT: &str = "No Subject";

/// Reason recorded when no recipient maps to a delivery channel.
pub const NO_VALID_RECIPIENTS: &str = "No valid recipients to send notifications.";

/// Delay selector for a notification (`delay` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "i64", into = "i16")]
#[repr(i16)]
pub enum UrgencyTier {
    Instant = 0,
    OneHour = 1,
    OneDay = 2,
}

impl TryFrom<i64> for UrgencyTier {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(UrgencyTier::Instant),
            1 => Ok(UrgencyTier::OneHour),
            2 => Ok(UrgencyTier::OneDay),
            other => Err(format!("\"{}\" is not a valid choice.", other)),
        }
    }
}

impl From<UrgencyTier> for i16 {
    fn from(tier: UrgencyTier) -> Self {
        tier as i16
    }
}

impl std::fmt::Display for UrgencyTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UrgencyTier::Instant => write!(f, "instant"),
            UrgencyTier::OneHour => write!(f, "one_hour"),
            UrgencyTier::OneDay => write!(f, "one_day"),
        }
    }
}

/// Delivery channel a dispatch unit is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Email,
    Telegram,
}

impl std::fmt::Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelType::Email => write!(f, "email"),
            ChannelType::Telegram => write!(f, "telegram"),
        }
    }
}

/// Outcome recorded in a delivery log.
///
/// `Sent` means the notification was accepted for delivery, not that any
/// transport has completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeliveryOutcome {
    Sent,
    Failed,
}

impl std::fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryOutcome::Sent => write!(f, "sent"),
            DeliveryOutcome::Failed => write!(f, "failed"),
        }
    }
}

/// A persisted notification request. Rows are never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct NotificationRecord {
    pub id: Uuid,
    pub subject: String,
    pub body: String,
    /// Recipients exactly as submitted, before classification.
    pub recipients: Json<Vec<String>>,
    pub urgency_tier: UrgencyTier,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to insert a [`NotificationRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub subject: String,
    pub body: String,
    pub recipients: Vec<String>,
    pub urgency_tier: UrgencyTier,
}

/// Summary of one intake attempt's scheduling result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeliveryLog {
    pub id: Uuid,
    pub notification_id: Uuid,
    pub outcome: DeliveryOutcome,
    pub timestamp: DateTime<Utc>,
    /// Only set when `outcome` is `Failed`.
    pub error_detail: Option<String>,
}

/// Fields needed to append a [`DeliveryLog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDeliveryLog {
    pub notification_id: Uuid,
    pub outcome: DeliveryOutcome,
    pub error_detail: Option<String>,
}

impl NewDeliveryLog {
    pub fn sent(notification_id: Uuid) -> Self {
        Self {
            notification_id,
            outcome: DeliveryOutcome::Sent,
            error_detail: None,
        }
    }

    pub fn failed(notification_id: Uuid, error_detail: impl Into<String>) -> Self {
        Self {
            notification_id,
            outcome: DeliveryOutcome::Failed,
            error_detail: Some(error_detail.into()),
        }
    }
}

/// One scheduled (channel, recipient) send, executed no earlier than `deadline`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchUnit {
    pub id: Uuid,
    pub notification_id: Uuid,
    pub channel: ChannelType,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub deadline: DateTime<Utc>,
}
