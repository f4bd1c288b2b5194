//! Record store — persistence for notification records and delivery logs.
//!
//! Notifications are insert-only; delivery logs are append-only. No update
//! path exists for either.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use herald_common::error::AppError;
use herald_common::types::{DeliveryLog, NewDeliveryLog, NewNotification, NotificationRecord};

/// Storage backend used by the intake path.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a new notification record with a server-assigned ID.
    async fn insert_notification(
        &self,
        notification: &NewNotification,
    ) -> Result<NotificationRecord, AppError>;

    /// Append a delivery log row.
    async fn insert_delivery_log(&self, log: &NewDeliveryLog) -> Result<DeliveryLog, AppError>;

    /// Fetch a notification record by ID.
    async fn find_notification(&self, id: Uuid) -> Result<Option<NotificationRecord>, AppError>;

    /// All delivery logs for a notification, oldest first.
    async fn delivery_logs_for(&self, notification_id: Uuid) -> Result<Vec<DeliveryLog>, AppError>;

    /// Cheap connectivity check for health reporting.
    async fn ping(&self) -> Result<(), AppError>;
}

/// PostgreSQL-backed record store.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn insert_notification(
        &self,
        notification: &NewNotification,
    ) -> Result<NotificationRecord, AppError> {
        let record: NotificationRecord = sqlx::query_as(
            r#"
            INSERT INTO notifications (id, subject, body, recipients, urgency_tier, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&notification.subject)
        .bind(&notification.body)
        .bind(Json(&notification.recipients))
        .bind(notification.urgency_tier)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(
            notification_id = %record.id,
            urgency_tier = %record.urgency_tier,
            "Notification record inserted"
        );

        Ok(record)
    }

    async fn insert_delivery_log(&self, log: &NewDeliveryLog) -> Result<DeliveryLog, AppError> {
        let row: DeliveryLog = sqlx::query_as(
            r#"
            INSERT INTO delivery_logs (id, notification_id, outcome, "timestamp", error_detail)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(log.notification_id)
        .bind(log.outcome)
        .bind(Utc::now())
        .bind(&log.error_detail)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_notification(&self, id: Uuid) -> Result<Option<NotificationRecord>, AppError> {
        let record = sqlx::query_as("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn delivery_logs_for(&self, notification_id: Uuid) -> Result<Vec<DeliveryLog>, AppError> {
        let logs = sqlx::query_as(
            r#"SELECT * FROM delivery_logs WHERE notification_id = $1 ORDER BY "timestamp" ASC"#,
        )
        .bind(notification_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
