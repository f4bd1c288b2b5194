//! Intake coordinator — the orchestration entry point for a notification request.
//!
//! validate → persist record → schedule → write exactly one delivery log.
//!
//! The record is persisted before scheduling is attempted, so rejected and
//! failed attempts stay auditable. A `sent` log means the units were accepted
//! by the dispatch queue, not that any of them has been delivered.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use herald_common::error::AppError;
use herald_common::types::{
    DeliveryLog, NewDeliveryLog, NewNotification, NotificationRecord,
};

use crate::queue::DispatchQueue;
use crate::scheduler::{DispatchScheduler, ScheduleRequest, SchedulingOutcome};
use crate::store::RecordStore;
use crate::validation;

/// Returned to the caller when a notification was accepted for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntakeReceipt {
    pub notification_id: Uuid,
    pub log_id: Uuid,
    pub email_units: usize,
    pub telegram_units: usize,
}

/// A stored notification with its delivery logs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationDetail {
    pub notification: NotificationRecord,
    pub delivery_logs: Vec<DeliveryLog>,
}

#[derive(Clone)]
pub struct IntakeCoordinator {
    store: Arc<dyn RecordStore>,
    scheduler: DispatchScheduler,
}

impl IntakeCoordinator {
    pub fn new(store: Arc<dyn RecordStore>, queue: Arc<dyn DispatchQueue>) -> Self {
        Self {
            store,
            scheduler: DispatchScheduler::new(queue),
        }
    }

    /// Process one notification request end to end.
    ///
    /// Errors map onto the response taxonomy: `Validation` and
    /// `NoValidRecipients` are client errors, `Persistence` and `Scheduling`
    /// are server errors.
    pub async fn submit(&self, payload: &Value) -> Result<IntakeReceipt, AppError> {
        let request = validation::validate(payload).inspect_err(|e| {
            tracing::warn!(error = %e, "Invalid notification data");
        })?;

        let record = self
            .store
            .insert_notification(&NewNotification {
                subject: request.subject,
                body: request.message,
                recipients: request.recipients,
                urgency_tier: request.delay,
            })
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to save notification");
                AppError::Persistence(e.to_string())
            })?;

        let outcome = self
            .scheduler
            .schedule(ScheduleRequest {
                notification_id: record.id,
                subject: &record.subject,
                body: &record.body,
                recipients: &record.recipients.0,
                tier: record.urgency_tier,
            })
            .await;

        match outcome {
            SchedulingOutcome::Accepted {
                email_units,
                telegram_units,
                ..
            } => {
                let log = self.write_log(NewDeliveryLog::sent(record.id)).await?;
                Ok(IntakeReceipt {
                    notification_id: record.id,
                    log_id: log.id,
                    email_units,
                    telegram_units,
                })
            }
            SchedulingOutcome::Rejected(reason) => {
                self.write_log(NewDeliveryLog::failed(record.id, reason))
                    .await?;
                Err(AppError::NoValidRecipients)
            }
            SchedulingOutcome::Failed(reason) => {
                tracing::error!(
                    notification_id = %record.id,
                    error = %reason,
                    "Failed to schedule notification"
                );
                self.write_log(NewDeliveryLog::failed(record.id, reason.clone()))
                    .await?;
                Err(AppError::Scheduling(reason))
            }
        }
    }

    /// Load a notification and its delivery logs.
    pub async fn notification(&self, id: Uuid) -> Result<NotificationDetail, AppError> {
        let notification = self
            .store
            .find_notification(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Notification {} not found", id)))?;
        let delivery_logs = self.store.delivery_logs_for(id).await?;

        Ok(NotificationDetail {
            notification,
            delivery_logs,
        })
    }

    /// Whether the record store is reachable.
    pub async fn store_healthy(&self) -> bool {
        self.store.ping().await.is_ok()
    }

    async fn write_log(&self, log: NewDeliveryLog) -> Result<DeliveryLog, AppError> {
        let outcome = log.outcome;
        let notification_id = log.notification_id;

        let row = self.store.insert_delivery_log(&log).await.map_err(|e| {
            tracing::error!(
                notification_id = %notification_id,
                error = %e,
                "Failed to write delivery log"
            );
            AppError::Persistence(e.to_string())
        })?;

        tracing::info!(
            notification_id = %notification_id,
            log_id = %row.id,
            outcome = %outcome,
            "Delivery log written"
        );

        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use herald_common::types::{DeliveryOutcome, DispatchUnit, NO_VALID_RECIPIENTS};
    use serde_json::json;
    use sqlx::types::Json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        notifications: Mutex<Vec<NotificationRecord>>,
        logs: Mutex<Vec<DeliveryLog>>,
        fail_inserts: bool,
    }

    #[async_trait]
    impl RecordStore for MemoryStore {
        async fn insert_notification(
            &self,
            n: &NewNotification,
        ) -> Result<NotificationRecord, AppError> {
            if self.fail_inserts {
                return Err(AppError::Internal("store unavailable".into()));
            }
            let record = NotificationRecord {
                id: Uuid::new_v4(),
                subject: n.subject.clone(),
                body: n.body.clone(),
                recipients: Json(n.recipients.clone()),
                urgency_tier: n.urgency_tier,
                created_at: Utc::now(),
            };
            self.notifications.lock().unwrap().push(record.clone());
            Ok(record)
        }

        async fn insert_delivery_log(&self, l: &NewDeliveryLog) -> Result<DeliveryLog, AppError> {
            let row = DeliveryLog {
                id: Uuid::new_v4(),
                notification_id: l.notification_id,
                outcome: l.outcome,
                timestamp: Utc::now(),
                error_detail: l.error_detail.clone(),
            };
            self.logs.lock().unwrap().push(row.clone());
            Ok(row)
        }

        async fn find_notification(
            &self,
            id: Uuid,
        ) -> Result<Option<NotificationRecord>, AppError> {
            Ok(self
                .notifications
                .lock()
                .unwrap()
                .iter()
                .find(|n| n.id == id)
                .cloned())
        }

        async fn delivery_logs_for(&self, id: Uuid) -> Result<Vec<DeliveryLog>, AppError> {
            Ok(self
                .logs
                .lock()
                .unwrap()
                .iter()
                .filter(|l| l.notification_id == id)
                .cloned()
                .collect())
        }

        async fn ping(&self) -> Result<(), AppError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryQueue {
        units: Mutex<Vec<DispatchUnit>>,
        unavailable: bool,
    }

    #[async_trait]
    impl DispatchQueue for MemoryQueue {
        async fn submit(&self, unit: &DispatchUnit) -> Result<(), AppError> {
            if self.unavailable {
                return Err(AppError::Internal("broker unreachable".into()));
            }
            self.units.lock().unwrap().push(unit.clone());
            Ok(())
        }
    }

    fn coordinator(store: &Arc<MemoryStore>, queue: &Arc<MemoryQueue>) -> IntakeCoordinator {
        IntakeCoordinator::new(store.clone(), queue.clone())
    }

    #[tokio::test]
    async fn test_accepted_writes_sent_log() {
        let store = Arc::new(MemoryStore::default());
        let queue = Arc::new(MemoryQueue::default());

        let receipt = coordinator(&store, &queue)
            .submit(&json!({
                "subject": "Test Notification",
                "message": "This is a test message.",
                "recipient": ["test@example.com", "123456789"],
                "delay": 1
            }))
            .await
            .unwrap();

        assert_eq!(receipt.email_units, 1);
        assert_eq!(receipt.telegram_units, 1);
        assert_eq!(queue.units.lock().unwrap().len(), 2);

        let records = store.notifications.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].subject, "Test Notification");
        assert_eq!(records[0].body, "This is a test message.");

        let logs = store.logs.lock().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].id, receipt.log_id);
        assert_eq!(logs[0].outcome, DeliveryOutcome::Sent);
        assert_eq!(logs[0].error_detail, None);
    }

    #[tokio::test]
    async fn test_partial_recipients_keep_raw_list() {
        let store = Arc::new(MemoryStore::default());
        let queue = Arc::new(MemoryQueue::default());

        coordinator(&store, &queue)
            .submit(&json!({
                "message": "hi",
                "recipient": ["valid@example.com", "invalid_email"],
                "delay": 0
            }))
            .await
            .unwrap();

        let records = store.notifications.lock().unwrap();
        assert_eq!(records[0].subject, "No Subject");
        assert_eq!(
            records[0].recipients.0,
            vec!["valid@example.com", "invalid_email"]
        );
        assert_eq!(queue.units.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_no_valid_recipients_is_audited() {
        for recipient in [json!([]), json!(["bogus"]), json!("invalid_email")] {
            let store = Arc::new(MemoryStore::default());
            let queue = Arc::new(MemoryQueue::default());

            let err = coordinator(&store, &queue)
                .submit(&json!({
                    "message": "hi",
                    "recipient": recipient,
                    "delay": 1
                }))
                .await
                .unwrap_err();

            assert!(matches!(err, AppError::NoValidRecipients));
            assert_eq!(store.notifications.lock().unwrap().len(), 1);

            let logs = store.logs.lock().unwrap();
            assert_eq!(logs.len(), 1);
            assert_eq!(logs[0].outcome, DeliveryOutcome::Failed);
            assert_eq!(logs[0].error_detail.as_deref(), Some(NO_VALID_RECIPIENTS));
            assert!(queue.units.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_validation_error_persists_nothing() {
        let store = Arc::new(MemoryStore::default());
        let queue = Arc::new(MemoryQueue::default());

        let err = coordinator(&store, &queue)
            .submit(&json!({
                "message": "This is a test message.",
                "recipient": ["test@example.com"]
            }))
            .await
            .unwrap_err();

        match err {
            AppError::Validation(errors) => assert!(errors.contains_key("delay")),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(store.notifications.lock().unwrap().is_empty());
        assert!(store.logs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_persistence_error() {
        let store = Arc::new(MemoryStore {
            fail_inserts: true,
            ..Default::default()
        });
        let queue = Arc::new(MemoryQueue::default());

        let err = coordinator(&store, &queue)
            .submit(&json!({ "message": "hi", "recipient": "1", "delay": 0 }))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Persistence(ref m) if m.contains("store unavailable")));
        assert!(store.logs.lock().unwrap().is_empty());
        assert!(queue.units.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_queue_failure_writes_failed_log() {
        let store = Arc::new(MemoryStore::default());
        let queue = Arc::new(MemoryQueue {
            unavailable: true,
            ..Default::default()
        });

        let err = coordinator(&store, &queue)
            .submit(&json!({ "message": "hi", "recipient": "a@b.com", "delay": 2 }))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Scheduling(ref m) if m.contains("broker unreachable")));
        assert_eq!(store.notifications.lock().unwrap().len(), 1);

        let logs = store.logs.lock().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].outcome, DeliveryOutcome::Failed);
        assert!(
            logs[0]
                .error_detail
                .as_deref()
                .unwrap()
                .contains("broker unreachable")
        );
    }

    #[tokio::test]
    async fn test_notification_detail() {
        let store = Arc::new(MemoryStore::default());
        let queue = Arc::new(MemoryQueue::default());
        let coordinator = coordinator(&store, &queue);

        let receipt = coordinator
            .submit(&json!({ "message": "hi", "recipient": "42", "delay": 0 }))
            .await
            .unwrap();

        let detail = coordinator.notification(receipt.notification_id).await.unwrap();
        assert_eq!(detail.notification.id, receipt.notification_id);
        assert_eq!(detail.delivery_logs.len(), 1);

        let missing = coordinator.notification(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(missing, AppError::NotFound(_)));
    }
}
