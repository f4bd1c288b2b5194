//! Dispatch scheduler — fans a notification out into one deferred unit per
//! deliverable recipient.
//!
//! Steps:
//! 1. Partition recipients by channel (invalid entries are skipped)
//! 2. Reject outright when nothing is deliverable
//! 3. Compute one deadline for the whole notification
//! 4. Submit every unit independently, collecting submission failures

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use herald_common::types::{ChannelType, DispatchUnit, NO_VALID_RECIPIENTS, UrgencyTier};

use crate::classifier;
use crate::deadline;
use crate::queue::DispatchQueue;

/// Result of trying to hand a notification's units to the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulingOutcome {
    /// Every unit was accepted by the queue.
    Accepted {
        email_units: usize,
        telegram_units: usize,
        deadline: DateTime<Utc>,
    },
    /// No recipient maps to a channel; nothing was submitted.
    Rejected(String),
    /// At least one unit could not be submitted.
    Failed(String),
}

/// Fields shared by every unit of one notification.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleRequest<'a> {
    pub notification_id: Uuid,
    pub subject: &'a str,
    pub body: &'a str,
    pub recipients: &'a [String],
    pub tier: UrgencyTier,
}

#[derive(Clone)]
pub struct DispatchScheduler {
    queue: Arc<dyn DispatchQueue>,
}

impl DispatchScheduler {
    pub fn new(queue: Arc<dyn DispatchQueue>) -> Self {
        Self { queue }
    }

    /// Schedule relative to the current time.
    pub async fn schedule(&self, request: ScheduleRequest<'_>) -> SchedulingOutcome {
        self.schedule_at(request, Utc::now()).await
    }

    /// Schedule relative to a fixed submission time.
    pub async fn schedule_at(
        &self,
        request: ScheduleRequest<'_>,
        now: DateTime<Utc>,
    ) -> SchedulingOutcome {
        let classified = classifier::partition(request.recipients);

        if !classified.invalid.is_empty() {
            tracing::debug!(
                notification_id = %request.notification_id,
                skipped = classified.invalid.len(),
                "Skipping recipients that match no channel"
            );
        }

        if classified.is_empty() {
            tracing::warn!(
                notification_id = %request.notification_id,
                "{}", NO_VALID_RECIPIENTS
            );
            return SchedulingOutcome::Rejected(NO_VALID_RECIPIENTS.to_string());
        }

        let deadline = deadline::deadline(request.tier, now);

        let units = classified
            .emails
            .iter()
            .map(|r| (ChannelType::Email, r))
            .chain(
                classified
                    .telegram_ids
                    .iter()
                    .map(|r| (ChannelType::Telegram, r)),
            )
            .map(|(channel, recipient)| DispatchUnit {
                id: Uuid::new_v4(),
                notification_id: request.notification_id,
                channel,
                recipient: recipient.clone(),
                subject: request.subject.to_string(),
                body: request.body.to_string(),
                deadline,
            });

        let mut failures = Vec::new();
        for unit in units {
            if let Err(e) = self.queue.submit(&unit).await {
                tracing::error!(
                    notification_id = %request.notification_id,
                    unit_id = %unit.id,
                    channel = %unit.channel,
                    error = %e,
                    "Failed to submit dispatch unit"
                );
                failures.push(format!("{} {}: {}", unit.channel, unit.recipient, e));
            }
        }

        if !failures.is_empty() {
            return SchedulingOutcome::Failed(failures.join("; "));
        }

        tracing::info!(
            notification_id = %request.notification_id,
            email_units = classified.emails.len(),
            telegram_units = classified.telegram_ids.len(),
            deadline = %deadline,
            "Notification scheduled"
        );

        SchedulingOutcome::Accepted {
            email_units: classified.emails.len(),
            telegram_units: classified.telegram_ids.len(),
            deadline,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use herald_common::error::AppError;
    use std::sync::Mutex;

    /// Records submitted units; fails for recipients listed in `reject`.
    #[derive(Default)]
    struct RecordingQueue {
        units: Mutex<Vec<DispatchUnit>>,
        reject: Vec<String>,
    }

    #[async_trait]
    impl DispatchQueue for RecordingQueue {
        async fn submit(&self, unit: &DispatchUnit) -> Result<(), AppError> {
            if self.reject.contains(&unit.recipient) {
                return Err(AppError::Internal("queue rejected unit".into()));
            }
            self.units.lock().unwrap().push(unit.clone());
            Ok(())
        }
    }

    fn recipients(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn request<'a>(recipients: &'a [String], tier: UrgencyTier) -> ScheduleRequest<'a> {
        ScheduleRequest {
            notification_id: Uuid::nil(),
            subject: "Subject",
            body: "Body",
            recipients,
            tier,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap()
    }

    #[tokio::test]
    async fn test_mixed_recipients_produce_one_unit_each() {
        let queue = Arc::new(RecordingQueue::default());
        let scheduler = DispatchScheduler::new(queue.clone());
        let list = recipients(&["a@b.com", "123", "bogus"]);

        let outcome = scheduler
            .schedule_at(request(&list, UrgencyTier::Instant), now())
            .await;

        assert_eq!(
            outcome,
            SchedulingOutcome::Accepted {
                email_units: 1,
                telegram_units: 1,
                deadline: now(),
            }
        );

        let units = queue.units.lock().unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].channel, ChannelType::Email);
        assert_eq!(units[0].recipient, "a@b.com");
        assert_eq!(units[1].channel, ChannelType::Telegram);
        assert_eq!(units[1].recipient, "123");
        assert_ne!(units[0].id, units[1].id);
        assert!(units.iter().all(|u| u.subject == "Subject" && u.body == "Body"));
    }

    #[tokio::test]
    async fn test_all_units_share_the_tier_deadline() {
        let queue = Arc::new(RecordingQueue::default());
        let scheduler = DispatchScheduler::new(queue.clone());
        let list = recipients(&["a@b.com", "c@d.org", "42"]);

        scheduler
            .schedule_at(request(&list, UrgencyTier::OneDay), now())
            .await;

        let units = queue.units.lock().unwrap();
        assert_eq!(units.len(), 3);
        assert!(units.iter().all(|u| u.deadline == now() + Duration::days(1)));
    }

    #[tokio::test]
    async fn test_single_channel_is_still_accepted() {
        let queue = Arc::new(RecordingQueue::default());
        let scheduler = DispatchScheduler::new(queue.clone());
        let list = recipients(&["111", "222"]);

        let outcome = scheduler
            .schedule_at(request(&list, UrgencyTier::OneHour), now())
            .await;

        assert!(matches!(
            outcome,
            SchedulingOutcome::Accepted {
                email_units: 0,
                telegram_units: 2,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_no_valid_recipients_is_rejected() {
        for list in [recipients(&[]), recipients(&["bogus"])] {
            let queue = Arc::new(RecordingQueue::default());
            let scheduler = DispatchScheduler::new(queue.clone());

            let outcome = scheduler
                .schedule_at(request(&list, UrgencyTier::Instant), now())
                .await;

            assert_eq!(
                outcome,
                SchedulingOutcome::Rejected(NO_VALID_RECIPIENTS.to_string())
            );
            assert!(queue.units.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_submission_failure_does_not_stop_other_units() {
        let queue = Arc::new(RecordingQueue {
            units: Mutex::new(Vec::new()),
            reject: vec!["a@b.com".to_string()],
        });
        let scheduler = DispatchScheduler::new(queue.clone());
        let list = recipients(&["a@b.com", "c@d.org", "123"]);

        let outcome = scheduler
            .schedule_at(request(&list, UrgencyTier::Instant), now())
            .await;

        match outcome {
            SchedulingOutcome::Failed(reason) => {
                assert!(reason.contains("email a@b.com"));
                assert!(reason.contains("queue rejected unit"));
            }
            other => panic!("expected Failed, got {:?}", other),
        }

        let units = queue.units.lock().unwrap();
        let submitted: Vec<&str> = units.iter().map(|u| u.recipient.as_str()).collect();
        assert_eq!(submitted, vec!["c@d.org", "123"]);
    }
}
