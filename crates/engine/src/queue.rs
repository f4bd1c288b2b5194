//! Deferred dispatch queue.
//!
//! The scheduler only needs one capability: hand a unit over for execution
//! no earlier than its deadline. [`RedisDispatchQueue`] implements it with a
//! sorted set scored by deadline (epoch milliseconds); the notifier worker
//! claims due members from the same set.

use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};

use herald_common::error::AppError;
use herald_common::types::DispatchUnit;

/// Accepts dispatch units for deferred, deadline-triggered execution.
#[async_trait]
pub trait DispatchQueue: Send + Sync {
    /// Submit a unit to run at or after `unit.deadline`.
    ///
    /// Submitting the same unit (same `id`) twice must not run it twice.
    async fn submit(&self, unit: &DispatchUnit) -> Result<(), AppError>;
}

/// Hands out units whose deadline has passed. Each unit is returned to
/// exactly one caller.
#[async_trait]
pub trait DueUnitSource: Send + Sync {
    /// Claim up to `limit` units due at or before `now`.
    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<DispatchUnit>, AppError>;

    /// Name of the backing queue, for logs.
    fn describe(&self) -> &str;
}

/// Range and removal run as one script, so a member is either claimed by
/// this call or still in the set.
static CLAIM_SCRIPT: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r#"
        local key = KEYS[1]
        local due = redis.call('ZRANGEBYSCORE', key, '-inf', ARGV[1], 'LIMIT', 0, ARGV[2])
        if #due > 0 then
            redis.call('ZREM', key, unpack(due))
        end
        return due
        "#,
    )
});

/// Redis sorted-set queue shared by the API (producer) and notifier (consumer).
#[derive(Clone)]
pub struct RedisDispatchQueue {
    redis: ConnectionManager,
    key: String,
}

impl RedisDispatchQueue {
    pub fn new(redis: ConnectionManager, key: impl Into<String>) -> Self {
        Self {
            redis,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Number of units waiting in the queue, due or not.
    pub async fn pending(&self) -> Result<u64, AppError> {
        let mut redis = self.redis.clone();
        let count: u64 = redis.zcard(&self.key).await?;
        Ok(count)
    }
}

/// Decode claimed members. Members that fail to deserialize are dropped with
/// a warning; they are already out of the queue.
pub fn decode_claimed(members: Vec<String>) -> Vec<DispatchUnit> {
    members
        .into_iter()
        .filter_map(|member| match serde_json::from_str::<DispatchUnit>(&member) {
            Ok(unit) => Some(unit),
            Err(e) => {
                tracing::warn!(error = %e, member = %member, "Dropping undecodable dispatch unit");
                None
            }
        })
        .collect()
}

#[async_trait]
impl DueUnitSource for RedisDispatchQueue {
    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<DispatchUnit>, AppError> {
        let mut redis = self.redis.clone();

        let members: Vec<String> = CLAIM_SCRIPT
            .key(&self.key)
            .arg(now.timestamp_millis())
            .arg(limit.max(1))
            .invoke_async(&mut redis)
            .await?;

        Ok(decode_claimed(members))
    }

    fn describe(&self) -> &str {
        &self.key
    }
}

#[async_trait]
impl DispatchQueue for RedisDispatchQueue {
    async fn submit(&self, unit: &DispatchUnit) -> Result<(), AppError> {
        let member = serde_json::to_string(unit)?;
        let mut redis = self.redis.clone();

        // ZADD on an existing member only rewrites its score
        redis
            .zadd::<_, _, _, ()>(&self.key, member, unit.deadline.timestamp_millis())
            .await?;

        tracing::debug!(
            unit_id = %unit.id,
            notification_id = %unit.notification_id,
            channel = %unit.channel,
            deadline = %unit.deadline,
            "Dispatch unit queued"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_common::types::ChannelType;
    use uuid::Uuid;

    fn unit(recipient: &str) -> DispatchUnit {
        DispatchUnit {
            id: Uuid::new_v4(),
            notification_id: Uuid::new_v4(),
            channel: ChannelType::Email,
            recipient: recipient.to_string(),
            subject: "Subject".to_string(),
            body: "Body".to_string(),
            deadline: Utc::now(),
        }
    }

    #[test]
    fn decode_claimed_keeps_valid_members_in_order() {
        let first = unit("a@example.com");
        let second = unit("b@example.com");
        let members = vec![
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap(),
        ];

        let decoded = decode_claimed(members);
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].id, first.id);
        assert_eq!(decoded[1].id, second.id);
    }

    #[test]
    fn decode_claimed_drops_garbage_without_losing_neighbours() {
        let good = unit("a@example.com");
        let members = vec![
            "not json".to_string(),
            serde_json::to_string(&good).unwrap(),
            r#"{"id":"nope"}"#.to_string(),
        ];

        let decoded = decode_claimed(members);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].id, good.id);
    }
}
