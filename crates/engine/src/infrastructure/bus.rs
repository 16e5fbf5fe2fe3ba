//! Redis event bus (C2): three pub/sub topics plus the `queue:worldgen`
//! list. Grounded in the teacher's `queues/memory_queue.rs` port shape
//! (`EventBusPort` here plays the role `QueuePort` plays there) but backed
//! by a real out-of-process store since the queue must be shared across any
//! number of processors (§5 "Shared resources").

use async_trait::async_trait;
use deadpool_redis::{Config, Connection, Pool, Runtime};
use redis::AsyncCommands;
use uuid::Uuid;

use crate::domain::JobEnvelope;
use crate::error::InfraError;

pub const TOPIC_CHAT: &str = "events:discord:channel";
pub const TOPIC_PLAYER: &str = "events:minecraft:player";
pub const TOPIC_WORLD_ACTIVITY: &str = "events:world:activity";
pub const QUEUE_WORLDGEN: &str = "queue:worldgen";

#[async_trait]
pub trait EventBusPort: Send + Sync {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), InfraError>;
    async fn push_job(&self, envelope: &JobEnvelope) -> Result<(), InfraError>;
    /// Reads the whole `queue:worldgen` list and removes exactly the
    /// envelope at `raw_index` via the sentinel-swap pattern (§4.3). Returns
    /// `None` if another worker already took it (LSET sees a changed slot).
    async fn take_closest(&self) -> Result<Option<JobEnvelope>, InfraError>;
    async fn store_link_code(&self, code: &str, external_user_id: &str, ttl_seconds: u64) -> Result<(), InfraError>;
}

#[derive(Clone)]
pub struct RedisEventBus {
    pool: Pool,
}

impl RedisEventBus {
    pub fn connect(url: &str) -> Result<Self, InfraError> {
        let cfg = Config::from_url(url);
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| InfraError::config(format!("redis pool init failed: {e}")))?;
        Ok(Self { pool })
    }

    async fn conn(&self) -> Result<Connection, InfraError> {
        Ok(self.pool.get().await?)
    }
}

#[async_trait]
impl EventBusPort for RedisEventBus {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), InfraError> {
        let mut conn = self.conn().await?;
        let _: i64 = conn.publish(topic, payload).await?;
        Ok(())
    }

    async fn push_job(&self, envelope: &JobEnvelope) -> Result<(), InfraError> {
        let payload = serde_json::to_string(envelope)?;
        let mut conn = self.conn().await?;
        let _: i64 = conn.rpush(QUEUE_WORLDGEN, payload).await?;
        Ok(())
    }

    async fn take_closest(&self) -> Result<Option<JobEnvelope>, InfraError> {
        let mut conn = self.conn().await?;
        let raw: Vec<String> = conn.lrange(QUEUE_WORLDGEN, 0, -1).await?;
        if raw.is_empty() {
            return Ok(None);
        }

        let mut best: Option<(usize, JobEnvelope, f64)> = None;
        for (idx, entry) in raw.iter().enumerate() {
            let Ok(envelope) = serde_json::from_str::<JobEnvelope>(entry) else {
                tracing::warn!("dropping unparseable queue entry at index {idx}");
                continue;
            };
            let distance = envelope.distance_from_hub();
            if best.as_ref().map(|(_, _, d)| distance < *d).unwrap_or(true) {
                best = Some((idx, envelope, distance));
            }
        }

        let Some((idx, envelope, _)) = best else {
            return Ok(None);
        };

        let sentinel = format!("__taken__:{}", Uuid::new_v4());
        let swapped: redis::RedisResult<()> = conn.lset(QUEUE_WORLDGEN, idx as isize, &sentinel).await;
        if swapped.is_err() {
            // List shrank under us (another worker removed entries before idx) — caller retries.
            return Ok(None);
        }
        // Re-read the slot to make sure nobody else had already claimed this
        // exact element out from under us before our LSET landed.
        let current: Option<String> = conn.lindex(QUEUE_WORLDGEN, idx as isize).await?;
        if current.as_deref() != Some(sentinel.as_str()) {
            return Ok(None);
        }
        let _: i64 = conn.lrem(QUEUE_WORLDGEN, 1, &sentinel).await?;
        Ok(Some(envelope))
    }

    async fn store_link_code(&self, code: &str, external_user_id: &str, ttl_seconds: u64) -> Result<(), InfraError> {
        let mut conn = self.conn().await?;
        let key = format!("link:code:{code}");
        let _: () = conn.set_ex(key, external_user_id, ttl_seconds).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CreateCrossroadsPayload, JobId, JobPayload};

    #[test]
    fn sentinel_strings_are_unlikely_to_collide_with_real_payloads() {
        let sentinel = format!("__taken__:{}", Uuid::new_v4());
        let envelope = JobEnvelope::new(JobId::new(), JobPayload::CreateCrossroads(CreateCrossroadsPayload));
        let json = serde_json::to_string(&envelope).unwrap();
        assert_ne!(sentinel, json);
    }
}
