//! Redis service for suspended person-match decisions

use async_trait::async_trait;
use redis::{AsyncCommands, Client};

use crate::{
    error::{AppError, AppResult},
    models::pending::PendingMatch,
    services::pending::PendingMatchStore,
};

#[derive(Clone)]
pub struct RedisService {
    client: Client,
}

impl RedisService {
    /// Create a new Redis service
    pub async fn new(url: &str) -> AppResult<Self> {
        let client = Client::open(url)?;

        // Test connection
        let mut conn = client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;

        Ok(Self { client })
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    /// Round-trip to Redis for the readiness check
    pub async fn ping(&self) -> AppResult<()> {
        let mut conn = self.connection().await?;
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        Ok(())
    }
}

fn pending_key(equipment_id: i32) -> String {
    format!("pending_person:{}", equipment_id)
}

#[async_trait]
impl PendingMatchStore for RedisService {
    async fn load(&self, equipment_id: i32) -> AppResult<Option<PendingMatch>> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(pending_key(equipment_id)).await?;

        raw.map(|json| {
            serde_json::from_str(&json).map_err(|e| {
                AppError::Internal(format!("Corrupt pending match for equipment {}: {}", equipment_id, e))
            })
        })
        .transpose()
    }

    async fn save(&self, pending: &PendingMatch, ttl_seconds: u64) -> AppResult<()> {
        let json = serde_json::to_string(pending)
            .map_err(|e| AppError::Internal(format!("Failed to encode pending match: {}", e)))?;

        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(pending_key(pending.equipment_id), json, ttl_seconds)
            .await?;
        Ok(())
    }

    async fn delete(&self, equipment_id: i32) -> AppResult<()> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(pending_key(equipment_id)).await?;
        Ok(())
    }
}
