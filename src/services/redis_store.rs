use crate::error::StoreError;
use crate::services::snapshot_store::SnapshotStore;
use crate::types::SignalSnapshot;
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, RedisResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Redis key prefix for snapshots.
const SNAPSHOT_PREFIX: &str = "cryptoflip:snapshot:";

/// Snapshot store backed by Redis, one JSON value per asset.
#[derive(Clone)]
pub struct RedisSnapshotStore {
    url: String,
    conn: Arc<RwLock<Option<ConnectionManager>>>,
    connect_attempts: Arc<AtomicUsize>,
}

impl RedisSnapshotStore {
    /// Create a new store, connecting to Redis at the given URL.
    ///
    /// A failed connection is not fatal: reads and writes retry the
    /// connection and report `StoreError::Unavailable` until Redis is back.
    pub async fn new(redis_url: &str) -> Self {
        let connect_attempts = Arc::new(AtomicUsize::new(1));
        let conn = match Self::connect(redis_url).await {
            Ok(c) => {
                info!("Connected to Redis at {}", redis_url);
                Some(c)
            }
            Err(e) => {
                warn!(
                    "Failed to connect to Redis: {}. Snapshots will not persist.",
                    e
                );
                None
            }
        };

        Self {
            url: redis_url.to_string(),
            conn: Arc::new(RwLock::new(conn)),
            connect_attempts,
        }
    }

    async fn connect(redis_url: &str) -> RedisResult<ConnectionManager> {
        let client = redis::Client::open(redis_url)?;
        ConnectionManager::new(client).await
    }

    /// Check if Redis is connected.
    pub async fn is_connected(&self) -> bool {
        self.conn.read().await.is_some()
    }

    /// Connection attempts made so far, including the one in `new`.
    pub fn connect_attempts(&self) -> usize {
        self.connect_attempts.load(Ordering::Relaxed)
    }

    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        let existing = self.conn.read().await.clone();
        if let Some(conn) = existing {
            return Ok(conn);
        }

        let mut slot = self.conn.write().await;
        // Another caller may have reconnected while we waited for the lock.
        if let Some(conn) = slot.clone() {
            return Ok(conn);
        }

        self.connect_attempts.fetch_add(1, Ordering::Relaxed);
        match Self::connect(&self.url).await {
            Ok(conn) => {
                info!("Reconnected to Redis at {}", self.url);
                *slot = Some(conn.clone());
                Ok(conn)
            }
            Err(e) => Err(StoreError::Unavailable(format!(
                "redis not connected: {}",
                e
            ))),
        }
    }
}

fn snapshot_key(asset_id: &str) -> String {
    format!("{}{}", SNAPSHOT_PREFIX, asset_id)
}

#[async_trait]
impl SnapshotStore for RedisSnapshotStore {
    async fn get(&self, asset_id: &str) -> Result<Option<SignalSnapshot>, StoreError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(snapshot_key(asset_id)).await?;

        match value {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, snapshot: &SignalSnapshot) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let json = serde_json::to_string(snapshot)?;
        conn.set::<_, _, ()>(snapshot_key(&snapshot.asset_id), json)
            .await?;
        debug!(
            "Saved snapshot {} -> {}",
            snapshot.asset_id, snapshot.confidence
        );
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
