//! Persistence contract for per-asset signal snapshots.

use crate::error::StoreError;
use crate::types::SignalSnapshot;
use async_trait::async_trait;
use dashmap::DashMap;

/// Durable last-known classification per asset.
///
/// Reads and writes are keyed by asset id; a write fully replaces the
/// previous snapshot.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Last persisted snapshot, or `None` if the asset was never recorded.
    async fn get(&self, asset_id: &str) -> Result<Option<SignalSnapshot>, StoreError>;

    /// Overwrite the asset's snapshot.
    async fn put(&self, snapshot: &SignalSnapshot) -> Result<(), StoreError>;

    /// Backend name for logging.
    fn backend(&self) -> &'static str;
}

/// Process-local store. Snapshots are lost on restart.
#[derive(Default)]
pub struct InMemorySnapshotStore {
    snapshots: DashMap<String, SignalSnapshot>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn get(&self, asset_id: &str) -> Result<Option<SignalSnapshot>, StoreError> {
        Ok(self.snapshots.get(asset_id).map(|s| s.value().clone()))
    }

    async fn put(&self, snapshot: &SignalSnapshot) -> Result<(), StoreError> {
        self.snapshots
            .insert(snapshot.asset_id.clone(), snapshot.clone());
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Confidence;

    fn snapshot(asset_id: &str, confidence: Confidence) -> SignalSnapshot {
        SignalSnapshot {
            asset_id: asset_id.to_string(),
            confidence,
            reference_price: 100.0,
            recorded_at: 1_700_000_000_000,
        }
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = InMemorySnapshotStore::new();
        assert!(store.get("BTCUSDT").await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = InMemorySnapshotStore::new();
        store
            .put(&snapshot("BTCUSDT", Confidence::WeakBullish))
            .await
            .unwrap();
        store
            .put(&snapshot("BTCUSDT", Confidence::ConfirmedBearish))
            .await
            .unwrap();

        let loaded = store.get("BTCUSDT").await.unwrap().unwrap();
        assert_eq!(loaded.confidence, Confidence::ConfirmedBearish);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_assets_are_independent() {
        let store = InMemorySnapshotStore::new();
        store
            .put(&snapshot("BTCUSDT", Confidence::Neutral))
            .await
            .unwrap();
        assert!(store.get("ETHUSDT").await.unwrap().is_none());
        assert_eq!(store.backend(), "memory");
    }
}
