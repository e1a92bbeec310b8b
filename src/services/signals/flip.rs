//! Flip detection against the last persisted snapshot.

use crate::services::snapshot_store::SnapshotStore;
use crate::types::{AssetSignal, FlipEvent, SignalSnapshot};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Decide whether moving from `prior` to `current` is an alert-worthy flip.
///
/// Only a change of confidence that lands on a confirmed state produces an
/// event. The first observation of an asset is a baseline.
pub fn detect_flip(
    asset_id: &str,
    current: &AssetSignal,
    reference_price: f64,
    prior: Option<&SignalSnapshot>,
) -> Option<FlipEvent> {
    let prior = prior?;

    if prior.confidence == current.confidence || !current.confidence.is_confirmed() {
        return None;
    }

    Some(FlipEvent {
        asset_id: asset_id.to_string(),
        from: prior.confidence,
        to: current.confidence,
        reference_price,
        timestamp: chrono::Utc::now().timestamp_millis(),
    })
}

/// Runs [`detect_flip`] against a snapshot store and records the new state.
#[derive(Clone)]
pub struct FlipDetector {
    store: Arc<dyn SnapshotStore>,
}

impl FlipDetector {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn SnapshotStore> {
        &self.store
    }

    /// Compare against the stored snapshot, then overwrite it.
    ///
    /// A failed read counts as no prior record. A failed write is retried
    /// once and otherwise only logged.
    pub async fn observe(
        &self,
        asset_id: &str,
        signal: &AssetSignal,
        reference_price: f64,
    ) -> Option<FlipEvent> {
        let prior = match self.store.get(asset_id).await {
            Ok(prior) => prior,
            Err(e) => {
                warn!(
                    "Snapshot read failed for {} ({}), treating as first observation: {}",
                    asset_id,
                    self.store.backend(),
                    e
                );
                None
            }
        };

        let event = detect_flip(asset_id, signal, reference_price, prior.as_ref());

        match (&prior, &event) {
            (None, _) => debug!("Baseline for {}: {}", asset_id, signal.confidence),
            (Some(_), Some(e)) => info!(
                "Flip detected for {}: {} -> {} at {}",
                asset_id, e.from, e.to, e.reference_price
            ),
            (Some(p), None) if p.confidence != signal.confidence => debug!(
                "Suppressed transition for {}: {} -> {}",
                asset_id, p.confidence, signal.confidence
            ),
            _ => {}
        }

        let snapshot = SignalSnapshot {
            asset_id: asset_id.to_string(),
            confidence: signal.confidence,
            reference_price,
            recorded_at: chrono::Utc::now().timestamp_millis(),
        };

        if let Err(e) = self.store.put(&snapshot).await {
            warn!("Snapshot write failed for {}, retrying: {}", asset_id, e);
            if let Err(e) = self.store.put(&snapshot).await {
                error!("Snapshot write failed for {}: {}", asset_id, e);
            }
        }

        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::services::snapshot_store::InMemorySnapshotStore;
    use crate::types::{Confidence, Direction};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn signal(confidence: Confidence) -> AssetSignal {
        AssetSignal {
            overall: confidence.direction(),
            confidence,
            strength: 0.5,
            bullish_count: 2,
            bearish_count: 2,
            total: 4,
        }
    }

    fn snapshot(confidence: Confidence) -> SignalSnapshot {
        SignalSnapshot {
            asset_id: "BTCUSDT".to_string(),
            confidence,
            reference_price: 60_000.0,
            recorded_at: 0,
        }
    }

    // ===== Pure Decision Tests =====

    #[test]
    fn test_first_observation_is_baseline() {
        let current = signal(Confidence::ConfirmedBullish);
        assert!(detect_flip("BTCUSDT", &current, 1.0, None).is_none());
    }

    #[test]
    fn test_same_confidence_never_flips() {
        let prior = snapshot(Confidence::ConfirmedBullish);
        let mut current = signal(Confidence::ConfirmedBullish);
        current.strength = 1.0;
        assert!(detect_flip("BTCUSDT", &current, 1.0, Some(&prior)).is_none());
    }

    #[test]
    fn test_landing_on_weak_is_suppressed() {
        let prior = snapshot(Confidence::ConfirmedBullish);
        let current = signal(Confidence::WeakBearish);
        assert!(detect_flip("BTCUSDT", &current, 1.0, Some(&prior)).is_none());

        let current = signal(Confidence::Neutral);
        assert!(detect_flip("BTCUSDT", &current, 1.0, Some(&prior)).is_none());
    }

    #[test]
    fn test_weak_to_confirmed_flips() {
        let prior = snapshot(Confidence::WeakBearish);
        let current = signal(Confidence::ConfirmedBearish);
        let event = detect_flip("BTCUSDT", &current, 58_000.0, Some(&prior)).unwrap();
        assert_eq!(event.asset_id, "BTCUSDT");
        assert_eq!(event.from, Confidence::WeakBearish);
        assert_eq!(event.to, Confidence::ConfirmedBearish);
        assert_eq!(event.reference_price, 58_000.0);
    }

    #[test]
    fn test_confirmed_reversal_flips() {
        let prior = snapshot(Confidence::ConfirmedBearish);
        let current = signal(Confidence::ConfirmedBullish);
        let event = detect_flip("BTCUSDT", &current, 1.0, Some(&prior)).unwrap();
        assert_eq!(event.to.direction(), Direction::Bullish);
    }

    // ===== Detector Tests =====

    #[tokio::test]
    async fn test_detector_sequence() {
        let store = Arc::new(InMemorySnapshotStore::new());
        let detector = FlipDetector::new(store.clone());

        let steps = [
            (Confidence::ConfirmedBullish, false),
            (Confidence::ConfirmedBullish, false),
            (Confidence::WeakBearish, false),
            (Confidence::ConfirmedBearish, true),
            (Confidence::Neutral, false),
            (Confidence::ConfirmedBearish, true),
        ];

        for (confidence, expect_event) in steps {
            let event = detector
                .observe("BTCUSDT", &signal(confidence), 100.0)
                .await;
            assert_eq!(event.is_some(), expect_event, "at {}", confidence);
            let stored = store.get("BTCUSDT").await.unwrap().unwrap();
            assert_eq!(stored.confidence, confidence);
        }
    }

    struct FailingStore {
        reads: AtomicUsize,
        writes: AtomicUsize,
        fail_writes: usize,
        inner: InMemorySnapshotStore,
    }

    #[async_trait]
    impl SnapshotStore for FailingStore {
        async fn get(&self, _asset_id: &str) -> Result<Option<SignalSnapshot>, StoreError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Unavailable("down".to_string()))
        }

        async fn put(&self, snapshot: &SignalSnapshot) -> Result<(), StoreError> {
            let attempt = self.writes.fetch_add(1, Ordering::SeqCst);
            if attempt < self.fail_writes {
                return Err(StoreError::Unavailable("down".to_string()));
            }
            self.inner.put(snapshot).await
        }

        fn backend(&self) -> &'static str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_read_failure_is_baseline() {
        let store = Arc::new(FailingStore {
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            fail_writes: 0,
            inner: InMemorySnapshotStore::new(),
        });
        let detector = FlipDetector::new(store.clone());

        let event = detector
            .observe("BTCUSDT", &signal(Confidence::ConfirmedBullish), 1.0)
            .await;
        assert!(event.is_none());
        assert_eq!(store.reads.load(Ordering::SeqCst), 1);
        assert_eq!(store.inner.len(), 1);
    }

    #[tokio::test]
    async fn test_write_retried_once() {
        let store = Arc::new(FailingStore {
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            fail_writes: 1,
            inner: InMemorySnapshotStore::new(),
        });
        let detector = FlipDetector::new(store.clone());

        detector
            .observe("BTCUSDT", &signal(Confidence::Neutral), 1.0)
            .await;
        assert_eq!(store.writes.load(Ordering::SeqCst), 2);
        assert_eq!(store.inner.len(), 1);
    }

    #[tokio::test]
    async fn test_write_gives_up_after_retry() {
        let store = Arc::new(FailingStore {
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            fail_writes: 5,
            inner: InMemorySnapshotStore::new(),
        });
        let detector = FlipDetector::new(store.clone());

        detector
            .observe("BTCUSDT", &signal(Confidence::Neutral), 1.0)
            .await;
        assert_eq!(store.writes.load(Ordering::SeqCst), 2);
        assert!(store.inner.is_empty());
    }
}
