pub mod engine;
pub mod notifier;
pub mod redis_store;
pub mod signals;
pub mod snapshot_store;
pub mod sqlite_store;

pub use engine::SignalEngine;
pub use notifier::{FlipBroadcaster, LogNotifier, Notifier};
pub use redis_store::RedisSnapshotStore;
pub use signals::{ConfidenceFilter, SignalFilter, SignalStore};
pub use snapshot_store::{InMemorySnapshotStore, SnapshotStore};
pub use sqlite_store::SqliteSnapshotStore;
