//! SQLite persistence for signal snapshots.
//!
//! Survives restarts so the first cycle after a restart compares against the
//! last state seen before shutdown instead of re-baselining.

use crate::error::StoreError;
use crate::services::snapshot_store::SnapshotStore;
use crate::types::{Confidence, SignalSnapshot};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// SQLite-backed snapshot store.
pub struct SqliteSnapshotStore {
    conn: Mutex<Connection>,
}

impl SqliteSnapshotStore {
    /// Open (or create) a store at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        info!("SQLite snapshot store initialized");
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing).
    pub fn new_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        debug!("In-memory SQLite snapshot store initialized");
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("sqlite connection poisoned".to_string()))
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS signal_snapshots (
                asset_id TEXT PRIMARY KEY,
                confidence TEXT NOT NULL,
                reference_price REAL NOT NULL,
                recorded_at INTEGER NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    /// Number of recorded assets.
    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM signal_snapshots", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[async_trait]
impl SnapshotStore for SqliteSnapshotStore {
    async fn get(&self, asset_id: &str) -> Result<Option<SignalSnapshot>, StoreError> {
        let conn = self.lock()?;

        let result = conn.query_row(
            "SELECT confidence, reference_price, recorded_at
             FROM signal_snapshots WHERE asset_id = ?1",
            params![asset_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            },
        );

        let (confidence, reference_price, recorded_at) = match result {
            Ok(row) => row,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let confidence = Confidence::from_str(&confidence).ok_or_else(|| StoreError::Corrupt {
            asset_id: asset_id.to_string(),
            detail: format!("unknown confidence {:?}", confidence),
        })?;

        Ok(Some(SignalSnapshot {
            asset_id: asset_id.to_string(),
            confidence,
            reference_price,
            recorded_at,
        }))
    }

    async fn put(&self, snapshot: &SignalSnapshot) -> Result<(), StoreError> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT OR REPLACE INTO signal_snapshots
             (asset_id, confidence, reference_price, recorded_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                snapshot.asset_id,
                snapshot.confidence.as_str(),
                snapshot.reference_price,
                snapshot.recorded_at,
            ],
        )?;

        debug!(
            "Saved snapshot {} -> {}",
            snapshot.asset_id, snapshot.confidence
        );
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}
