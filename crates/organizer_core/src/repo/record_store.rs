//! Collection persistence over a key-value boundary.
//!
//! # Responsibility
//! - Map each `CollectionKey` to one serialized JSON array.
//! - Keep SQL and quota accounting inside the SQLite backend.
//!
//! # Invariants
//! - `load` never fails: absent, unreadable or corrupt data yields an empty
//!   collection.
//! - `save` writes the whole collection in one statement, or nothing.
//! - A write that would push total usage past the quota is rejected before
//!   touching stored data.

use crate::db::{open_db, open_db_in_memory, DbError, DbResult};
use crate::model::record::CollectionKey;
use log::{error, info, warn};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

/// Default storage budget, matching a browser origin's local storage.
pub const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence failure for one collection write or read.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    QuotaExceeded {
        key: String,
        required_bytes: u64,
        quota_bytes: u64,
    },
    Serialize(serde_json::Error),
    /// A previous holder of the connection lock panicked.
    Poisoned,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::QuotaExceeded {
                key,
                required_bytes,
                quota_bytes,
            } => write!(
                f,
                "storage quota exceeded writing `{key}`: {required_bytes} bytes needed, quota is {quota_bytes}"
            ),
            Self::Serialize(err) => write!(f, "failed to serialize collection: {err}"),
            Self::Poisoned => write!(f, "storage connection lock poisoned"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialize(err) => Some(err),
            Self::QuotaExceeded { .. } | Self::Poisoned => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// Durable key-value storage used by `RecordStore`.
pub trait KvBackend: Send + Sync {
    /// Returns the payload stored under `key`, if any.
    fn read(&self, key: &str) -> StoreResult<Option<String>>;
    /// Replaces the payload stored under `key` atomically.
    fn write(&self, key: &str, payload: &str) -> StoreResult<()>;
}

/// SQLite-backed key-value storage with an optional byte quota.
pub struct SqliteKvBackend {
    conn: Mutex<Connection>,
    quota_bytes: Option<u64>,
}

impl SqliteKvBackend {
    /// Wraps a connection already prepared by `open_db`/`open_db_in_memory`.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            quota_bytes: None,
        }
    }

    /// Opens (or creates) a database file.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    /// Caps total stored bytes (keys plus payloads).
    pub fn with_quota(mut self, quota_bytes: u64) -> Self {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    pub fn quota_bytes(&self) -> Option<u64> {
        self.quota_bytes
    }

    /// Total bytes currently stored across all keys.
    pub fn usage_bytes(&self) -> StoreResult<u64> {
        let conn = self.lock()?;
        usage_excluding(&conn, None)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl KvBackend for SqliteKvBackend {
    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = self.lock()?;
        let payload = conn
            .query_row(
                "SELECT payload FROM collections WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(payload)
    }

    fn write(&self, key: &str, payload: &str) -> StoreResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        if let Some(quota_bytes) = self.quota_bytes {
            let others = usage_excluding(&tx, Some(key))?;
            let required_bytes = others + entry_size(key, payload);
            if required_bytes > quota_bytes {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    required_bytes,
                    quota_bytes,
                });
            }
        }

        tx.execute(
            "INSERT INTO collections (key, payload, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at;",
            params![key, payload],
        )?;
        tx.commit()?;
        Ok(())
    }
}

fn entry_size(key: &str, payload: &str) -> u64 {
    (key.len() + payload.len()) as u64
}

fn usage_excluding(conn: &Connection, key: Option<&str>) -> StoreResult<u64> {
    let used: i64 = conn.query_row(
        "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(payload AS BLOB))), 0)
         FROM collections
         WHERE ?1 IS NULL OR key != ?1;",
        [key],
        |row| row.get(0),
    )?;
    Ok(u64::try_from(used).unwrap_or(0))
}

/// Whole-collection JSON persistence over a `KvBackend`.
pub struct RecordStore<B: KvBackend = SqliteKvBackend> {
    backend: B,
}

impl<B: KvBackend> RecordStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Loads the collection stored under `key`.
    ///
    /// Absent, unreadable or unparseable data is reported through logging and
    /// treated as an empty collection.
    pub fn load<R: DeserializeOwned>(&self, key: CollectionKey) -> Vec<R> {
        let started_at = Instant::now();
        let payload = match self.backend.read(key.as_str()) {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                info!(
                    "event=collection_load module=store status=absent collection={key} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                return Vec::new();
            }
            Err(err) => {
                error!(
                    "event=collection_load module=store status=error collection={key} duration_ms={} error_code=read_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<R>>(&payload) {
            Ok(records) => {
                info!(
                    "event=collection_load module=store status=ok collection={key} count={} duration_ms={}",
                    records.len(),
                    started_at.elapsed().as_millis()
                );
                records
            }
            Err(err) => {
                warn!(
                    "event=collection_load module=store status=corrupt collection={key} bytes={} duration_ms={} error_code=corrupt_state error={}",
                    payload.len(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Vec::new()
            }
        }
    }

    /// Serializes and stores the full collection under `key`.
    ///
    /// # Errors
    /// - `Serialize` when a record cannot be encoded.
    /// - `QuotaExceeded` or `Db` when the backend rejects the write.
    pub fn save<R: Serialize>(&self, key: CollectionKey, records: &[R]) -> StoreResult<()> {
        let started_at = Instant::now();
        let result = serde_json::to_string(records)
            .map_err(StoreError::from)
            .and_then(|payload| {
                self.backend.write(key.as_str(), &payload)?;
                Ok(payload.len())
            });

        match result {
            Ok(bytes) => {
                info!(
                    "event=collection_save module=store status=ok collection={key} count={} bytes={} duration_ms={}",
                    records.len(),
                    bytes,
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=collection_save module=store status=error collection={key} count={} duration_ms={} error_code={} error={}",
                    records.len(),
                    started_at.elapsed().as_millis(),
                    error_code(&err),
                    err
                );
                Err(err)
            }
        }
    }
}

fn error_code(err: &StoreError) -> &'static str {
    match err {
        StoreError::Db(_) => "db_write_failed",
        StoreError::QuotaExceeded { .. } => "quota_exceeded",
        StoreError::Serialize(_) => "serialize_failed",
        StoreError::Poisoned => "lock_poisoned",
    }
}
