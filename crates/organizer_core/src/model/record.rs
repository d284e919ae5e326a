//! Shared record identity, collection keys and the `Record` contract.
//!
//! # Responsibility
//! - Define the stable `RecordId` and its allocator.
//! - Name the four fixed collection keys used by the store.
//! - Describe how an entity validates drafts and builds/updates itself.
//!
//! # Invariants
//! - `IdAllocator` hands out strictly increasing ids, never reusing one.
//! - `Record::with_fields` keeps `id` and `created_at` untouched.

use crate::validate::ValidationError;
use chrono::{DateTime, SubsecRound, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

/// Stable identifier for one record inside its collection.
///
/// Serialized as a bare JSON integer, so collections written with
/// millisecond ids load unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(RecordId)
    }
}

/// Storage key of one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKey {
    Tasks,
    Notes,
    Transactions,
    Traders,
}

impl CollectionKey {
    pub const ALL: [CollectionKey; 4] = [
        CollectionKey::Tasks,
        CollectionKey::Notes,
        CollectionKey::Transactions,
        CollectionKey::Traders,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::Notes => "notes",
            Self::Transactions => "transactions",
            Self::Traders => "traders",
        }
    }
}

impl Display for CollectionKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strictly increasing id source.
///
/// Ids follow wall-clock milliseconds when the clock moves forward and fall
/// back to `last + 1` otherwise, so rapid inserts within one millisecond
/// still get distinct ids.
#[derive(Debug, Default)]
pub struct IdAllocator {
    last: AtomicU64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes sure later ids are greater than `id`.
    ///
    /// Called for every record loaded from storage.
    pub fn observe(&self, id: RecordId) {
        self.last.fetch_max(id.0, Ordering::SeqCst);
    }

    /// Returns a fresh id greater than any id handed out or observed.
    ///
    /// Returns `None` once `u64::MAX` has been handed out or observed.
    pub fn next_id(&self) -> Option<RecordId> {
        let now = now_epoch_ms();
        self.last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last.checked_add(1)?))
            })
            .ok()
            .map(|previous| RecordId(now.max(previous + 1)))
    }

    /// Largest id handed out or observed so far.
    pub fn last_id(&self) -> RecordId {
        RecordId(self.last.load(Ordering::SeqCst))
    }
}

/// Creation timestamp at millisecond precision.
pub fn created_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

fn now_epoch_ms() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

/// Contract every persisted entity implements.
///
/// `Draft` holds raw candidate values as typed by the user; `Fields` holds
/// the validated, normalized mutable fields.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + 'static {
    type Draft;
    type Fields;

    /// Collection this entity is stored under.
    const COLLECTION: CollectionKey;

    /// Checks every constrained field in form order, returning the first
    /// failure.
    fn validate(draft: &Self::Draft) -> Result<Self::Fields, ValidationError>;

    /// Builds a new record from validated fields.
    fn create(id: RecordId, created_at: DateTime<Utc>, fields: Self::Fields) -> Self;

    /// Returns a copy with mutable fields replaced; identity and creation
    /// time are preserved.
    fn with_fields(&self, fields: Self::Fields) -> Self;

    fn id(&self) -> RecordId;

    fn created_at(&self) -> DateTime<Utc>;
}
