//! Organizer domain model.
//!
//! # Responsibility
//! - Define the four persisted entities and their candidate/validated forms.
//! - Provide a tagged union over all entities for cross-collection output.
//!
//! # Invariants
//! - Every record carries a `RecordId` unique within its collection.
//! - `created_at` is assigned once at creation and never rewritten.

pub mod note;
pub mod record;
pub mod task;
pub mod trader;
pub mod transaction;

use serde::{Deserialize, Serialize};

use self::note::Note;
use self::record::{CollectionKey, RecordId};
use self::task::Task;
use self::trader::Trader;
use self::transaction::Transaction;

/// Any persisted record, tagged by entity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnyRecord {
    Task(Task),
    Note(Note),
    Transaction(Transaction),
    Trader(Trader),
}

impl AnyRecord {
    pub fn collection(&self) -> CollectionKey {
        match self {
            Self::Task(_) => CollectionKey::Tasks,
            Self::Note(_) => CollectionKey::Notes,
            Self::Transaction(_) => CollectionKey::Transactions,
            Self::Trader(_) => CollectionKey::Traders,
        }
    }

    pub fn id(&self) -> RecordId {
        match self {
            Self::Task(task) => task.id,
            Self::Note(note) => note.id,
            Self::Transaction(transaction) => transaction.id,
            Self::Trader(trader) => trader.id,
        }
    }
}
