//! Core domain logic for the personal organizer.
//! This crate is the single source of truth for business invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod organizer;
pub mod repo;
pub mod service;
pub mod validate;

pub use config::{ConfigError, OrganizerConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{Note, NoteDraft};
pub use model::record::{CollectionKey, IdAllocator, Record, RecordId};
pub use model::task::{Task, TaskDraft};
pub use model::trader::{Trader, TraderDraft};
pub use model::transaction::{Transaction, TransactionDraft, TransactionTotals};
pub use model::AnyRecord;
pub use organizer::Organizer;
pub use repo::record_store::{
    KvBackend, RecordStore, SqliteKvBackend, StoreError, StoreResult, DEFAULT_QUOTA_BYTES,
};
pub use service::manager::{
    ChangeListener, EntityManager, ManagerError, ManagerResult, NoteManager, TaskManager,
    TraderManager, TransactionManager,
};
pub use service::reminder::{
    fire_reminder, incomplete, summarize, LogNotificationSink, NotificationSink, ReminderListener,
    ReminderScheduler, ReminderSummary,
};
pub use validate::{ValidationError, ValidationErrorKind};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
