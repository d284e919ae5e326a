//! Application context owning the shared store and the four managers.
//!
//! # Responsibility
//! - Construct the record store, id allocator and managers once.
//! - Wire the reminder listener onto the task manager.
//! - Hand out per-collection guards so each collection has one owner.
//!
//! # Invariants
//! - Every manager shares the same store and id allocator.
//! - Access to a collection is serialized through its own mutex.

use crate::config::OrganizerConfig;
use crate::db::DbResult;
use crate::model::record::IdAllocator;
use crate::model::AnyRecord;
use crate::repo::record_store::{KvBackend, RecordStore, SqliteKvBackend};
use crate::service::manager::{
    EntityManager, NoteManager, TaskManager, TraderManager, TransactionManager,
};
use crate::service::reminder::{
    fire_reminder, LogNotificationSink, NotificationSink, ReminderListener, ReminderScheduler,
    ReminderSummary,
};
use log::info;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Explicitly constructed organizer state.
pub struct Organizer<B: KvBackend = SqliteKvBackend> {
    store: Arc<RecordStore<B>>,
    ids: Arc<IdAllocator>,
    tasks: Arc<Mutex<TaskManager<B>>>,
    notes: Arc<Mutex<NoteManager<B>>>,
    transactions: Arc<Mutex<TransactionManager<B>>>,
    traders: Arc<Mutex<TraderManager<B>>>,
    sink: Arc<dyn NotificationSink>,
}

impl Organizer<SqliteKvBackend> {
    /// Opens the database named by `config` with its storage quota.
    pub fn open(config: &OrganizerConfig, sink: Arc<dyn NotificationSink>) -> DbResult<Self> {
        let mut backend = SqliteKvBackend::open(&config.db_path)?;
        if let Some(quota_bytes) = config.storage_quota_bytes {
            backend = backend.with_quota(quota_bytes);
        }
        Ok(Self::new(backend, sink))
    }

    /// Opens a private in-memory organizer that logs its reminders.
    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::new(
            SqliteKvBackend::open_in_memory()?,
            Arc::new(LogNotificationSink),
        ))
    }
}

impl<B: KvBackend + 'static> Organizer<B> {
    /// Loads all four collections from `backend`.
    pub fn new(backend: B, sink: Arc<dyn NotificationSink>) -> Self {
        let store = Arc::new(RecordStore::new(backend));
        let ids = Arc::new(IdAllocator::new());

        let mut tasks: TaskManager<B> = EntityManager::load(Arc::clone(&store), Arc::clone(&ids));
        tasks.add_listener(ReminderListener::new(Arc::clone(&sink)));
        let notes: NoteManager<B> = EntityManager::load(Arc::clone(&store), Arc::clone(&ids));
        let transactions: TransactionManager<B> =
            EntityManager::load(Arc::clone(&store), Arc::clone(&ids));
        let traders: TraderManager<B> = EntityManager::load(Arc::clone(&store), Arc::clone(&ids));

        info!(
            "event=organizer_open module=organizer status=ok tasks={} notes={} transactions={} traders={} last_id={}",
            tasks.len(),
            notes.len(),
            transactions.len(),
            traders.len(),
            ids.last_id()
        );

        Self {
            store,
            ids,
            tasks: Arc::new(Mutex::new(tasks)),
            notes: Arc::new(Mutex::new(notes)),
            transactions: Arc::new(Mutex::new(transactions)),
            traders: Arc::new(Mutex::new(traders)),
            sink,
        }
    }

    pub fn store(&self) -> &RecordStore<B> {
        &self.store
    }

    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    // Managers only replace their collection after a confirmed write, so a
    // poisoned guard still protects a consistent collection.
    pub fn tasks(&self) -> MutexGuard<'_, TaskManager<B>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn notes(&self) -> MutexGuard<'_, NoteManager<B>> {
        self.notes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn transactions(&self) -> MutexGuard<'_, TransactionManager<B>> {
        self.transactions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn traders(&self) -> MutexGuard<'_, TraderManager<B>> {
        self.traders.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Shared handle to the task manager, for background workers.
    pub fn task_handle(&self) -> Arc<Mutex<TaskManager<B>>> {
        Arc::clone(&self.tasks)
    }

    /// Current reminder for incomplete tasks, without notifying.
    pub fn reminder_summary(&self) -> ReminderSummary {
        ReminderSummary::for_tasks(self.tasks().list())
    }

    /// Pushes the current reminder to the sink when tasks are pending.
    pub fn send_reminder(&self) -> ReminderSummary {
        fire_reminder(&self.tasks, self.sink.as_ref())
    }

    /// Starts periodic reminders on a background worker.
    pub fn start_reminders(&self, interval: Duration) -> std::io::Result<ReminderScheduler> {
        ReminderScheduler::spawn(self.task_handle(), Arc::clone(&self.sink), interval)
    }

    /// Every record of every collection, in collection key order.
    pub fn export(&self) -> Vec<AnyRecord> {
        let mut records = Vec::new();
        records.extend(self.tasks().list().iter().cloned().map(AnyRecord::Task));
        records.extend(self.notes().list().iter().cloned().map(AnyRecord::Note));
        records.extend(
            self.transactions()
                .list()
                .iter()
                .cloned()
                .map(AnyRecord::Transaction),
        );
        records.extend(self.traders().list().iter().cloned().map(AnyRecord::Trader));
        records
    }
}
