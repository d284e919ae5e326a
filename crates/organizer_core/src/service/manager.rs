//! Entity manager: one owned collection plus its CRUD use-cases.
//!
//! # Responsibility
//! - Validate candidate input before any mutation.
//! - Assign identity and creation time to new records.
//! - Persist the whole collection on every mutation.
//!
//! # Invariants
//! - The in-memory collection is replaced only after the store confirms the
//!   write, so memory and storage never diverge.
//! - Insertion order is preserved; records are never re-sorted.
//! - Listeners observe committed collections only.
//!
//! # See also
//! - crate::repo::record_store

use crate::model::note::Note;
use crate::model::record::{created_now, IdAllocator, Record, RecordId};
use crate::model::task::Task;
use crate::model::trader::Trader;
use crate::model::transaction::Transaction;
use crate::repo::record_store::{KvBackend, RecordStore, SqliteKvBackend, StoreError};
use crate::validate::ValidationError;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type ManagerResult<T> = Result<T, ManagerError>;

/// Failure of one manager operation. None of these are fatal.
#[derive(Debug)]
pub enum ManagerError {
    /// A candidate field failed its constraint.
    Validation(ValidationError),
    /// No record with this id exists in the collection.
    NotFound(RecordId),
    /// The largest representable id is already taken.
    IdsExhausted,
    /// The store rejected the write; the mutation was discarded.
    Persistence(StoreError),
}

impl Display for ManagerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::IdsExhausted => write!(f, "no record ids left to assign"),
            Self::Persistence(err) => write!(f, "failed to persist collection: {err}"),
        }
    }
}

impl Error for ManagerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) | Self::IdsExhausted => None,
            Self::Persistence(err) => Some(err),
        }
    }
}

impl From<ValidationError> for ManagerError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for ManagerError {
    fn from(value: StoreError) -> Self {
        Self::Persistence(value)
    }
}

/// Observer notified synchronously after each committed mutation.
pub trait ChangeListener<R>: Send {
    fn collection_changed(&self, records: &[R]);
}

/// CRUD owner of one collection.
pub struct EntityManager<R: Record, B: KvBackend = SqliteKvBackend> {
    store: Arc<RecordStore<B>>,
    ids: Arc<IdAllocator>,
    records: Vec<R>,
    listeners: Vec<Box<dyn ChangeListener<R>>>,
}

pub type TaskManager<B = SqliteKvBackend> = EntityManager<Task, B>;
pub type NoteManager<B = SqliteKvBackend> = EntityManager<Note, B>;
pub type TransactionManager<B = SqliteKvBackend> = EntityManager<Transaction, B>;
pub type TraderManager<B = SqliteKvBackend> = EntityManager<Trader, B>;

impl<R: Record, B: KvBackend> EntityManager<R, B> {
    /// Loads the collection from `store` and registers its ids with `ids`.
    pub fn load(store: Arc<RecordStore<B>>, ids: Arc<IdAllocator>) -> Self {
        let records: Vec<R> = store.load(R::COLLECTION);
        for record in &records {
            ids.observe(record.id());
        }

        Self {
            store,
            ids,
            records,
            listeners: Vec::new(),
        }
    }

    pub fn add_listener(&mut self, listener: impl ChangeListener<R> + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Records in insertion order.
    pub fn list(&self) -> &[R] {
        &self.records
    }

    pub fn get(&self, id: RecordId) -> Option<&R> {
        self.records.iter().find(|record| record.id() == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Validates `draft`, appends a new record and persists the collection.
    ///
    /// # Errors
    /// - `Validation` for the first failing field; nothing is stored.
    /// - `IdsExhausted` when no fresh id is left.
    /// - `Persistence` when the store rejects the write; nothing is kept.
    pub fn add(&mut self, draft: &R::Draft) -> ManagerResult<R> {
        let fields = self.validate("record_add", None, draft)?;
        let Some(id) = self.ids.next_id() else {
            error!(
                "event=record_add module=manager status=error collection={} error_code=ids_exhausted",
                R::COLLECTION
            );
            return Err(ManagerError::IdsExhausted);
        };
        let record = R::create(id, created_now(), fields);

        let mut next = self.records.clone();
        next.push(record.clone());
        self.commit("record_add", record.id(), next)?;

        Ok(record)
    }

    /// Replaces the mutable fields of record `id` with validated `draft`.
    ///
    /// `id` and `created_at` are carried over from the stored record.
    pub fn update(&mut self, id: RecordId, draft: &R::Draft) -> ManagerResult<R> {
        let index = self.position("record_update", id)?;
        let fields = self.validate("record_update", Some(id), draft)?;
        let updated = self.records[index].with_fields(fields);
        self.replace_at("record_update", index, updated)
    }

    /// Removes record `id` and persists the collection.
    pub fn remove(&mut self, id: RecordId) -> ManagerResult<()> {
        let index = self.position("record_remove", id)?;

        let mut next = self.records.clone();
        next.remove(index);
        self.commit("record_remove", id, next)
    }

    fn replace_at(&mut self, event: &str, index: usize, record: R) -> ManagerResult<R> {
        let mut next = self.records.clone();
        next[index] = record.clone();
        self.commit(event, record.id(), next)?;
        Ok(record)
    }

    fn position(&self, event: &str, id: RecordId) -> ManagerResult<usize> {
        match self.records.iter().position(|record| record.id() == id) {
            Some(index) => Ok(index),
            None => {
                warn!(
                    "event={event} module=manager status=not_found collection={} id={id}",
                    R::COLLECTION
                );
                Err(ManagerError::NotFound(id))
            }
        }
    }

    fn validate(
        &self,
        event: &str,
        id: Option<RecordId>,
        draft: &R::Draft,
    ) -> ManagerResult<R::Fields> {
        R::validate(draft).map_err(|err| {
            info!(
                "event={event} module=manager status=rejected collection={} id={} field={}",
                R::COLLECTION,
                id.map_or_else(|| "-".to_string(), |id| id.to_string()),
                err.field
            );
            ManagerError::Validation(err)
        })
    }

    fn commit(&mut self, event: &str, id: RecordId, next: Vec<R>) -> ManagerResult<()> {
        if let Err(err) = self.store.save(R::COLLECTION, &next) {
            error!(
                "event={event} module=manager status=error collection={} id={id} error_code=persist_failed",
                R::COLLECTION
            );
            return Err(err.into());
        }

        self.records = next;
        info!(
            "event={event} module=manager status=ok collection={} id={id} count={}",
            R::COLLECTION,
            self.records.len()
        );

        for listener in &self.listeners {
            listener.collection_changed(&self.records);
        }
        Ok(())
    }
}

impl<B: KvBackend> EntityManager<Task, B> {
    /// Flips the `completed` flag of task `id`.
    pub fn toggle(&mut self, id: RecordId) -> ManagerResult<Task> {
        let index = self.position("task_toggle", id)?;
        let toggled = self.records[index].toggled();
        self.replace_at("task_toggle", index, toggled)
    }
}
