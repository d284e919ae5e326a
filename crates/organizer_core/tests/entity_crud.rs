use organizer_core::db::DbError;
use organizer_core::{
    CollectionKey, IdAllocator, KvBackend, LogNotificationSink, ManagerError, Note, NoteDraft,
    Organizer, OrganizerConfig, RecordId, RecordStore, SqliteKvBackend, StoreError, StoreResult,
    Task, TaskDraft, TaskManager, Trader, TraderDraft, Transaction, TransactionDraft,
    ValidationErrorKind,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// In-memory backend whose writes can be switched to fail.
struct SwitchableBackend {
    inner: SqliteKvBackend,
    reject_writes: AtomicBool,
}

impl SwitchableBackend {
    fn new() -> Self {
        Self {
            inner: SqliteKvBackend::open_in_memory().unwrap(),
            reject_writes: AtomicBool::new(false),
        }
    }

    fn reject_writes(&self) {
        self.reject_writes.store(true, Ordering::SeqCst);
    }
}

impl KvBackend for SwitchableBackend {
    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.read(key)
    }

    fn write(&self, key: &str, payload: &str) -> StoreResult<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Db(DbError::Sqlite(rusqlite::Error::InvalidQuery)));
        }
        self.inner.write(key, payload)
    }
}

fn organizer() -> Organizer {
    Organizer::open_in_memory().unwrap()
}

#[test]
fn task_add_update_remove_scenario() {
    let organizer = organizer();
    let mut tasks = organizer.tasks();

    let task = tasks.add(&TaskDraft::new("Buy milk")).unwrap();
    assert!(!task.completed);
    assert_eq!(task.text, "Buy milk");

    let updated = tasks
        .update(task.id, &TaskDraft::new("Buy milk and bread"))
        .unwrap();
    assert_eq!(updated.id, task.id);
    assert_eq!(updated.text, "Buy milk and bread");
    assert_eq!(updated.completed, task.completed);
    assert_eq!(updated.created_at, task.created_at);

    let listed: Vec<_> = tasks.list().iter().filter(|t| t.id == task.id).collect();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0], &updated);

    tasks.remove(task.id).unwrap();
    assert!(tasks.is_empty());
}

#[test]
fn add_returns_trimmed_fields_for_every_entity() {
    let organizer = organizer();

    let task = organizer.tasks().add(&TaskDraft::new("  call mom  ")).unwrap();
    assert_eq!(task.text, "call mom");

    let note = organizer
        .notes()
        .add(&NoteDraft::new("\n meeting notes \n"))
        .unwrap();
    assert_eq!(note.text, "meeting notes");

    let transaction = organizer
        .transactions()
        .add(
            &TransactionDraft::new(" 2024-01-01 ", " Sale ")
                .pay("")
                .receive(" 250.75 ")
                .contact(" Ali "),
        )
        .unwrap();
    assert_eq!(transaction.date, "2024-01-01");
    assert_eq!(transaction.operation, "Sale");
    assert_eq!(transaction.pay, 0.0);
    assert_eq!(transaction.receive, 250.75);
    assert_eq!(transaction.contact, "Ali");
    assert_eq!(transaction.call, "");

    let trader = organizer
        .traders()
        .add(&TraderDraft::new(" Samir ", "0"))
        .unwrap();
    assert_eq!(trader.name, "Samir");
    assert_eq!(trader.amount, 0.0);
}

#[test]
fn negative_pay_is_rejected_and_collection_stays_empty() {
    let organizer = organizer();
    let err = organizer
        .transactions()
        .add(&TransactionDraft::new("2024-01-01", "Sale").pay("-5"))
        .unwrap_err();

    match err {
        ManagerError::Validation(err) => {
            assert_eq!(err.field, "pay");
            assert!(matches!(err.kind, ValidationErrorKind::OutOfRange { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(organizer.transactions().is_empty());
    assert!(organizer
        .store()
        .backend()
        .read(CollectionKey::Transactions.as_str())
        .unwrap()
        .is_none());
}

#[test]
fn invalid_inputs_leave_collections_unchanged() {
    let organizer = organizer();
    let task = organizer.tasks().add(&TaskDraft::new("keep me")).unwrap();
    let trader = organizer
        .traders()
        .add(&TraderDraft::new("Samir", "10"))
        .unwrap();
    let tasks_before = organizer.tasks().list().to_vec();
    let traders_before = organizer.traders().list().to_vec();

    let too_long = "x".repeat(201);
    for draft in [TaskDraft::new(""), TaskDraft::new("   "), TaskDraft::new(too_long)] {
        assert!(matches!(
            organizer.tasks().add(&draft),
            Err(ManagerError::Validation(_))
        ));
        assert!(matches!(
            organizer.tasks().update(task.id, &draft),
            Err(ManagerError::Validation(_))
        ));
    }
    assert_eq!(organizer.tasks().list(), tasks_before.as_slice());

    assert!(organizer.notes().add(&NoteDraft::new("n".repeat(1001))).is_err());
    assert!(organizer.notes().is_empty());

    let bad_traders = [
        TraderDraft::new("", "10"),
        TraderDraft::new("n".repeat(51), "10"),
        TraderDraft::new("Samir", ""),
        TraderDraft::new("Samir", "ten"),
        TraderDraft::new("Samir", "-0.01"),
    ];
    for draft in &bad_traders {
        assert!(organizer.traders().add(draft).is_err());
        assert!(organizer.traders().update(trader.id, draft).is_err());
    }
    assert_eq!(organizer.traders().list(), traders_before.as_slice());

    let bad_transactions = [
        TransactionDraft::new("", "Sale"),
        TransactionDraft::new("31/12/2024", "Sale"),
        TransactionDraft::new("2024-01-01", ""),
        TransactionDraft::new("2024-01-01", "o".repeat(101)),
        TransactionDraft::new("2024-01-01", "Sale").receive("-1"),
        TransactionDraft::new("2024-01-01", "Sale").other("o".repeat(101)),
    ];
    for draft in &bad_transactions {
        assert!(organizer.transactions().add(draft).is_err());
    }
    assert!(organizer.transactions().is_empty());
}

#[test]
fn update_reports_not_found_before_validating() {
    let organizer = organizer();
    let err = organizer
        .notes()
        .update(RecordId(42), &NoteDraft::new(""))
        .unwrap_err();
    assert!(matches!(err, ManagerError::NotFound(RecordId(42))));
}

#[test]
fn removing_missing_id_is_a_no_op_failure() {
    let organizer = organizer();
    organizer.notes().add(&NoteDraft::new("stay")).unwrap();
    let before = organizer.notes().list().to_vec();

    let err = organizer.notes().remove(RecordId(1)).unwrap_err();
    assert!(matches!(err, ManagerError::NotFound(RecordId(1))));
    assert_eq!(organizer.notes().list(), before.as_slice());
}

#[test]
fn insertion_order_is_preserved() {
    let organizer = organizer();
    let mut traders = organizer.traders();
    for (name, amount) in [("Zed", "1"), ("Amal", "2"), ("Maher", "3")] {
        traders.add(&TraderDraft::new(name, amount)).unwrap();
    }
    let middle = traders.list()[1].id;
    traders.update(middle, &TraderDraft::new("Amal", "20")).unwrap();

    let names: Vec<_> = traders.list().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["Zed", "Amal", "Maher"]);
    assert_eq!(traders.list()[1].amount, 20.0);
}

#[test]
fn ids_are_unique_across_collections_and_rapid_inserts() {
    let organizer = organizer();
    let mut seen = HashSet::new();
    for index in 0..200 {
        let task = organizer
            .tasks()
            .add(&TaskDraft::new(format!("task {index}")))
            .unwrap();
        let note = organizer
            .notes()
            .add(&NoteDraft::new(format!("note {index}")))
            .unwrap();
        assert!(seen.insert(task.id));
        assert!(seen.insert(note.id));
    }

    let ids: Vec<_> = organizer.tasks().list().iter().map(|t| t.id).collect();
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn reopened_organizer_never_reuses_ids() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("organizer.sqlite3");

    let first_id = {
        let organizer = Organizer::new(
            SqliteKvBackend::open(&path).unwrap(),
            Arc::new(LogNotificationSink),
        );
        let far_future = RecordId(u64::MAX / 4);
        // Simulates a collection written by a clock running far ahead.
        organizer
            .store()
            .save(
                CollectionKey::Tasks,
                &[Task {
                    id: far_future,
                    text: "from the future".to_string(),
                    completed: false,
                    created_at: chrono::Utc::now(),
                }],
            )
            .unwrap();
        far_future
    };

    let organizer = Organizer::new(
        SqliteKvBackend::open(&path).unwrap(),
        Arc::new(LogNotificationSink),
    );
    assert_eq!(organizer.tasks().len(), 1);
    let note = organizer.notes().add(&NoteDraft::new("later")).unwrap();
    assert!(note.id > first_id);
}

#[test]
fn quota_failure_discards_the_mutation() {
    let backend = SqliteKvBackend::open_in_memory().unwrap().with_quota(400);
    let store = Arc::new(RecordStore::new(backend));
    let mut tasks = TaskManager::load(Arc::clone(&store), Arc::new(IdAllocator::new()));

    let kept = tasks.add(&TaskDraft::new("short")).unwrap();
    let stored_before = store.backend().read("tasks").unwrap();

    let err = tasks
        .add(&TaskDraft::new("y".repeat(200)))
        .and_then(|_| tasks.add(&TaskDraft::new("z".repeat(200))))
        .unwrap_err();
    assert!(matches!(
        err,
        ManagerError::Persistence(StoreError::QuotaExceeded { .. })
    ));

    // Whatever was committed before the failure is still what storage holds.
    let stored: Vec<Task> = store.load(CollectionKey::Tasks);
    assert_eq!(tasks.list(), stored.as_slice());
    assert!(tasks.get(kept.id).is_some());
    assert!(stored_before.is_some());
}

#[test]
fn edit_keeps_created_at_for_transactions() {
    let organizer = organizer();
    let original = organizer
        .transactions()
        .add(&TransactionDraft::new("2024-01-01", "Sale").pay("10"))
        .unwrap();

    let mut draft = TransactionDraft::from(&original);
    draft.operation = "Refund".to_string();
    draft.receive = "3".to_string();
    let updated: Transaction = organizer
        .transactions()
        .update(original.id, &draft)
        .unwrap();

    assert_eq!(updated.id, original.id);
    assert_eq!(updated.created_at, original.created_at);
    assert_eq!(updated.operation, "Refund");
    assert_eq!(updated.pay, 10.0);
    assert_eq!(updated.receive, 3.0);
}

#[test]
fn export_tags_records_by_kind() {
    let organizer = organizer();
    organizer.tasks().add(&TaskDraft::new("t")).unwrap();
    organizer
        .traders()
        .add(&TraderDraft::new("Samir", "5"))
        .unwrap();

    let exported = organizer.export();
    assert_eq!(exported.len(), 2);
    assert_eq!(exported[0].id(), organizer.tasks().list()[0].id);
    assert_eq!(exported[1].id(), organizer.traders().list()[0].id);
    assert_eq!(exported[0].collection(), CollectionKey::Tasks);
    assert_eq!(exported[1].collection(), CollectionKey::Traders);

    let json = serde_json::to_value(&exported).unwrap();
    assert_eq!(json[0]["kind"], "task");
    assert_eq!(json[1]["kind"], "trader");
    assert_eq!(json[1]["name"], "Samir");
}

#[test]
fn failed_writes_leave_every_collection_untouched() {
    let organizer = Organizer::new(SwitchableBackend::new(), Arc::new(LogNotificationSink));
    let task = organizer.tasks().add(&TaskDraft::new("Buy milk")).unwrap();
    organizer.tasks().add(&TaskDraft::new("Pay rent")).unwrap();
    let note = organizer.notes().add(&NoteDraft::new("keep")).unwrap();
    let trader = organizer
        .traders()
        .add(&TraderDraft::new("Samir", "10"))
        .unwrap();

    let tasks_before = organizer.tasks().list().to_vec();
    let notes_before = organizer.notes().list().to_vec();
    let traders_before = organizer.traders().list().to_vec();
    organizer.store().backend().reject_writes();

    let persistence_failed =
        |result: Result<(), ManagerError>| matches!(result, Err(ManagerError::Persistence(_)));

    let edited = organizer.tasks().update(task.id, &TaskDraft::new("Buy bread"));
    assert!(persistence_failed(edited.map(|_| ())));
    let toggled = organizer.tasks().toggle(task.id);
    assert!(persistence_failed(toggled.map(|_| ())));
    let removed = organizer.tasks().remove(task.id);
    assert!(persistence_failed(removed));
    let added = organizer.tasks().add(&TaskDraft::new("new"));
    assert!(persistence_failed(added.map(|_| ())));

    let edited = organizer.notes().update(note.id, &NoteDraft::new("changed"));
    assert!(persistence_failed(edited.map(|_| ())));
    let removed = organizer.notes().remove(note.id);
    assert!(persistence_failed(removed));

    let edited = organizer
        .traders()
        .update(trader.id, &TraderDraft::new("Samir", "99"));
    assert!(persistence_failed(edited.map(|_| ())));
    let removed = organizer.traders().remove(trader.id);
    assert!(persistence_failed(removed));

    assert_eq!(organizer.tasks().list(), tasks_before.as_slice());
    assert_eq!(organizer.notes().list(), notes_before.as_slice());
    assert_eq!(organizer.traders().list(), traders_before.as_slice());

    let stored_tasks: Vec<Task> = organizer.store().load(CollectionKey::Tasks);
    let stored_notes: Vec<Note> = organizer.store().load(CollectionKey::Notes);
    let stored_traders: Vec<Trader> = organizer.store().load(CollectionKey::Traders);
    assert_eq!(stored_tasks, tasks_before);
    assert_eq!(stored_notes, notes_before);
    assert_eq!(stored_traders, traders_before);
}

#[test]
fn add_fails_once_ids_are_exhausted() {
    let organizer = organizer();
    organizer.ids().observe(RecordId(u64::MAX));

    let err = organizer.tasks().add(&TaskDraft::new("late")).unwrap_err();
    assert!(matches!(err, ManagerError::IdsExhausted));
    assert!(organizer.notes().add(&NoteDraft::new("late")).is_err());

    assert!(organizer.tasks().is_empty());
    assert!(organizer.notes().is_empty());
    assert!(organizer
        .store()
        .backend()
        .read(CollectionKey::Tasks.as_str())
        .unwrap()
        .is_none());
}

#[test]
fn open_applies_the_configured_quota() {
    let dir = tempfile::tempdir().unwrap();
    let config = OrganizerConfig {
        db_path: dir.path().join("organizer.sqlite3"),
        storage_quota_bytes: Some(64),
        ..OrganizerConfig::default()
    };

    let organizer = Organizer::open(&config, Arc::new(LogNotificationSink)).unwrap();
    assert_eq!(organizer.store().backend().quota_bytes(), Some(64));
    let err = organizer
        .notes()
        .add(&NoteDraft::new("n".repeat(100)))
        .unwrap_err();
    assert!(matches!(
        err,
        ManagerError::Persistence(StoreError::QuotaExceeded { .. })
    ));
    drop(organizer);

    let unlimited = OrganizerConfig {
        storage_quota_bytes: None,
        ..config
    };
    let organizer = Organizer::open(&unlimited, Arc::new(LogNotificationSink)).unwrap();
    assert_eq!(organizer.store().backend().quota_bytes(), None);
    organizer
        .notes()
        .add(&NoteDraft::new("n".repeat(100)))
        .unwrap();
}
