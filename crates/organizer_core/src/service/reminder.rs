//! Incomplete-task reminders.
//!
//! # Responsibility
//! - Derive the incomplete tasks and a bullet-list summary of them.
//! - Push summaries to a `NotificationSink` after task mutations and on a
//!   fixed interval.
//!
//! # Invariants
//! - Summaries keep the collection order of tasks.
//! - Empty summaries are never pushed.
//! - Interval fires run on one worker thread and never overlap.

use crate::model::task::Task;
use crate::repo::record_store::KvBackend;
use crate::service::manager::{ChangeListener, TaskManager};
use log::{error, info};
use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Default interval between periodic reminders.
pub const DEFAULT_REMINDER_INTERVAL: Duration = Duration::from_secs(60 * 60);

const BULLET: &str = "• ";

/// Count and bullet list of incomplete tasks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReminderSummary {
    pub count: usize,
    /// One `• text` line per task, joined with `\n`.
    pub bullets: String,
}

impl ReminderSummary {
    /// Summarizes the incomplete tasks of a full collection.
    pub fn for_tasks(tasks: &[Task]) -> Self {
        summarize(incomplete(tasks))
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Single-string payload delivered to notification channels.
    pub fn message(&self) -> String {
        format!(
            "Reminder: you have {} incomplete task(s):\n{}",
            self.count, self.bullets
        )
    }
}

/// Tasks with `completed == false`, in collection order.
pub fn incomplete(tasks: &[Task]) -> Vec<&Task> {
    tasks.iter().filter(|task| !task.completed).collect()
}

/// Builds the reminder summary for already-filtered tasks.
pub fn summarize<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> ReminderSummary {
    let lines: Vec<String> = tasks
        .into_iter()
        .map(|task| format!("{BULLET}{}", task.text))
        .collect();

    ReminderSummary {
        count: lines.len(),
        bullets: lines.join("\n"),
    }
}

/// Delivery channel for reminder summaries.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, summary: &ReminderSummary);
}

/// Sink that writes reminders to the application log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn notify(&self, summary: &ReminderSummary) {
        info!(
            "event=task_reminder module=reminder status=sent count={}",
            summary.count
        );
        log::debug!("{}", summary.message().replace('\n', " | "));
    }
}

/// Task listener that re-derives and pushes the reminder on every mutation.
pub struct ReminderListener {
    sink: Arc<dyn NotificationSink>,
}

impl ReminderListener {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }
}

impl ChangeListener<Task> for ReminderListener {
    fn collection_changed(&self, records: &[Task]) {
        let summary = ReminderSummary::for_tasks(records);
        if !summary.is_empty() {
            self.sink.notify(&summary);
        }
    }
}

/// Computes the current reminder and pushes it when non-empty.
///
/// The manager lock is held only while summarizing, never while notifying.
pub fn fire_reminder<B: KvBackend>(
    tasks: &Mutex<TaskManager<B>>,
    sink: &dyn NotificationSink,
) -> ReminderSummary {
    let summary = {
        let manager = tasks.lock().unwrap_or_else(PoisonError::into_inner);
        ReminderSummary::for_tasks(manager.list())
    };

    if summary.is_empty() {
        info!("event=task_reminder module=reminder status=skipped count=0");
    } else {
        sink.notify(&summary);
    }
    summary
}

/// Background worker firing reminders on a fixed interval.
///
/// Dropping the scheduler stops the worker and waits for it to exit.
pub struct ReminderScheduler {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ReminderScheduler {
    /// Starts the worker. The first reminder fires one `interval` from now.
    ///
    /// # Errors
    /// - `InvalidInput` when `interval` is zero.
    /// - Returns the OS error when the worker thread cannot be spawned.
    pub fn spawn<B: KvBackend + 'static>(
        tasks: Arc<Mutex<TaskManager<B>>>,
        sink: Arc<dyn NotificationSink>,
        interval: Duration,
    ) -> io::Result<Self> {
        if interval.is_zero() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "reminder interval must be positive",
            ));
        }

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("task-reminder".to_string())
            .spawn(move || {
                info!(
                    "event=reminder_scheduler module=reminder status=start interval_secs={}",
                    interval.as_secs()
                );
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            fire_reminder(&tasks, sink.as_ref());
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                info!("event=reminder_scheduler module=reminder status=stop");
            })?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Stops the worker and waits for an in-flight fire to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("event=reminder_scheduler module=reminder status=error error_code=worker_panicked");
            }
        }
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::{incomplete, summarize, ReminderSummary};
    use crate::model::record::RecordId;
    use crate::model::task::Task;
    use chrono::Utc;

    fn task(id: u64, text: &str, completed: bool) -> Task {
        Task {
            id: RecordId(id),
            text: text.to_string(),
            completed,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn incomplete_keeps_order_and_drops_completed() {
        let tasks = vec![task(1, "A", false), task(2, "B", true), task(3, "C", false)];
        let open = incomplete(&tasks);
        let texts: Vec<_> = open.iter().map(|task| task.text.as_str()).collect();
        assert_eq!(texts, ["A", "C"]);

        let summary = summarize(open);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.bullets, "• A\n• C");
    }

    #[test]
    fn message_has_header_and_bullets() {
        let summary = ReminderSummary::for_tasks(&[task(1, "Buy milk", false)]);
        assert_eq!(
            summary.message(),
            "Reminder: you have 1 incomplete task(s):\n• Buy milk"
        );
    }

    #[test]
    fn all_completed_yields_empty_summary() {
        let summary = ReminderSummary::for_tasks(&[task(1, "done", true)]);
        assert!(summary.is_empty());
        assert_eq!(summary.bullets, "");
    }
}
