//! Task entity.
//!
//! # Invariants
//! - `text` is trimmed and holds 1..=200 characters.
//! - New tasks start with `completed = false`.
//! - Editing replaces `text` only; `completed` changes through toggling.

use super::record::{CollectionKey, Record, RecordId};
use crate::validate::{validate_text, TextRule, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const TASK_TEXT_RULE: TextRule = TextRule::required(200);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: RecordId,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Raw task input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub text: String,
}

impl TaskDraft {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Validated task fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFields {
    pub text: String,
}

impl From<&Task> for TaskDraft {
    fn from(task: &Task) -> Self {
        Self::new(task.text.clone())
    }
}

impl Task {
    /// Returns a copy with `completed` flipped.
    pub fn toggled(&self) -> Self {
        Self {
            completed: !self.completed,
            ..self.clone()
        }
    }
}

impl Record for Task {
    type Draft = TaskDraft;
    type Fields = TaskFields;

    const COLLECTION: CollectionKey = CollectionKey::Tasks;

    fn validate(draft: &TaskDraft) -> Result<TaskFields, ValidationError> {
        let text = validate_text(&draft.text, TASK_TEXT_RULE).map_err(ValidationError::on("text"))?;
        Ok(TaskFields { text })
    }

    fn create(id: RecordId, created_at: DateTime<Utc>, fields: TaskFields) -> Self {
        Self {
            id,
            text: fields.text,
            completed: false,
            created_at,
        }
    }

    fn with_fields(&self, fields: TaskFields) -> Self {
        Self {
            text: fields.text,
            ..self.clone()
        }
    }

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
