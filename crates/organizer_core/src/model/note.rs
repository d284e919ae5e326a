//! Note entity: free text up to 1000 characters.

use super::record::{CollectionKey, Record, RecordId};
use crate::validate::{validate_text, TextRule, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const NOTE_TEXT_RULE: TextRule = TextRule::required(1000);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: RecordId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub text: String,
}

impl NoteDraft {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteFields {
    pub text: String,
}

impl From<&Note> for NoteDraft {
    fn from(note: &Note) -> Self {
        Self::new(note.text.clone())
    }
}

impl Record for Note {
    type Draft = NoteDraft;
    type Fields = NoteFields;

    const COLLECTION: CollectionKey = CollectionKey::Notes;

    fn validate(draft: &NoteDraft) -> Result<NoteFields, ValidationError> {
        let text = validate_text(&draft.text, NOTE_TEXT_RULE).map_err(ValidationError::on("text"))?;
        Ok(NoteFields { text })
    }

    fn create(id: RecordId, created_at: DateTime<Utc>, fields: NoteFields) -> Self {
        Self {
            id,
            text: fields.text,
            created_at,
        }
    }

    fn with_fields(&self, fields: NoteFields) -> Self {
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
