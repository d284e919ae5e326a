//! Financial transaction entity.
//!
//! # Invariants
//! - `date` is a parseable calendar date, stored as entered (trimmed).
//! - `operation` holds 1..=100 characters.
//! - `pay` and `receive` are finite and `>= 0`; empty input stores `0`.
//! - `call`, `contact` and `other` are optional, at most 100 characters.

use super::record::{CollectionKey, Record, RecordId};
use crate::validate::{
    validate_date, validate_number, validate_text, NumberRule, TextRule, ValidationError,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const OPERATION_RULE: TextRule = TextRule::required(100);
pub const AMOUNT_RULE: NumberRule = NumberRule::non_negative(false);
pub const DETAIL_RULE: TextRule = TextRule::optional(100);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: RecordId,
    pub date: String,
    pub operation: String,
    #[serde(default)]
    pub pay: f64,
    #[serde(default)]
    pub receive: f64,
    #[serde(default)]
    pub call: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub other: String,
    pub created_at: DateTime<Utc>,
}

/// Raw transaction form input; numeric fields are kept as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionDraft {
    pub date: String,
    pub operation: String,
    pub pay: String,
    pub receive: String,
    pub call: String,
    pub contact: String,
    pub other: String,
}

impl TransactionDraft {
    pub fn new(date: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            operation: operation.into(),
            ..Self::default()
        }
    }

    pub fn pay(mut self, value: impl Into<String>) -> Self {
        self.pay = value.into();
        self
    }

    pub fn receive(mut self, value: impl Into<String>) -> Self {
        self.receive = value.into();
        self
    }

    pub fn call(mut self, value: impl Into<String>) -> Self {
        self.call = value.into();
        self
    }

    pub fn contact(mut self, value: impl Into<String>) -> Self {
        self.contact = value.into();
        self
    }

    pub fn other(mut self, value: impl Into<String>) -> Self {
        self.other = value.into();
        self
    }
}

impl From<&Transaction> for TransactionDraft {
    /// Pre-fills an edit form with the stored values.
    fn from(transaction: &Transaction) -> Self {
        Self {
            date: transaction.date.clone(),
            operation: transaction.operation.clone(),
            pay: transaction.pay.to_string(),
            receive: transaction.receive.to_string(),
            call: transaction.call.clone(),
            contact: transaction.contact.clone(),
            other: transaction.other.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFields {
    pub date: String,
    pub operation: String,
    pub pay: f64,
    pub receive: f64,
    pub call: String,
    pub contact: String,
    pub other: String,
}

impl Record for Transaction {
    type Draft = TransactionDraft;
    type Fields = TransactionFields;

    const COLLECTION: CollectionKey = CollectionKey::Transactions;

    fn validate(draft: &TransactionDraft) -> Result<TransactionFields, ValidationError> {
        validate_date(&draft.date, true).map_err(ValidationError::on("date"))?;
        let operation =
            validate_text(&draft.operation, OPERATION_RULE).map_err(ValidationError::on("operation"))?;
        let pay = validate_number(&draft.pay, AMOUNT_RULE).map_err(ValidationError::on("pay"))?;
        let receive =
            validate_number(&draft.receive, AMOUNT_RULE).map_err(ValidationError::on("receive"))?;
        let call = validate_text(&draft.call, DETAIL_RULE).map_err(ValidationError::on("call"))?;
        let contact =
            validate_text(&draft.contact, DETAIL_RULE).map_err(ValidationError::on("contact"))?;
        let other = validate_text(&draft.other, DETAIL_RULE).map_err(ValidationError::on("other"))?;

        Ok(TransactionFields {
            date: draft.date.trim().to_string(),
            operation,
            pay: pay.unwrap_or(0.0),
            receive: receive.unwrap_or(0.0),
            call,
            contact,
            other,
        })
    }

    fn create(id: RecordId, created_at: DateTime<Utc>, fields: TransactionFields) -> Self {
        Self {
            id,
            date: fields.date,
            operation: fields.operation,
            pay: fields.pay,
            receive: fields.receive,
            call: fields.call,
            contact: fields.contact,
            other: fields.other,
            created_at,
        }
    }

    fn with_fields(&self, fields: TransactionFields) -> Self {
        Self::create(self.id, self.created_at, fields)
    }

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Totals over a transaction collection.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransactionTotals {
    pub pay: f64,
    pub receive: f64,
}

impl TransactionTotals {
    pub fn of(transactions: &[Transaction]) -> Self {
        transactions
            .iter()
            .fold(Self::default(), |acc, transaction| Self {
                pay: acc.pay + transaction.pay,
                receive: acc.receive + transaction.receive,
            })
    }

    pub fn net(&self) -> f64 {
        self.receive - self.pay
    }
}
