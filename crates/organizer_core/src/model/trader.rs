//! Trader balance entity.

use super::record::{CollectionKey, Record, RecordId};
use crate::validate::{
    validate_number, validate_text, NumberRule, TextRule, ValidationError, ValidationErrorKind,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const TRADER_NAME_RULE: TextRule = TextRule::required(50);
pub const TRADER_AMOUNT_RULE: NumberRule = NumberRule::non_negative(true);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trader {
    pub id: RecordId,
    pub name: String,
    pub amount: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraderDraft {
    pub name: String,
    pub amount: String,
}

impl TraderDraft {
    pub fn new(name: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            amount: amount.into(),
        }
    }
}

impl From<&Trader> for TraderDraft {
    fn from(trader: &Trader) -> Self {
        Self::new(trader.name.clone(), trader.amount.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraderFields {
    pub name: String,
    pub amount: f64,
}

impl Record for Trader {
    type Draft = TraderDraft;
    type Fields = TraderFields;

    const COLLECTION: CollectionKey = CollectionKey::Traders;

    fn validate(draft: &TraderDraft) -> Result<TraderFields, ValidationError> {
        let name = validate_text(&draft.name, TRADER_NAME_RULE).map_err(ValidationError::on("name"))?;
        let amount = validate_number(&draft.amount, TRADER_AMOUNT_RULE)
            .map_err(ValidationError::on("amount"))?
            // A required rule never yields `None`; keep the mapping total anyway.
            .ok_or_else(|| ValidationError::new("amount", ValidationErrorKind::Required))?;
        Ok(TraderFields { name, amount })
    }

    fn create(id: RecordId, created_at: DateTime<Utc>, fields: TraderFields) -> Self {
        Self {
            id,
            name: fields.name,
            amount: fields.amount,
            created_at,
        }
    }

    fn with_fields(&self, fields: TraderFields) -> Self {
        Self {
            name: fields.name,
            amount: fields.amount,
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
