//! Field validators shared by every entity manager.
//!
//! # Responsibility
//! - Check raw candidate values against required/length/range/date rules.
//! - Produce normalized values (trimmed text, parsed numbers) on success.
//!
//! # Invariants
//! - Every validator is total: any input maps to `Ok` or `Err`, never a panic.
//! - Text length is measured in characters after trimming.

use chrono::{DateTime, NaiveDate};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Length rule for free-text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRule {
    pub min_len: usize,
    pub max_len: usize,
    pub required: bool,
}

impl TextRule {
    /// Required text with `1..=max_len` characters.
    pub const fn required(max_len: usize) -> Self {
        Self {
            min_len: 1,
            max_len,
            required: true,
        }
    }

    /// Optional text; when present it must have `1..=max_len` characters.
    pub const fn optional(max_len: usize) -> Self {
        Self {
            min_len: 1,
            max_len,
            required: false,
        }
    }
}

/// Range rule for numeric fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberRule {
    pub min: f64,
    pub max: f64,
    pub required: bool,
}

impl NumberRule {
    /// Any finite value `>= 0`.
    pub const fn non_negative(required: bool) -> Self {
        Self {
            min: 0.0,
            max: f64::MAX,
            required,
        }
    }
}

/// Reason a single field value was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationErrorKind {
    /// Value is required but empty after trimming.
    Required,
    /// Trimmed length falls outside the allowed bounds.
    Length {
        min: usize,
        max: usize,
        actual: usize,
    },
    /// Value is present but does not parse as a finite number.
    NotANumber,
    /// Parsed number falls outside the allowed range.
    OutOfRange { min: f64, max: f64, value: f64 },
    /// Value is present but is not a calendar date.
    InvalidDate,
}

impl Display for ValidationErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Required => write!(f, "value is required"),
            Self::Length { min, max, actual } => {
                write!(f, "length {actual} outside {min}..={max}")
            }
            Self::NotANumber => write!(f, "value is not a number"),
            Self::OutOfRange { min, max, value } => {
                if *max == f64::MAX {
                    write!(f, "value {value} must be >= {min}")
                } else {
                    write!(f, "value {value} outside {min}..={max}")
                }
            }
            Self::InvalidDate => write!(f, "value is not a valid date"),
        }
    }
}

/// Field-scoped validation failure returned by entity managers.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Wire name of the offending field (for example `text` or `pay`).
    pub field: &'static str,
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    pub fn new(field: &'static str, kind: ValidationErrorKind) -> Self {
        Self { field, kind }
    }

    /// Adapter for `map_err` that tags a validator failure with its field.
    pub fn on(field: &'static str) -> impl Fn(ValidationErrorKind) -> Self {
        move |kind| Self::new(field, kind)
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid `{}`: {}", self.field, self.kind)
    }
}

impl Error for ValidationError {}

/// Validates free text and returns the trimmed value.
///
/// A non-required empty value is accepted and returned as `""`.
pub fn validate_text(value: &str, rule: TextRule) -> Result<String, ValidationErrorKind> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return if rule.required {
            Err(ValidationErrorKind::Required)
        } else {
            Ok(String::new())
        };
    }

    let actual = trimmed.chars().count();
    if actual < rule.min_len || actual > rule.max_len {
        return Err(ValidationErrorKind::Length {
            min: rule.min_len,
            max: rule.max_len,
            actual,
        });
    }

    Ok(trimmed.to_string())
}

/// Validates a numeric input and returns the parsed value.
///
/// Returns `Ok(None)` for a non-required empty value.
pub fn validate_number(value: &str, rule: NumberRule) -> Result<Option<f64>, ValidationErrorKind> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return if rule.required {
            Err(ValidationErrorKind::Required)
        } else {
            Ok(None)
        };
    }

    let parsed = match trimmed.parse::<f64>() {
        Ok(number) if number.is_finite() => number,
        _ => return Err(ValidationErrorKind::NotANumber),
    };

    if parsed < rule.min || parsed > rule.max {
        return Err(ValidationErrorKind::OutOfRange {
            min: rule.min,
            max: rule.max,
            value: parsed,
        });
    }

    Ok(Some(parsed))
}

/// Validates a calendar date in `YYYY-MM-DD` or RFC 3339 form.
///
/// Returns `Ok(None)` for a non-required empty value.
pub fn validate_date(value: &str, required: bool) -> Result<Option<NaiveDate>, ValidationErrorKind> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return if required {
            Err(ValidationErrorKind::Required)
        } else {
            Ok(None)
        };
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(Some(instant.date_naive()));
    }

    Err(ValidationErrorKind::InvalidDate)
}
