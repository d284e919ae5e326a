//! Core use-case services.
//!
//! # Responsibility
//! - Own the in-memory collections and their CRUD use-cases.
//! - Derive and deliver task reminders.

pub mod manager;
pub mod reminder;
