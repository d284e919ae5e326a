//! Persistence boundary for organizer collections.
//!
//! # Responsibility
//! - Define the key-value contract the record store writes through.
//! - Isolate SQLite details from managers.
//!
//! # Invariants
//! - Collections are always written whole, one key per collection.
//! - Corrupt stored data is never surfaced as an error on load.

pub mod record_store;
