//! Domain model for contacts and their calendar annotations.
//!
//! # Responsibility
//! - Define the records the repository persists and services return.
//! - Build validated drafts before anything reaches storage.
//!
//! # Invariants
//! - Contacts are always addressed through their owning account.
//! - A special date with `year == 0` has an unknown year.
//! - Reminders only exist attached to a special date.

pub mod contact;
pub mod reminder;
pub mod special_date;
