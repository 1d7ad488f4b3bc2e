//! Core domain logic for contactbook.
//! This crate is the single source of truth for contact invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod support;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::contact::{AccountId, Contact, ContactId, ContactValidationError, NewContact};
pub use model::reminder::{FrequencyType, Reminder, ReminderDraft, ReminderId};
pub use model::special_date::{
    SpecialDate, SpecialDateCategory, SpecialDateDraft, SpecialDateError, SpecialDateId,
    YEAR_UNKNOWN,
};
pub use repo::contact_repo::{ContactRepository, RepoError, RepoResult, SqliteContactRepository};
pub use service::deceased_service::{
    DeceasedDateVariant, DeceasedInfoError, DeceasedInfoUpdater, InvalidRequestReason,
    UpdateDeceasedRequest,
};
pub use service::validation::{FieldViolation, Rule, ValidationError};
pub use support::clock::{Clock, FixedClock, SystemClock};
pub use support::translate::{EnglishTranslator, Translator};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
