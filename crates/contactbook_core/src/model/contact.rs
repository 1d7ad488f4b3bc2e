//! Contact domain model.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another contact.
//! - `first_name` is never blank; it is rendered into reminder titles.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Integer identifier of an account (tenant).
pub type AccountId = i64;

/// Integer identifier of a contact, unique across accounts.
pub type ContactId = i64;

/// Persisted contact record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub account_id: AccountId,
    /// Stable external identity, independent of the integer row id.
    pub uuid: Uuid,
    pub first_name: String,
    pub last_name: Option<String>,
}

/// Input for contact creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
    pub first_name: String,
    pub last_name: Option<String>,
}

impl NewContact {
    pub fn new(first_name: impl Into<String>, last_name: Option<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name,
        }
    }

    /// Trims names and rejects a blank first name.
    pub fn normalized(&self) -> Result<Self, ContactValidationError> {
        let first_name = self.first_name.trim();
        if first_name.is_empty() {
            return Err(ContactValidationError::BlankFirstName);
        }
        let last_name = self
            .last_name
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        Ok(Self {
            first_name: first_name.to_string(),
            last_name,
        })
    }
}

/// Contact input rejected before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactValidationError {
    BlankFirstName,
}

impl Display for ContactValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankFirstName => write!(f, "contact first_name must not be blank"),
        }
    }
}

impl Error for ContactValidationError {}

#[cfg(test)]
mod tests {
    use super::{ContactValidationError, NewContact};

    #[test]
    fn normalized_trims_and_drops_blank_last_name() {
        let input = NewContact::new("  Ada ", Some("   ".to_string()));
        let normalized = input.normalized().unwrap();
        assert_eq!(normalized.first_name, "Ada");
        assert_eq!(normalized.last_name, None);
    }

    #[test]
    fn normalized_rejects_blank_first_name() {
        let err = NewContact::new(" \t", None).normalized().unwrap_err();
        assert_eq!(err, ContactValidationError::BlankFirstName);
    }
}
