//! Deceased information use-case service.
//!
//! # Responsibility
//! - Validate an update request and decode it into one date variant.
//! - Replace the contact's deceased date and optionally schedule a yearly
//!   anniversary reminder.
//!
//! # Invariants
//! - Nothing is mutated unless validation, variant decoding, contact lookup
//!   and draft construction all succeed.
//! - The previous deceased date is replaced atomically by the repository.
//! - Age-based dates never get a reminder.

use crate::model::contact::{AccountId, ContactId};
use crate::model::reminder::ReminderDraft;
use crate::model::special_date::{
    SpecialDate, SpecialDateCategory, SpecialDateDraft, SpecialDateError, YEAR_UNKNOWN,
};
use crate::repo::contact_repo::{ContactRepository, RepoError};
use crate::service::validation::{PayloadValidator, Rule, ValidationError};
use crate::support::clock::{Clock, SystemClock};
use crate::support::translate::{EnglishTranslator, Translator, DECEASED_REMINDER_TITLE};
use chrono::{Datelike, NaiveDate};
use log::{info, warn};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Why a structurally valid request cannot be turned into a deceased date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidRequestReason {
    /// `is_age_based`/`is_year_unknown` do not select a variant.
    UnmappedFlags {
        is_age_based: Option<bool>,
        is_year_unknown: Option<bool>,
    },
    /// Exact or partial variant without `deceased_date`.
    MissingDeceasedDate,
    /// Age-based variant without `age`.
    MissingAge,
}

impl Display for InvalidRequestReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnmappedFlags {
                is_age_based,
                is_year_unknown,
            } => write!(
                f,
                "flags do not select a deceased date variant: is_age_based={is_age_based:?} is_year_unknown={is_year_unknown:?}"
            ),
            Self::MissingDeceasedDate => write!(f, "deceased_date is required for this variant"),
            Self::MissingAge => write!(f, "age is required when is_age_based is set"),
        }
    }
}

/// Service error for deceased information updates.
#[derive(Debug)]
pub enum DeceasedInfoError {
    /// Field constraints failed.
    Validation(ValidationError),
    /// Fields are valid but do not describe a deceased date.
    InvalidRequest(InvalidRequestReason),
    /// Supplied values do not form a storable date.
    InvalidDate(SpecialDateError),
    ContactNotFound {
        account_id: AccountId,
        contact_id: ContactId,
    },
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl DeceasedInfoError {
    /// Stable machine-readable code, used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::InvalidRequest(_) => "invalid_request",
            Self::InvalidDate(_) => "invalid_date",
            Self::ContactNotFound { .. } => "contact_not_found",
            Self::Repo(_) => "repo_failed",
        }
    }
}

impl Display for DeceasedInfoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidRequest(reason) => write!(f, "invalid request: {reason}"),
            Self::InvalidDate(err) => write!(f, "{err}"),
            Self::ContactNotFound {
                account_id,
                contact_id,
            } => write!(f, "contact not found: {contact_id} in account {account_id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DeceasedInfoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::InvalidDate(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for DeceasedInfoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<SpecialDateError> for DeceasedInfoError {
    fn from(value: SpecialDateError) -> Self {
        Self::InvalidDate(value)
    }
}

impl From<RepoError> for DeceasedInfoError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ContactNotFound {
                account_id,
                contact_id,
            } => Self::ContactNotFound {
                account_id,
                contact_id,
            },
            RepoError::InvalidSpecialDate(err) => Self::InvalidDate(err),
            other => Self::Repo(other),
        }
    }
}

/// Typed, validated update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateDeceasedRequest {
    pub account_id: AccountId,
    pub contact_id: ContactId,
    pub deceased_date: Option<NaiveDate>,
    pub is_age_based: Option<bool>,
    pub is_year_unknown: Option<bool>,
    pub age: Option<i64>,
    pub add_reminder: Option<bool>,
}

impl UpdateDeceasedRequest {
    /// Validates a JSON payload. `account_exists` backs the `exists` rule
    /// and is only consulted for a well-formed `account_id`.
    pub fn from_payload<F>(
        payload: &Map<String, Value>,
        account_exists: F,
    ) -> Result<Self, DeceasedInfoError>
    where
        F: FnOnce(AccountId) -> Result<bool, RepoError>,
    {
        let mut validator = PayloadValidator::new(payload);
        let account_id = validator.required_integer("account_id");
        let contact_id = validator.required_integer("contact_id");
        let deceased_date = validator.date("deceased_date");
        let is_age_based = validator.boolean("is_age_based");
        let is_year_unknown = validator.boolean("is_year_unknown");
        let age = validator.integer("age");
        let add_reminder = validator.boolean("add_reminder");

        if let Some(account_id) = account_id {
            if !account_exists(account_id)? {
                validator.reject("account_id", Rule::Exists);
            }
        }
        validator.finish()?;

        match (account_id, contact_id) {
            (Some(account_id), Some(contact_id)) => Ok(Self {
                account_id,
                contact_id,
                deceased_date,
                is_age_based,
                is_year_unknown,
                age,
                add_reminder,
            }),
            // finish() already reported both as required.
            _ => Err(ValidationError {
                violations: Vec::new(),
            }
            .into()),
        }
    }

    pub fn wants_reminder(&self) -> bool {
        self.add_reminder == Some(true)
    }
}

/// The three ways a death can be recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeceasedDateVariant {
    /// Full date known.
    Exact(NaiveDate),
    /// Month and day known, year unknown.
    Partial { month: u32, day: u32 },
    /// Only the age at death is known.
    AgeBased { age: i64 },
}

impl DeceasedDateVariant {
    /// Selects the variant from the request flags.
    pub fn decode(request: &UpdateDeceasedRequest) -> Result<Self, InvalidRequestReason> {
        match (request.is_age_based, request.is_year_unknown) {
            (Some(true), _) => request
                .age
                .map(|age| Self::AgeBased { age })
                .ok_or(InvalidRequestReason::MissingAge),
            (Some(false), Some(true)) => request
                .deceased_date
                .map(|date| Self::Partial {
                    month: date.month(),
                    day: date.day(),
                })
                .ok_or(InvalidRequestReason::MissingDeceasedDate),
            (Some(false), Some(false)) => request
                .deceased_date
                .map(Self::Exact)
                .ok_or(InvalidRequestReason::MissingDeceasedDate),
            (None, _) | (Some(false), None) => Err(InvalidRequestReason::UnmappedFlags {
                is_age_based: request.is_age_based,
                is_year_unknown: request.is_year_unknown,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Exact(_) => "exact",
            Self::Partial { .. } => "partial",
            Self::AgeBased { .. } => "age_based",
        }
    }

    /// Only variants with a concrete month/day can carry a reminder.
    pub fn supports_reminder(&self) -> bool {
        !matches!(self, Self::AgeBased { .. })
    }

    /// Builds the special date content relative to `today`.
    pub fn draft(&self, today: NaiveDate) -> Result<SpecialDateDraft, SpecialDateError> {
        match *self {
            Self::Exact(date) => SpecialDateDraft::from_date(date.year(), date.month(), date.day()),
            Self::Partial { month, day } => SpecialDateDraft::from_date(YEAR_UNKNOWN, month, day),
            Self::AgeBased { age } => SpecialDateDraft::from_age(age, today),
        }
    }
}

/// Use-case service recording how a contact died.
pub struct DeceasedInfoUpdater<R, T = EnglishTranslator, C = SystemClock>
where
    R: ContactRepository,
    T: Translator,
    C: Clock,
{
    repo: R,
    translator: T,
    clock: C,
}

impl<R: ContactRepository> DeceasedInfoUpdater<R> {
    /// Creates a service with the English catalog and the system clock.
    pub fn new(repo: R) -> Self {
        Self::with_collaborators(repo, EnglishTranslator, SystemClock)
    }
}

impl<R, T, C> DeceasedInfoUpdater<R, T, C>
where
    R: ContactRepository,
    T: Translator,
    C: Clock,
{
    pub fn with_collaborators(repo: R, translator: T, clock: C) -> Self {
        Self {
            repo,
            translator,
            clock,
        }
    }

    /// Borrows the underlying repository, e.g. for read-back.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Validates `payload` and replaces the contact's deceased date.
    ///
    /// # Contract
    /// - Fails with `Validation` on any field violation, `InvalidRequest`
    ///   when the flags do not select a variant, `ContactNotFound` when the
    ///   contact is not in the account.
    /// - No mutation happens on any of those failures.
    /// - Returns the created special date, including its reminder when one
    ///   was requested and the variant supports it.
    pub fn execute(
        &mut self,
        payload: &Map<String, Value>,
    ) -> Result<SpecialDate, DeceasedInfoError> {
        let started_at = Instant::now();
        let result = self.execute_inner(payload);
        match &result {
            Ok(special_date) => info!(
                "event=deceased_update module=service status=ok special_date_id={} year_unknown={} age_based={} reminder={} duration_ms={}",
                special_date.id,
                special_date.is_year_unknown,
                special_date.is_age_based,
                special_date.has_reminder(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=deceased_update module=service status=error error_code={} duration_ms={}",
                err.code(),
                started_at.elapsed().as_millis()
            ),
        }
        result
    }

    fn execute_inner(
        &mut self,
        payload: &Map<String, Value>,
    ) -> Result<SpecialDate, DeceasedInfoError> {
        let request =
            UpdateDeceasedRequest::from_payload(payload, |id| self.repo.account_exists(id))?;
        let variant =
            DeceasedDateVariant::decode(&request).map_err(DeceasedInfoError::InvalidRequest)?;

        let contact = self
            .repo
            .find_contact(request.account_id, request.contact_id)?
            .ok_or(DeceasedInfoError::ContactNotFound {
                account_id: request.account_id,
                contact_id: request.contact_id,
            })?;

        let today = self.clock.today();
        let draft = variant.draft(today)?;
        let reminder = if request.wants_reminder() && variant.supports_reminder() {
            let title = self
                .translator
                .translate(DECEASED_REMINDER_TITLE, &[("name", contact.first_name.as_str())]);
            Some(ReminderDraft::yearly(title, &draft, today)?)
        } else {
            None
        };

        let special_date = self.repo.replace_special_date(
            &contact,
            SpecialDateCategory::DeceasedDate,
            &draft,
            reminder.as_ref(),
        )?;
        Ok(special_date)
    }
}

#[cfg(test)]
mod tests {
    use super::{DeceasedDateVariant, InvalidRequestReason, UpdateDeceasedRequest};
    use chrono::NaiveDate;

    fn request() -> UpdateDeceasedRequest {
        UpdateDeceasedRequest {
            account_id: 1,
            contact_id: 5,
            deceased_date: NaiveDate::from_ymd_opt(2020, 3, 14),
            is_age_based: None,
            is_year_unknown: None,
            age: None,
            add_reminder: None,
        }
    }

    #[test]
    fn decode_selects_each_variant() {
        let mut req = request();
        req.is_age_based = Some(false);
        req.is_year_unknown = Some(false);
        assert_eq!(
            DeceasedDateVariant::decode(&req),
            Ok(DeceasedDateVariant::Exact(
                NaiveDate::from_ymd_opt(2020, 3, 14).unwrap()
            ))
        );

        req.is_year_unknown = Some(true);
        assert_eq!(
            DeceasedDateVariant::decode(&req),
            Ok(DeceasedDateVariant::Partial { month: 3, day: 14 })
        );

        req.is_age_based = Some(true);
        req.age = Some(40);
        assert_eq!(
            DeceasedDateVariant::decode(&req),
            Ok(DeceasedDateVariant::AgeBased { age: 40 })
        );
    }

    #[test]
    fn decode_rejects_unmapped_flags() {
        let mut req = request();
        assert!(matches!(
            DeceasedDateVariant::decode(&req),
            Err(InvalidRequestReason::UnmappedFlags { .. })
        ));

        req.is_age_based = Some(false);
        assert_eq!(
            DeceasedDateVariant::decode(&req),
            Err(InvalidRequestReason::UnmappedFlags {
                is_age_based: Some(false),
                is_year_unknown: None,
            })
        );
    }

    #[test]
    fn decode_requires_variant_inputs() {
        let mut req = request();
        req.is_age_based = Some(true);
        assert_eq!(
            DeceasedDateVariant::decode(&req),
            Err(InvalidRequestReason::MissingAge)
        );

        req.is_age_based = Some(false);
        req.is_year_unknown = Some(false);
        req.deceased_date = None;
        assert_eq!(
            DeceasedDateVariant::decode(&req),
            Err(InvalidRequestReason::MissingDeceasedDate)
        );
    }

    #[test]
    fn only_age_based_variant_refuses_reminders() {
        assert!(DeceasedDateVariant::Partial { month: 1, day: 2 }.supports_reminder());
        assert!(!DeceasedDateVariant::AgeBased { age: 3 }.supports_reminder());
    }
}
