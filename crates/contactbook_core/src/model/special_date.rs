//! Special date domain model.
//!
//! # Responsibility
//! - Represent calendar annotations attached to a contact.
//! - Build validated drafts for explicit dates and age-derived dates.
//!
//! # Invariants
//! - `year == YEAR_UNKNOWN` if and only if `is_year_unknown` is set.
//! - `month`/`day` always form a valid calendar day (checked against a leap
//!   year when the year is unknown).
//! - Age-based drafts are pinned to January 1st of the derived year.

use crate::model::contact::{AccountId, ContactId};
use crate::model::reminder::Reminder;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Integer identifier of a special date.
pub type SpecialDateId = i64;

/// Sentinel year meaning "year unknown".
pub const YEAR_UNKNOWN: i32 = 0;

// Any leap year works; it only has to accept February 29.
const LEAP_REFERENCE_YEAR: i32 = 2000;

/// What a special date annotates on its contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialDateCategory {
    Birthdate,
    DeceasedDate,
}

impl SpecialDateCategory {
    /// Storage and wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Birthdate => "birthdate",
            Self::DeceasedDate => "deceased_date",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "birthdate" => Some(Self::Birthdate),
            "deceased_date" => Some(Self::DeceasedDate),
            _ => None,
        }
    }
}

impl Display for SpecialDateCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Special date construction failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialDateError {
    /// The triple does not name a calendar day.
    InvalidDate { year: i32, month: u32, day: u32 },
    /// Age is negative or reaches past year 1.
    AgeOutOfRange(i64),
}

impl Display for SpecialDateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDate { year, month, day } => {
                write!(f, "invalid special date: year={year} month={month} day={day}")
            }
            Self::AgeOutOfRange(age) => write!(f, "age out of range: {age}"),
        }
    }
}

impl Error for SpecialDateError {}

/// Validated special date content, not yet attached to a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialDateDraft {
    pub is_age_based: bool,
    pub is_year_unknown: bool,
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl SpecialDateDraft {
    /// Builds a draft from an explicit triple. Pass `YEAR_UNKNOWN` as `year`
    /// when only the month and day are known.
    pub fn from_date(year: i32, month: u32, day: u32) -> Result<Self, SpecialDateError> {
        if year < YEAR_UNKNOWN {
            return Err(SpecialDateError::InvalidDate { year, month, day });
        }
        let is_year_unknown = year == YEAR_UNKNOWN;
        let check_year = if is_year_unknown {
            LEAP_REFERENCE_YEAR
        } else {
            year
        };
        if NaiveDate::from_ymd_opt(check_year, month, day).is_none() {
            return Err(SpecialDateError::InvalidDate { year, month, day });
        }

        Ok(Self {
            is_age_based: false,
            is_year_unknown,
            year,
            month,
            day,
        })
    }

    /// Derives an approximate date from an age relative to `today`:
    /// January 1st, `age` years before the current year.
    pub fn from_age(age: i64, today: NaiveDate) -> Result<Self, SpecialDateError> {
        if age < 0 {
            return Err(SpecialDateError::AgeOutOfRange(age));
        }
        let year = i64::from(today.year())
            .checked_sub(age)
            .filter(|year| *year >= 1)
            .and_then(|year| i32::try_from(year).ok())
            .ok_or(SpecialDateError::AgeOutOfRange(age))?;

        Ok(Self {
            is_age_based: true,
            is_year_unknown: false,
            year,
            month: 1,
            day: 1,
        })
    }

    /// Re-checks invariants on a draft that may have been assembled by hand.
    pub fn validate(&self) -> Result<(), SpecialDateError> {
        let invalid = SpecialDateError::InvalidDate {
            year: self.year,
            month: self.month,
            day: self.day,
        };
        if self.is_year_unknown != (self.year == YEAR_UNKNOWN) {
            return Err(invalid);
        }
        if self.is_age_based && (self.is_year_unknown || (self.month, self.day) != (1, 1)) {
            return Err(invalid);
        }
        Self::from_date(self.year, self.month, self.day).map(|_| ())
    }

    /// Resolves the draft to a concrete day, substituting `fallback_year`
    /// when the year is unknown.
    pub fn resolve(&self, fallback_year: i32) -> Option<NaiveDate> {
        let year = if self.is_year_unknown {
            fallback_year
        } else {
            self.year
        };
        day_in_year(year, self.month, self.day)
    }
}

/// Persisted special date, with its reminder when one is attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialDate {
    pub id: SpecialDateId,
    pub account_id: AccountId,
    pub contact_id: ContactId,
    pub category: SpecialDateCategory,
    pub is_age_based: bool,
    pub is_year_unknown: bool,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub reminder: Option<Reminder>,
}

impl SpecialDate {
    /// Returns the full date, or `None` when the year is unknown.
    pub fn date(&self) -> Option<NaiveDate> {
        if self.is_year_unknown {
            return None;
        }
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }

    pub fn has_reminder(&self) -> bool {
        self.reminder.is_some()
    }
}

/// Places `month`/`day` in `year`, moving February 29 to February 28 in
/// common years.
pub(crate) fn day_in_year(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).or_else(|| {
        if month == 2 && day == 29 {
            NaiveDate::from_ymd_opt(year, 2, 28)
        } else {
            None
        }
    })
}
