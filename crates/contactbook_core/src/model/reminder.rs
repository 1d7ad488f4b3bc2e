//! Reminder domain model.
//!
//! # Invariants
//! - `frequency_number` is at least 1.
//! - `next_expected_date` is strictly after the day the reminder was built
//!   and never before `initial_date`.

use crate::model::contact::{AccountId, ContactId};
use crate::model::special_date::{day_in_year, SpecialDateDraft, SpecialDateError, SpecialDateId};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Integer identifier of a reminder.
pub type ReminderId = i64;

/// Repeat unit of a reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyType {
    Week,
    Month,
    Year,
}

impl FrequencyType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "year" => Some(Self::Year),
            _ => None,
        }
    }
}

/// Reminder content, not yet attached to a special date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderDraft {
    pub frequency_type: FrequencyType,
    pub frequency_number: u32,
    pub title: String,
    pub initial_date: NaiveDate,
    pub next_expected_date: NaiveDate,
}

impl ReminderDraft {
    /// Builds a reminder repeating every year on the draft's month/day.
    ///
    /// Unknown years resolve to the year of `today`.
    pub fn yearly(
        title: impl Into<String>,
        date: &SpecialDateDraft,
        today: NaiveDate,
    ) -> Result<Self, SpecialDateError> {
        let invalid = SpecialDateError::InvalidDate {
            year: date.year,
            month: date.month,
            day: date.day,
        };
        let initial_date = date.resolve(today.year()).ok_or(invalid.clone())?;
        let next_expected_date =
            next_yearly_occurrence(initial_date, date.month, date.day, today).ok_or(invalid)?;

        Ok(Self {
            frequency_type: FrequencyType::Year,
            frequency_number: 1,
            title: title.into(),
            initial_date,
            next_expected_date,
        })
    }
}

/// Persisted reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: ReminderId,
    pub account_id: AccountId,
    pub contact_id: ContactId,
    pub special_date_id: SpecialDateId,
    pub frequency_type: FrequencyType,
    pub frequency_number: u32,
    pub title: String,
    pub initial_date: NaiveDate,
    pub next_expected_date: NaiveDate,
}

// `month`/`day` come from the draft so a clamped Feb 28 does not stick.
fn next_yearly_occurrence(
    initial_date: NaiveDate,
    month: u32,
    day: u32,
    today: NaiveDate,
) -> Option<NaiveDate> {
    if initial_date > today {
        return Some(initial_date);
    }
    let this_year = day_in_year(today.year(), month, day)?;
    if this_year > today {
        return Some(this_year);
    }
    day_in_year(today.year() + 1, month, day)
}

#[cfg(test)]
mod tests {
    use super::{FrequencyType, ReminderDraft};
    use crate::model::special_date::{SpecialDateDraft, YEAR_UNKNOWN};
    use chrono::NaiveDate;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn yearly_reminder_keeps_exact_initial_date() {
        let date = SpecialDateDraft::from_date(2020, 3, 14).unwrap();
        let draft = ReminderDraft::yearly("title", &date, ymd(2024, 1, 10)).unwrap();
        assert_eq!(draft.frequency_type, FrequencyType::Year);
        assert_eq!(draft.frequency_number, 1);
        assert_eq!(draft.initial_date, ymd(2020, 3, 14));
        assert_eq!(draft.next_expected_date, ymd(2024, 3, 14));
    }

    #[test]
    fn next_occurrence_rolls_over_when_today_is_the_anniversary() {
        let date = SpecialDateDraft::from_date(2020, 3, 14).unwrap();
        let draft = ReminderDraft::yearly("title", &date, ymd(2024, 3, 14)).unwrap();
        assert_eq!(draft.next_expected_date, ymd(2025, 3, 14));
    }

    #[test]
    fn unknown_year_uses_current_year_for_initial_date() {
        let date = SpecialDateDraft::from_date(YEAR_UNKNOWN, 2, 29).unwrap();
        let draft = ReminderDraft::yearly("title", &date, ymd(2023, 6, 1)).unwrap();
        assert_eq!(draft.initial_date, ymd(2023, 2, 28));
        assert_eq!(draft.next_expected_date, ymd(2024, 2, 29));
    }

    #[test]
    fn future_date_is_its_own_next_occurrence() {
        let date = SpecialDateDraft::from_date(2030, 1, 1).unwrap();
        let draft = ReminderDraft::yearly("title", &date, ymd(2024, 1, 10)).unwrap();
        assert_eq!(draft.initial_date, ymd(2030, 1, 1));
        assert_eq!(draft.next_expected_date, ymd(2030, 1, 1));
    }

    #[test]
    fn frequency_names_round_trip() {
        for kind in [FrequencyType::Week, FrequencyType::Month, FrequencyType::Year] {
            assert_eq!(FrequencyType::parse(kind.as_str()), Some(kind));
        }
    }
}
