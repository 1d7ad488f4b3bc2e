//! Strict `YYYY-MM-DD` date parsing.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Storage and wire format for calendar days.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// chrono alone accepts single-digit months and days; the wire format does not.
static DATE_SHAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date shape regex"));

/// Parses a zero-padded `YYYY-MM-DD` string into a calendar day.
///
/// Returns `None` for any other shape and for impossible days such as
/// `2021-02-29`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    if !DATE_SHAPE_RE.is_match(value) {
        return None;
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

/// Formats a calendar day in the wire format.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
