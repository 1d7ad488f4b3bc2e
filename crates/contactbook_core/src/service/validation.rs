//! Field-level validation of JSON request payloads.
//!
//! # Invariants
//! - Every field is checked; violations are collected, not short-circuited.
//! - `null` counts as absent: optional fields accept it, required fields
//!   report `required`.
//! - Unknown keys are ignored.

use crate::support::date::parse_date;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

static INTEGER_TEXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+$").expect("valid integer regex"));

/// Constraint a field failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    Integer,
    Boolean,
    DateFormat,
    /// Referenced record does not exist.
    Exists,
}

impl Rule {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::DateFormat => "date_format",
            Self::Exists => "exists",
        }
    }
}

/// One failed field constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub rule: Rule,
}

/// Request rejected by field validation. Nothing was mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    /// Returns whether `field` failed `rule`.
    pub fn has(&self, field: &str, rule: Rule) -> bool {
        self.violations
            .iter()
            .any(|violation| violation.field == field && violation.rule == rule)
    }

    /// Returns whether `field` failed any rule.
    pub fn mentions(&self, field: &str) -> bool {
        self.violations
            .iter()
            .any(|violation| violation.field == field)
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed:")?;
        for (index, violation) in self.violations.iter().enumerate() {
            let separator = if index == 0 { " " } else { ", " };
            write!(
                f,
                "{separator}{} ({})",
                violation.field,
                violation.rule.as_str()
            )?;
        }
        Ok(())
    }
}

impl Error for ValidationError {}

/// Accumulates violations while extracting typed fields from a payload.
pub struct PayloadValidator<'a> {
    payload: &'a Map<String, Value>,
    violations: Vec<FieldViolation>,
}

impl<'a> PayloadValidator<'a> {
    pub fn new(payload: &'a Map<String, Value>) -> Self {
        Self {
            payload,
            violations: Vec::new(),
        }
    }

    /// Required integer field.
    pub fn required_integer(&mut self, field: &'static str) -> Option<i64> {
        if self.present(field).is_none() {
            self.reject(field, Rule::Required);
            return None;
        }
        self.integer(field)
    }

    /// Nullable integer field. Accepts JSON integers and decimal strings.
    pub fn integer(&mut self, field: &'static str) -> Option<i64> {
        let value = self.present(field)?;
        let parsed = match value {
            Value::Number(number) => number.as_i64(),
            Value::String(text) if INTEGER_TEXT_RE.is_match(text) => text.parse().ok(),
            _ => None,
        };
        if parsed.is_none() {
            self.reject(field, Rule::Integer);
        }
        parsed
    }

    /// Nullable boolean field. Accepts `true`, `false`, `0`, `1` and their
    /// string forms.
    pub fn boolean(&mut self, field: &'static str) -> Option<bool> {
        let value = self.present(field)?;
        let parsed = match value {
            Value::Bool(flag) => Some(*flag),
            Value::Number(number) => match number.as_i64() {
                Some(0) => Some(false),
                Some(1) => Some(true),
                _ => None,
            },
            Value::String(text) => match text.as_str() {
                "0" | "false" => Some(false),
                "1" | "true" => Some(true),
                _ => None,
            },
            _ => None,
        };
        if parsed.is_none() {
            self.reject(field, Rule::Boolean);
        }
        parsed
    }

    /// Nullable `YYYY-MM-DD` date field.
    pub fn date(&mut self, field: &'static str) -> Option<NaiveDate> {
        let value = self.present(field)?;
        let parsed = value.as_str().and_then(parse_date);
        if parsed.is_none() {
            self.reject(field, Rule::DateFormat);
        }
        parsed
    }

    /// Records a violation found outside the shape checks.
    pub fn reject(&mut self, field: &'static str, rule: Rule) {
        self.violations.push(FieldViolation { field, rule });
    }

    /// Consumes the validator, returning the collected violations as an error.
    pub fn finish(self) -> Result<(), ValidationError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                violations: self.violations,
            })
        }
    }

    fn present(&self, field: &str) -> Option<&'a Value> {
        self.payload.get(field).filter(|value| !value.is_null())
    }
}
