//! Localized string rendering.
//!
//! # Invariants
//! - Unknown keys render as the key itself, so a missing catalog entry is
//!   visible but never fatal.
//! - Placeholders use `:name` syntax; placeholders without a matching
//!   parameter are left untouched.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

/// Catalog key for the title of a death-anniversary reminder.
pub const DECEASED_REMINDER_TITLE: &str = "people.deceased_reminder_title";

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":([A-Za-z_]+)").expect("valid placeholder regex"));

static EN_CATALOG: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (DECEASED_REMINDER_TITLE, "Anniversary of the death of :name"),
    ])
});

/// Renders a catalog entry with named parameters.
pub trait Translator {
    fn translate(&self, key: &str, params: &[(&str, &str)]) -> String;
}

/// Built-in English catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishTranslator;

impl Translator for EnglishTranslator {
    fn translate(&self, key: &str, params: &[(&str, &str)]) -> String {
        match EN_CATALOG.get(key) {
            Some(template) => render_template(template, params),
            None => key.to_string(),
        }
    }
}

impl<T: Translator + ?Sized> Translator for Box<T> {
    fn translate(&self, key: &str, params: &[(&str, &str)]) -> String {
        (**self).translate(key, params)
    }
}

/// Substitutes `:placeholder` tokens with parameter values.
pub fn render_template(template: &str, params: &[(&str, &str)]) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures<'_>| {
            let name = &caps[1];
            params
                .iter()
                .find(|(key, _)| *key == name)
                .map_or_else(|| caps[0].to_string(), |(_, value)| (*value).to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::{render_template, EnglishTranslator, Translator, DECEASED_REMINDER_TITLE};

    #[test]
    fn deceased_title_renders_first_name() {
        let title = EnglishTranslator.translate(DECEASED_REMINDER_TITLE, &[("name", "Ada")]);
        assert_eq!(title, "Anniversary of the death of Ada");
    }

    #[test]
    fn unknown_key_renders_as_key() {
        assert_eq!(EnglishTranslator.translate("people.nope", &[]), "people.nope");
    }

    #[test]
    fn unmatched_placeholder_is_left_untouched() {
        assert_eq!(
            render_template(":greeting, :name", &[("name", "Ada")]),
            ":greeting, Ada"
        );
    }

    #[test]
    fn parameter_values_are_not_reexpanded() {
        assert_eq!(render_template("hi :name", &[("name", ":name")]), "hi :name");
    }
}
