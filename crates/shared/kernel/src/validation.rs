//! Field-level request validation.
//!
//! A [`Validator`] collects every problem of a payload so the client gets the complete list in
//! one response instead of fixing fields one by one.

use crate::clock;
use chrono::{NaiveDate, NaiveTime};
use std::fmt;
use whub_derive::api_model;

#[api_model]
#[derive(Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Non-empty list of field problems.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// A single-field failure.
    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self(vec![FieldError { field: field.into(), message: message.into() }])
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    #[must_use]
    pub fn into_fields(self) -> Vec<FieldError> {
        self.0
    }

    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{} {}", error.field, error.message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure for `field` unless `ok` holds.
    pub fn check(&mut self, field: &str, ok: bool, message: &str) -> &mut Self {
        if !ok {
            self.errors.push(FieldError { field: field.to_owned(), message: message.to_owned() });
        }
        self
    }

    pub fn required(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(field, !value.trim().is_empty(), "is required")
    }

    /// At least one non-blank entry.
    pub fn required_list(&mut self, field: &str, values: &[String]) -> &mut Self {
        self.check(field, values.iter().any(|v| !v.trim().is_empty()), "needs at least one entry")
    }

    /// Required and well-formed.
    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            return self.required(field, value);
        }
        self.check(field, is_email(value), "must be a valid email address")
    }

    pub fn optional_email(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        match value.filter(|v| !v.trim().is_empty()) {
            Some(v) => self.check(field, is_email(v), "must be a valid email address"),
            None => self,
        }
    }

    /// Required and well-formed.
    pub fn phone(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            return self.required(field, value);
        }
        self.check(field, is_phone(value), "must be a valid phone number")
    }

    pub fn optional_phone(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        match value.filter(|v| !v.trim().is_empty()) {
            Some(v) => self.check(field, is_phone(v), "must be a valid phone number"),
            None => self,
        }
    }

    /// Required absolute `http`/`https` URL.
    pub fn url(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            return self.required(field, value);
        }
        self.check(field, is_web_url(value), "must be an http(s) URL")
    }

    pub fn optional_url(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        match value.filter(|v| !v.trim().is_empty()) {
            Some(v) => self.check(field, is_web_url(v), "must be an http(s) URL"),
            None => self,
        }
    }

    /// `@handle`, `handle` or an instagram.com URL.
    pub fn optional_instagram(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        match value.filter(|v| !v.trim().is_empty()) {
            Some(v) => self.check(
                field,
                crate::links::instagram_handle(v).is_some(),
                "must be an Instagram handle or profile URL",
            ),
            None => self,
        }
    }

    /// Three-letter ISO 4217 code when present.
    pub fn optional_currency(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => self.check(
                field,
                v.len() == 3 && v.chars().all(|c| c.is_ascii_alphabetic()),
                "must be a three-letter code",
            ),
            None => self,
        }
    }

    pub fn non_negative(&mut self, field: &str, value: f64) -> &mut Self {
        self.check(field, value.is_finite() && value >= 0.0, "must not be negative")
    }

    pub fn positive(&mut self, field: &str, value: f64) -> &mut Self {
        self.check(field, value.is_finite() && value > 0.0, "must be greater than zero")
    }

    pub fn range(&mut self, field: &str, value: i64, min: i64, max: i64) -> &mut Self {
        self.check(field, (min..=max).contains(&value), &format!("must be between {min} and {max}"))
    }

    pub fn max_len(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        self.check(
            field,
            value.trim().chars().count() <= max,
            &format!("must be at most {max} characters"),
        )
    }

    /// Parses a required `YYYY-MM-DD` date.
    pub fn date(&mut self, field: &str, value: &str) -> Option<NaiveDate> {
        let parsed = clock::parse_date(value);
        self.check(field, parsed.is_some(), "must be a date (YYYY-MM-DD)");
        parsed
    }

    /// Parses an optional `YYYY-MM-DD` date; blank counts as absent.
    pub fn optional_date(&mut self, field: &str, value: Option<&str>) -> Option<NaiveDate> {
        value.filter(|v| !v.trim().is_empty()).and_then(|v| self.date(field, v))
    }

    /// Parses a required `HH:MM` time.
    pub fn time(&mut self, field: &str, value: &str) -> Option<NaiveTime> {
        let parsed = clock::parse_time(value);
        self.check(field, parsed.is_some(), "must be a time (HH:MM)");
        parsed
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() { Ok(()) } else { Err(ValidationErrors(self.errors)) }
    }
}

/// `local@domain.tld` without whitespace.
#[must_use]
pub fn is_email(value: &str) -> bool {
    let value = value.trim();
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || value.chars().any(char::is_whitespace) {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| !label.is_empty() && !label.starts_with('-'))
        && labels.last().is_some_and(|tld| tld.len() >= 2 && tld.chars().all(char::is_alphabetic))
}

/// Digits with an optional leading `+` and common separators; 7 to 15 digits.
#[must_use]
pub fn is_phone(value: &str) -> bool {
    let value = value.trim();
    let body = value.strip_prefix('+').unwrap_or(value);
    let allowed =
        body.chars().all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '.' | '(' | ')'));
    let digits = body.chars().filter(char::is_ascii_digit).count();
    allowed && (7..=15).contains(&digits)
}

#[must_use]
pub fn is_web_url(value: &str) -> bool {
    url::Url::parse(value.trim())
        .is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
}

/// Trimmed value, `None` when blank.
#[must_use]
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

/// Trimmed entries with blanks dropped.
#[must_use]
pub fn non_blank_list(values: Vec<String>) -> Vec<String> {
    values.into_iter().map(|v| v.trim().to_owned()).filter(|v| !v.is_empty()).collect()
}

/// Upper-cased currency code, or the fallback when blank.
#[must_use]
pub fn currency_or(currency: Option<String>, fallback: &str) -> String {
    non_blank(currency).map_or_else(|| fallback.to_owned(), |c| c.to_uppercase())
}
