//! UTC clock helpers. Timestamps are stored as RFC 3339 strings, dates as `YYYY-MM-DD`.

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

#[must_use]
pub fn today() -> NaiveDate {
    now().date_naive()
}

#[must_use]
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[must_use]
pub fn now_timestamp() -> String {
    timestamp(now())
}

#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw).ok().map(|at| at.with_timezone(&Utc))
}

/// Calendar day of a stored timestamp.
#[must_use]
pub fn date_of(raw: &str) -> Option<NaiveDate> {
    parse_timestamp(raw).map(|at| at.date_naive())
}

#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[must_use]
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), TIME_FORMAT).ok()
}

#[must_use]
pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}
