//! Calendar date helpers shared by model, storage and import paths.
//!
//! # Invariants
//! - The only accepted wire/storage format is strict `YYYY-MM-DD`.
//! - Parsing never accepts partial dates such as `2021-01` or `2021-1-1`.

use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

const DATE_FORMAT: &str = "%Y-%m-%d";

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid iso date regex"));

/// Rejected date input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateParseError {
    pub input: String,
}

impl Display for DateParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "`{}` is not a valid YYYY-MM-DD date", self.input)
    }
}

impl Error for DateParseError {}

/// Parses a strict `YYYY-MM-DD` date after trimming surrounding whitespace.
pub fn parse_date(value: &str) -> Result<NaiveDate, DateParseError> {
    let trimmed = value.trim();
    if !is_iso_date(trimmed) {
        return Err(DateParseError {
            input: trimmed.to_string(),
        });
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| DateParseError {
        input: trimmed.to_string(),
    })
}

/// Formats a date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Shape-only check; does not verify the calendar date exists.
pub fn is_iso_date(value: &str) -> bool {
    ISO_DATE_RE.is_match(value)
}

/// Current local calendar date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
