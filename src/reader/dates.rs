//! Date handling for index.xml attributes.
//!
//! Timestamps look like `2015-03-21T18:04:05` and birth dates like
//! `1980-05-17`. Parsing is strict: every field must be zero-padded and the
//! separators must be exactly where they belong.

use chrono::{NaiveDate, NaiveDateTime};

use super::ReaderError;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const TIMESTAMP_SHAPE: &str = "dddd-dd-ddTdd:dd:dd";
const DATE_SHAPE: &str = "dddd-dd-dd";

/// `d` in `shape` stands for an ASCII digit, anything else must match literally.
fn has_shape(value: &str, shape: &str) -> bool {
    value.len() == shape.len()
        && value.bytes().zip(shape.bytes()).all(|(v, s)| match s {
            b'd' => v.is_ascii_digit(),
            _ => v == s,
        })
}

/// Parse a start/end date attribute. Empty means unknown.
pub fn parse_timestamp(value: &str) -> Result<Option<NaiveDateTime>, ReaderError> {
    if value.is_empty() {
        return Ok(None);
    }
    if !has_shape(value, TIMESTAMP_SHAPE) {
        return Err(ReaderError::InvalidFile(format!(
            "Malformed timestamp {:?}, expected YYYY-MM-DDTHH:MM:SS",
            value
        )));
    }
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map(Some)
        .map_err(|e| ReaderError::InvalidFile(format!("Invalid timestamp {:?}: {}", value, e)))
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a `birthDate` attribute. Empty means unknown.
pub fn parse_date(value: &str) -> Result<Option<NaiveDate>, ReaderError> {
    if value.is_empty() {
        return Ok(None);
    }
    if !has_shape(value, DATE_SHAPE) {
        return Err(ReaderError::InvalidFile(format!(
            "Malformed date {:?}, expected YYYY-MM-DD",
            value
        )));
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map(Some)
        .map_err(|e| ReaderError::InvalidFile(format!("Invalid date {:?}: {}", value, e)))
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
