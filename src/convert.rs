//! Conversions between field values and their stored representation.
//!
//! Dates are stored as milliseconds since the Unix epoch (UTC), booleans as
//! `1`/`0`, chars as one-character text. Narrow integers are read back with a
//! checked conversion so an out-of-range value is reported rather than wrapped.
use chrono::{DateTime, Utc};

use crate::error::{Result, RowforgeError};

pub fn date_to_millis(date: &DateTime<Utc>) -> i64 {
    date.timestamp_millis()
}

pub fn millis_to_date(column: &str, millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| RowforgeError::decode(column, format!("{} ms is out of range for a date", millis)))
}

pub fn bool_to_integer(value: bool) -> i64 {
    if value { 1 } else { 0 }
}

/// Only `1` reads back as `true`.
pub fn integer_to_bool(value: i64) -> bool {
    value == 1
}

pub fn narrow<T: TryFrom<i64>>(column: &str, value: i64) -> Result<T> {
    T::try_from(value).map_err(|_| {
        RowforgeError::decode(
            column,
            format!("{} does not fit in {}", value, std::any::type_name::<T>()),
        )
    })
}

pub fn text_to_char(column: &str, text: &str) -> Result<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(RowforgeError::decode(
            column,
            format!("expected a single character, found {:?}", text),
        )),
    }
}
