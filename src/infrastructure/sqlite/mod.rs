pub mod match_repo;
pub mod migrations;
pub mod trade_repo;
pub mod vector_store;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use std::str::FromStr;

/// Parse an RFC 3339 column, surfacing corruption as a conversion error.
pub(crate) fn column_time(idx: usize, raw: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn column_enum<T: FromStr<Err = String>>(idx: usize, raw: &str) -> Result<T, rusqlite::Error> {
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}
