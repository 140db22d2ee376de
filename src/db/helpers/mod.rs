use std::collections::BTreeSet;
use std::convert::TryFrom;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{de::DeserializeOwned, Serialize};

pub fn to_u32(value: i64, field: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| anyhow!("{field} contains out-of-range value {value}"))
}

pub fn to_u8(value: i64, field: &str) -> Result<u8> {
    u8::try_from(value).map_err(|_| anyhow!("{field} contains out-of-range value {value}"))
}

/// Fixed-width UTC timestamp (nanosecond precision, `Z` suffix) so stored
/// values compare lexically in the same order as chronologically.
pub fn format_datetime(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn tags_to_json<T: Serialize + Ord>(tags: &BTreeSet<T>) -> Result<String> {
    serde_json::to_string(tags).context("failed to encode tag set")
}

pub fn tags_from_json<T: DeserializeOwned + Ord>(value: &str, field: &str) -> Result<BTreeSet<T>> {
    serde_json::from_str(value).with_context(|| format!("failed to parse {field}"))
}

pub fn optional_to_json<T: Serialize>(value: Option<&T>) -> Result<Option<String>> {
    value
        .map(|inner| serde_json::to_string(inner).context("failed to encode JSON column"))
        .transpose()
}

pub fn optional_from_json<T: DeserializeOwned>(
    value: Option<String>,
    field: &str,
) -> Result<Option<T>> {
    match value {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .with_context(|| format!("failed to parse {field}")),
        None => Ok(None),
    }
}
