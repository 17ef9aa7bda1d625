//! The attribute bag - per-record values for custom fields.
//!
//! Storage is schemaless JSON. Values are read back tolerantly: anything that is not a
//! string, a number or a list of strings is kept as [`AttributeValue::Raw`] so records
//! written under an older schema still load and display as-is.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use sea_orm::prelude::Json;
use serde::Serialize;
use std::collections::BTreeMap;

/// A single value in the attribute bag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// text, textarea, select, radio and date values
    Text(String),
    /// number values
    Number(f64),
    /// checkbox selections
    List(Vec<String>),
    /// Stored JSON that matches none of the shapes above
    Raw(Json),
}

impl AttributeValue {
    /// Whether the value counts as "not filled in".
    ///
    /// Shared by server-side validation and the client-side submit gate so both agree:
    /// whitespace-only text, an empty list and JSON null are blank, numbers never are.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Number(_) => false,
            Self::List(items) => items.is_empty(),
            Self::Raw(json) => json.is_null(),
        }
    }

    /// Plain-text rendering of the stored value, list entries joined with `, `.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Number(number) => number.to_string(),
            Self::List(items) => items.join(", "),
            Self::Raw(Json::String(text)) => text.clone(),
            Self::Raw(json) => json.to_string(),
        }
    }

    /// Reads a stored JSON value into its closest typed shape.
    #[must_use]
    pub fn from_json(json: &Json) -> Self {
        match json {
            Json::String(text) => Self::Text(text.clone()),
            Json::Number(number) => number
                .as_f64()
                .map_or_else(|| Self::Raw(json.clone()), Self::Number),
            Json::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map_or_else(|| Self::Raw(json.clone()), Self::List),
            _ => Self::Raw(json.clone()),
        }
    }

    /// JSON form used for storage. Non-finite numbers become null.
    #[must_use]
    pub fn to_json(&self) -> Json {
        match self {
            Self::Text(text) => Json::String(text.clone()),
            Self::Number(number) => number_to_json(*number),
            Self::List(items) => Json::Array(items.iter().cloned().map(Json::String).collect()),
            Self::Raw(json) => json.clone(),
        }
    }
}

/// Whole numbers are stored as JSON integers so `42` reads back as `42`, not `42.0`.
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn number_to_json(number: f64) -> Json {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if number.fract() == 0.0 && number.abs() < MAX_EXACT {
        Json::from(number as i64)
    } else {
        serde_json::Number::from_f64(number).map_or(Json::Null, Json::Number)
    }
}

/// Custom-field values of one land record, keyed by field definition key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AttributeBag(BTreeMap<String, AttributeValue>);

impl AttributeBag {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a stored `additional_data` column. Anything but a JSON object yields an
    /// empty bag.
    #[must_use]
    pub fn from_json(json: &Json) -> Self {
        match json {
            Json::Object(map) => Self(
                map.iter()
                    .map(|(key, value)| (key.clone(), AttributeValue::from_json(value)))
                    .collect(),
            ),
            Json::Null => Self::default(),
            other => {
                tracing::warn!("Ignoring non-object attribute bag: {}", other);
                Self::default()
            }
        }
    }

    /// JSON object for the `additional_data` column.
    #[must_use]
    pub fn to_json(&self) -> Json {
        Json::Object(
            self.0
                .iter()
                .map(|(key, value)| (key.clone(), value.to_json()))
                .collect(),
        )
    }

    /// Value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.0.get(key)
    }

    /// Stores `value` under `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: AttributeValue) -> Option<AttributeValue> {
        self.0.insert(key.into(), value)
    }

    /// Removes and returns the value under `key`.
    pub fn remove(&mut self, key: &str) -> Option<AttributeValue> {
        self.0.remove(key)
    }

    /// Whether `key` has an entry (blank or not).
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.0.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the bag has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, AttributeValue)> for AttributeBag {
    fn from_iter<I: IntoIterator<Item = (String, AttributeValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for AttributeBag {
    type Item = (String, AttributeValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, AttributeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Parses the calendar date part of `text`.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and `YYYY-MM-DD[T ]HH:MM:SS` with optional
/// fractional seconds.
#[must_use]
pub fn parse_calendar_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Some(timestamp.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|timestamp| timestamp.date())
}
