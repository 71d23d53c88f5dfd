// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Core value type flowing through projections
//!
//! `Value` is a JSON-shaped tree with two additions: a `Date` variant produced
//! by the `date` type tag, and a `Projected` variant marking records that have
//! already been through a projection and must not be scanned again.

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Number;
use std::fmt;

use super::record::ProjectedRecord;
use crate::error::{ProjectionError, Result};

/// Ordered mapping used for plain records
pub type Record = IndexMap<String, Value>;

/// A value produced or consumed by a projection
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Explicit null
    #[default]
    Null,

    /// Boolean value
    Bool(bool),

    /// Integer or floating point number
    Number(Number),

    /// String value
    String(String),

    /// Point in time produced by the `date` type tag
    Date(DateTime<Utc>),

    /// Ordered list of values
    Array(Vec<Value>),

    /// Plain record (may still contain `{{...}}` references)
    Object(Record),

    /// Record that was assembled by a projection
    Projected(ProjectedRecord),
}

impl Value {
    /// Parse a JSON document into a value
    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str::<serde_json::Value>(raw)
            .map(Value::from)
            .map_err(|e| ProjectionError::malformed_input(raw, e))
    }

    /// Truthiness used throughout the engine.
    ///
    /// `null`, `false`, `0`, `NaN` and the empty string are falsy. Records,
    /// arrays and dates are always truthy, even when empty.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
            Value::String(s) => !s.is_empty(),
            Value::Date(_) | Value::Array(_) | Value::Object(_) | Value::Projected(_) => true,
        }
    }

    /// Check for null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check whether this value carries the already-projected marker
    pub fn is_projected(&self) -> bool {
        matches!(self, Value::Projected(record) if record.is_projected())
    }

    /// Projected record, or a non-empty list made only of projection output
    /// (what a nested projection returns for list data)
    pub fn is_projection_output(&self) -> bool {
        match self {
            Value::Projected(_) => self.is_projected(),
            Value::Array(items) => !items.is_empty() && items.iter().all(Value::is_projection_output),
            _ => false,
        }
    }

    /// Borrow the fields of a plain or projected record
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Object(record) => Some(record),
            Value::Projected(record) => Some(record.fields()),
            _ => None,
        }
    }

    /// Borrow the items of an array
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get an integer value
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// Get a floating point value
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Get a boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get a date value
    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Date(date) => Some(date),
            _ => None,
        }
    }

    /// Look up a direct child. Records are indexed by key, arrays by a
    /// decimal index.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(_) | Value::Projected(_) => self.as_record()?.get(key),
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Look up a dotted path such as `deep.1.value`
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        path.split('.').try_fold(self, |current, segment| current.get(segment))
    }

    /// Convert into plain JSON. Dates become RFC 3339 strings and projected
    /// records become ordinary objects.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Date(date) => serde_json::Value::String(format_date(date)),
            Value::Array(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Object(_) | Value::Projected(_) => serde_json::Value::Object(
                self.as_record()
                    .into_iter()
                    .flatten()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// String form used when a reference is embedded inside a larger string
    pub fn to_display_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Date(date) => format_date(date),
            other => other.to_json().to_string(),
        }
    }

    /// Name of the variant, for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Projected(_) => "projected",
        }
    }
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Date(date) => serializer.serialize_str(&format_date(date)),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(record) => serialize_record(record, serializer),
            Value::Projected(record) => serialize_record(record.fields(), serializer),
        }
    }
}

fn serialize_record<S: Serializer>(record: &Record, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(record.len()))?;
    for (key, value) in record {
        map.serialize_entry(key, value)?;
    }
    map.end()
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value.into())
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value.into())
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Number(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Date(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Value::Object(value)
    }
}

impl From<ProjectedRecord> for Value {
    fn from(value: ProjectedRecord) -> Self {
        Value::Projected(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!(null), false)]
    #[case(json!(false), false)]
    #[case(json!(0), false)]
    #[case(json!(0.0), false)]
    #[case(json!(""), false)]
    #[case(json!(true), true)]
    #[case(json!(42), true)]
    #[case(json!("x"), true)]
    #[case(json!({}), true)]
    #[case(json!([]), true)]
    fn test_truthiness(#[case] input: serde_json::Value, #[case] expected: bool) {
        assert_eq!(Value::from(input).is_truthy(), expected);
    }

    #[test]
    fn test_get_path_walks_records_and_arrays() {
        let value = Value::from(json!({
            "deep": { "1": { "2": { "value": "deep" } } },
            "items": [{ "title": "first" }, { "title": "second" }]
        }));
        assert_eq!(value.get_path("deep.1.2.value"), Some(&Value::from("deep")));
        assert_eq!(value.get_path("items.1.title"), Some(&Value::from("second")));
        assert_eq!(value.get_path("items.7.title"), None);
        assert_eq!(value.get_path("deep.missing.value"), None);
    }

    #[test]
    fn test_projected_record_serializes_without_marker() {
        let mut fields = Record::new();
        fields.insert("title".to_string(), Value::from("Hello"));
        let value = Value::Projected(ProjectedRecord::new(fields));

        assert!(value.is_projected());
        assert_eq!(serde_json::to_value(&value).unwrap(), json!({ "title": "Hello" }));
        assert_eq!(value.to_json(), json!({ "title": "Hello" }));
    }

    #[test]
    fn test_projection_output_covers_projected_lists() {
        let projected = Value::Projected(ProjectedRecord::default());

        assert!(projected.is_projection_output());
        assert!(Value::Array(vec![projected.clone(), projected.clone()]).is_projection_output());
        assert!(!Value::Array(vec![projected, Value::from(json!({ "a": 1 }))]).is_projection_output());
        assert!(!Value::Array(Vec::new()).is_projection_output());
        assert!(!Value::from(json!({ "a": 1 })).is_projection_output());
    }

    #[test]
    fn test_display_string() {
        assert_eq!(Value::from("plain").to_display_string(), "plain");
        assert_eq!(Value::from(42).to_display_string(), "42");
        assert_eq!(Value::from(true).to_display_string(), "true");
        assert_eq!(Value::from(json!({"a": 1})).to_display_string(), "{\"a\":1}");
    }

    #[test]
    fn test_from_json_str_reports_malformed_input() {
        let err = Value::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ProjectionError::MalformedInput { ref value, .. } if value == "{not json"));
        assert_eq!(Value::from_json_str("[1]").unwrap(), Value::from(json!([1])));
    }
}
