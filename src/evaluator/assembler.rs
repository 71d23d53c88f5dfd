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

//! Result assembly

use crate::model::{ProjectedRecord, Record, Value};

/// Entries contributed by one directive
pub(crate) type Contribution = Vec<(String, Value)>;

/// Build the output record from ordinary entries (absent ones dropped) and
/// directive contributions. A later entry replaces the value of an earlier
/// one with the same key and keeps the earlier position.
pub(crate) fn assemble<'a, I>(entries: I, contributions: Vec<Contribution>) -> Value
where
    I: IntoIterator<Item = (&'a str, Option<Value>)>,
{
    let mut record = Record::new();
    for (key, value) in entries {
        if let Some(value) = value {
            record.insert(key.to_string(), value);
        }
    }
    for (key, value) in contributions.into_iter().flatten() {
        record.insert(key, value);
    }
    Value::Projected(ProjectedRecord::new(record))
}

/// Entries of a record-shaped value; anything else contributes nothing
pub(crate) fn entries_of(value: Value) -> Contribution {
    match value {
        Value::Object(record) => record.into_iter().collect(),
        Value::Projected(record) => record.into_fields().into_iter().collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_absent_entries_are_dropped() {
        let result = assemble(
            vec![("a", Some(Value::from(1))), ("b", None), ("c", Some(Value::from("x")))],
            Vec::new(),
        );

        assert!(result.is_projected());
        assert_eq!(result.to_json(), json!({ "a": 1, "c": "x" }));
    }

    #[test]
    fn test_contributions_follow_and_overwrite_in_place() {
        let result = assemble(
            vec![("x", Some(Value::from(0))), ("added", Some(Value::from("a")))],
            vec![
                vec![("x".to_string(), Value::from(1)), ("y".to_string(), Value::from(1))],
                vec![("x".to_string(), Value::from(2))],
            ],
        );

        let keys: Vec<_> = result.as_record().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["x", "added", "y"]);
        assert_eq!(result.to_json(), json!({ "x": 2, "added": "a", "y": 1 }));
    }

    #[test]
    fn test_entries_of_non_records_is_empty() {
        assert!(entries_of(Value::from("text")).is_empty());
        assert_eq!(entries_of(Value::from(json!({ "k": true }))).len(), 1);
    }
}
