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

//! Records assembled by a projection

use serde::{Serialize, Serializer};
use std::ops::Deref;

use super::value::{Record, Value};

/// A record produced by a projection.
///
/// The wrapper itself is the "already projected" marker: the interpolator
/// never rescans a `ProjectedRecord`, so embedding a projection result inside
/// another projection's output leaves it untouched. The marker is not a field
/// and never shows up when the record is iterated or serialized.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjectedRecord {
    fields: Record,
}

impl ProjectedRecord {
    /// Wrap assembled fields
    pub fn new(fields: Record) -> Self {
        Self { fields }
    }

    /// Always true; reading the marker never fails
    pub fn is_projected(&self) -> bool {
        true
    }

    /// Borrow the fields
    pub fn fields(&self) -> &Record {
        &self.fields
    }

    /// Mutably borrow the fields, for callers overriding projected values
    pub fn fields_mut(&mut self) -> &mut Record {
        &mut self.fields
    }

    /// Unwrap into a plain record
    pub fn into_fields(self) -> Record {
        self.fields
    }
}

impl Deref for ProjectedRecord {
    type Target = Record;

    fn deref(&self) -> &Self::Target {
        &self.fields
    }
}

impl From<Record> for ProjectedRecord {
    fn from(fields: Record) -> Self {
        Self::new(fields)
    }
}

impl FromIterator<(String, Value)> for ProjectedRecord {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Serialize for ProjectedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_is_not_a_field() {
        let mut record: ProjectedRecord = [("title".to_string(), Value::from("Hello"))]
            .into_iter()
            .collect();

        assert!(record.is_projected());
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["title"]);

        record.fields_mut().insert("title".to_string(), Value::from("lorem"));
        assert_eq!(record.get("title"), Some(&Value::from("lorem")));
    }
}
