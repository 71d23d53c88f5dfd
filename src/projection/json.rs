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

//! Loading projections from JSON documents
//!
//! Strings become type tags (or literals when they are not a known tag),
//! objects become nested projections, arrays become positional lists and any
//! other scalar is a literal. Only `@array` can be expressed in JSON; the
//! other directives need functions and are rejected.

use serde_json::Value as JsonValue;
use std::sync::Arc;

use super::{ARRAY_KEY, ObjectProjection, Projection, Spec};
use crate::error::{ProjectionError, Result};
use crate::model::Value;

impl Projection {
    /// Build a projection from a JSON document
    pub fn from_json(document: JsonValue) -> Result<Self> {
        match document {
            JsonValue::Object(map) => object_from_json(map).map(Projection::Object),
            JsonValue::Array(items) => list_from_json(items),
            other => Err(ProjectionError::invalid_projection(format!(
                "expected an object or an array, found {}",
                Value::from(other).type_name()
            ))),
        }
    }

    /// Parse a projection from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        let document: JsonValue = serde_json::from_str(text)
            .map_err(|e| ProjectionError::invalid_projection(e.to_string()))?;
        Self::from_json(document)
    }
}

fn list_from_json(items: Vec<JsonValue>) -> Result<Projection> {
    let items = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            JsonValue::Object(_) | JsonValue::Array(_) => Projection::from_json(item).map(Arc::new),
            _ => Err(ProjectionError::invalid_projection(format!(
                "list projection item {index} must be an object or an array"
            ))),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Projection::List(items))
}

fn object_from_json(map: serde_json::Map<String, JsonValue>) -> Result<ObjectProjection> {
    let mut projection = ObjectProjection::new();
    for (key, value) in map {
        if key == ARRAY_KEY {
            if value.as_bool() == Some(true) {
                projection = projection.array();
            }
            continue;
        }
        if key.starts_with('@') {
            return Err(ProjectionError::invalid_projection(format!(
                "directive {key} cannot be expressed in JSON"
            )));
        }
        let spec = match value {
            JsonValue::String(tag) => Spec::from_tag(&tag),
            JsonValue::Object(_) | JsonValue::Array(_) => Spec::Nested(Arc::new(Projection::from_json(value)?)),
            scalar => Spec::Literal(Value::from(scalar)),
        };
        projection.insert(key, spec);
    }
    Ok(projection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::TypeTag;
    use serde_json::json;

    #[test]
    fn test_object_document() {
        let projection = Projection::from_json(json!({
            "name": "string",
            "born": "date",
            "kind": "user",
            "version": 2,
            "address": { "city": "string" },
            "pair": [{ "a": "string" }, { "b": "string" }]
        }))
        .unwrap();

        let object = projection.as_object().unwrap();
        assert!(matches!(object.get("name"), Some(Spec::Type(TypeTag::String))));
        assert!(matches!(object.get("born"), Some(Spec::Type(TypeTag::Date))));
        assert!(matches!(object.get("kind"), Some(Spec::Literal(Value::String(s))) if s == "user"));
        assert!(matches!(object.get("version"), Some(Spec::Literal(_))));
        assert!(matches!(object.get("address"), Some(Spec::Nested(p)) if p.as_object().is_some()));
        assert!(matches!(object.get("pair"), Some(Spec::Nested(p)) if p.as_list().is_some()));
    }

    #[test]
    fn test_array_flag() {
        let projection = Projection::from_json(json!({ "@array": true, "id": "number" })).unwrap();
        assert!(projection.is_array());
        assert_eq!(projection.as_object().map(ObjectProjection::len), Some(1));
    }

    #[test]
    fn test_unusable_documents() {
        assert!(matches!(
            Projection::from_json(json!("string")),
            Err(ProjectionError::InvalidProjection { .. })
        ));
        assert!(matches!(
            Projection::from_json(json!({ "@if": [] })),
            Err(ProjectionError::InvalidProjection { .. })
        ));
        assert!(matches!(
            Projection::from_json(json!(["string"])),
            Err(ProjectionError::InvalidProjection { .. })
        ));
        assert!(Projection::from_json_str("{ nope").is_err());
    }
}
