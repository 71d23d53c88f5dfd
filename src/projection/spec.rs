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

//! Per-entry value specifications

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

use super::{ObjectProjection, Projection};
use crate::engine::Projector;
use crate::function::{ContextFn, Deferred};
use crate::model::Value;

static ARRAY_OF: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^array<(.+)>").expect("valid regex"));

/// Declared type of a projected field
///
/// Every tag except [`TypeTag::Date`] passes the raw value through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// `string`
    String,
    /// `number`
    Number,
    /// `boolean`
    Boolean,
    /// `date`, coerced to a date value
    Date,
    /// `object`
    Object,
    /// `array`
    Array,
    /// `undefined`
    Undefined,
    /// `any`
    Any,
    /// `unknown`
    Unknown,
    /// `array<...>` with the element type name
    ArrayOf(String),
}

impl TypeTag {
    /// Recognize a type tag. Bare tags match exactly; `array<...>` matches
    /// case-insensitively.
    pub fn parse(tag: &str) -> Option<Self> {
        let parsed = match tag {
            "string" => TypeTag::String,
            "number" => TypeTag::Number,
            "boolean" => TypeTag::Boolean,
            "date" => TypeTag::Date,
            "object" => TypeTag::Object,
            "array" => TypeTag::Array,
            "undefined" => TypeTag::Undefined,
            "any" => TypeTag::Any,
            "unknown" => TypeTag::Unknown,
            other => {
                let captures = ARRAY_OF.captures(other)?;
                TypeTag::ArrayOf(captures[1].to_string())
            }
        };
        Some(parsed)
    }

    /// Tag as written in a projection
    pub fn name(&self) -> String {
        match self {
            TypeTag::String => "string".into(),
            TypeTag::Number => "number".into(),
            TypeTag::Boolean => "boolean".into(),
            TypeTag::Date => "date".into(),
            TypeTag::Object => "object".into(),
            TypeTag::Array => "array".into(),
            TypeTag::Undefined => "undefined".into(),
            TypeTag::Any => "any".into(),
            TypeTag::Unknown => "unknown".into(),
            TypeTag::ArrayOf(inner) => format!("array<{inner}>"),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// What a projection key resolves to
#[derive(Debug, Clone)]
pub enum Spec {
    /// Declared type; the raw value is passed through (dates are coerced)
    Type(TypeTag),
    /// Raw value passed through unchanged, see [`typed`] and [`optional`]
    Passthrough,
    /// Constant emitted when truthy
    Literal(Value),
    /// Context function
    Function(ContextFn),
    /// Nested projection applied to the raw value
    Nested(Arc<Projection>),
    /// Compiled projection applied to the raw value
    Project(Projector),
    /// Pending value awaited directly
    Deferred(Deferred),
}

impl Spec {
    /// Type tag if the string names one, otherwise a literal
    pub fn from_tag(tag: &str) -> Self {
        TypeTag::parse(tag).map_or_else(|| Spec::Literal(Value::from(tag)), Spec::Type)
    }

    /// Wrap a context function
    pub fn function(func: ContextFn) -> Self {
        Spec::Function(func)
    }

    /// Constant value
    pub fn literal(value: impl Into<Value>) -> Self {
        Spec::Literal(value.into())
    }
}

/// Pass the raw value through, declaring a concrete type at the call site
pub fn typed() -> Spec {
    Spec::Passthrough
}

/// Pass the raw value through; the key is dropped when the value is missing
pub fn optional() -> Spec {
    Spec::Passthrough
}

impl From<&str> for Spec {
    fn from(tag: &str) -> Self {
        Spec::from_tag(tag)
    }
}

impl From<String> for Spec {
    fn from(tag: String) -> Self {
        Spec::from_tag(&tag)
    }
}

impl From<TypeTag> for Spec {
    fn from(tag: TypeTag) -> Self {
        Spec::Type(tag)
    }
}

impl From<Value> for Spec {
    fn from(value: Value) -> Self {
        match value {
            Value::String(tag) => Spec::from_tag(&tag),
            other => Spec::Literal(other),
        }
    }
}

impl From<bool> for Spec {
    fn from(value: bool) -> Self {
        Spec::Literal(value.into())
    }
}

impl From<i64> for Spec {
    fn from(value: i64) -> Self {
        Spec::Literal(value.into())
    }
}

impl From<i32> for Spec {
    fn from(value: i32) -> Self {
        Spec::Literal(value.into())
    }
}

impl From<f64> for Spec {
    fn from(value: f64) -> Self {
        Spec::Literal(value.into())
    }
}

impl From<ContextFn> for Spec {
    fn from(func: ContextFn) -> Self {
        Spec::Function(func)
    }
}

impl From<Projection> for Spec {
    fn from(projection: Projection) -> Self {
        Spec::Nested(Arc::new(projection))
    }
}

impl From<ObjectProjection> for Spec {
    fn from(projection: ObjectProjection) -> Self {
        Spec::Nested(Arc::new(Projection::Object(projection)))
    }
}

impl From<Vec<ObjectProjection>> for Spec {
    fn from(items: Vec<ObjectProjection>) -> Self {
        Spec::Nested(Arc::new(Projection::list(items)))
    }
}

impl From<Arc<Projection>> for Spec {
    fn from(projection: Arc<Projection>) -> Self {
        Spec::Nested(projection)
    }
}

impl From<Projector> for Spec {
    fn from(projector: Projector) -> Self {
        Spec::Project(projector)
    }
}

impl From<Deferred> for Spec {
    fn from(deferred: Deferred) -> Self {
        Spec::Deferred(deferred)
    }
}
