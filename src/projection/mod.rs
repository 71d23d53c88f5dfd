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

//! Projection definitions
//!
//! A [`Projection`] describes the shape of the output: either an ordered
//! object of keys mapped to [`Spec`]s plus structural [`Directive`]s, or a
//! positional list of projections paired with list data by index.
//!
//! ```
//! use octofhir_projection::projection::{Projection, ObjectProjection};
//!
//! let user = ObjectProjection::new()
//!     .field("name", "string")
//!     .field("born", "date")
//!     .field("address", ObjectProjection::new().field("city", "string"));
//!
//! let projection = Projection::from(user);
//! assert!(projection.as_object().is_some());
//! ```

#![warn(missing_docs)]

pub mod directive;
pub mod json;
pub mod spec;

use indexmap::IndexMap;
use std::sync::Arc;

use crate::function::ContextFn;

pub use directive::{ARRAY_KEY, COMBINE_KEY, Condition, Directive, IF_KEY, Then, condition};
pub use spec::{Spec, TypeTag, optional, typed};

/// Object or positional list projection
#[derive(Debug, Clone)]
pub enum Projection {
    /// Ordered keys with their specs and directives
    Object(ObjectProjection),
    /// One projection per position of list data
    List(Vec<Arc<Projection>>),
}

impl Projection {
    /// Start an object projection
    pub fn object() -> ObjectProjection {
        ObjectProjection::new()
    }

    /// Positional list projection
    pub fn list<I, P>(items: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Projection>,
    {
        Projection::List(items.into_iter().map(|p| Arc::new(p.into())).collect())
    }

    /// Borrow the object form
    pub fn as_object(&self) -> Option<&ObjectProjection> {
        match self {
            Projection::Object(object) => Some(object),
            Projection::List(_) => None,
        }
    }

    /// Borrow the list form
    pub fn as_list(&self) -> Option<&[Arc<Projection>]> {
        match self {
            Projection::List(items) => Some(items),
            Projection::Object(_) => None,
        }
    }

    /// Whether this is an object projection declaring `@array`
    pub fn is_array(&self) -> bool {
        self.as_object().is_some_and(ObjectProjection::is_array)
    }
}

impl Default for Projection {
    fn default() -> Self {
        Projection::Object(ObjectProjection::default())
    }
}

impl From<ObjectProjection> for Projection {
    fn from(object: ObjectProjection) -> Self {
        Projection::Object(object)
    }
}

impl From<Vec<Projection>> for Projection {
    fn from(items: Vec<Projection>) -> Self {
        Projection::list(items)
    }
}

impl From<Vec<ObjectProjection>> for Projection {
    fn from(items: Vec<ObjectProjection>) -> Self {
        Projection::list(items)
    }
}

/// Ordered object projection
///
/// Ordinary keys keep their declaration order in the output. Directive
/// contributions follow in directive order.
#[derive(Debug, Clone, Default)]
pub struct ObjectProjection {
    fields: IndexMap<String, Spec>,
    directives: Vec<Directive>,
}

impl ObjectProjection {
    /// Empty projection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an output key
    pub fn field(mut self, key: impl Into<String>, spec: impl Into<Spec>) -> Self {
        self.insert(key, spec);
        self
    }

    /// Declare `@array`
    pub fn array(self) -> Self {
        self.directive(Directive::Array)
    }

    /// Add an `@if` directive
    pub fn conditions(self, items: Vec<Condition>) -> Self {
        self.directive(Directive::If(items))
    }

    /// Add an unnamed `@combine` directive
    pub fn combine(self, func: ContextFn) -> Self {
        self.directive(Directive::Combine { suffix: None, func })
    }

    /// Add a `@combine:<suffix>` directive
    pub fn combine_named(self, suffix: impl Into<String>, func: ContextFn) -> Self {
        self.directive(Directive::Combine {
            suffix: Some(suffix.into()),
            func,
        })
    }

    /// Add a directive
    pub fn directive(mut self, directive: Directive) -> Self {
        if matches!(directive, Directive::Array) && self.is_array() {
            return self;
        }
        self.directives.push(directive);
        self
    }

    /// Insert a key. `@` keys are read as directives where the spec allows
    /// it (`@array` with a truthy literal, `@combine[:suffix]` with a
    /// function); other `@` keys are ignored.
    pub fn insert(&mut self, key: impl Into<String>, spec: impl Into<Spec>) {
        let key = key.into();
        let spec = spec.into();
        if !key.starts_with('@') {
            self.fields.insert(key, spec);
            return;
        }

        let directive = match (key.as_str(), spec) {
            (ARRAY_KEY, Spec::Literal(flag)) if flag.is_truthy() => Some(Directive::Array),
            (ARRAY_KEY, _) => None,
            (combine, Spec::Function(func)) if combine == COMBINE_KEY => {
                Some(Directive::Combine { suffix: None, func })
            }
            (combine, Spec::Function(func)) => combine
                .strip_prefix(COMBINE_KEY)
                .and_then(|rest| rest.strip_prefix(':'))
                .map(|suffix| Directive::Combine {
                    suffix: Some(suffix.to_string()),
                    func,
                }),
            _ => None,
        };

        match directive {
            Some(Directive::Array) if self.is_array() => {}
            Some(directive) => self.directives.push(directive),
            None => log::debug!("Ignoring unsupported directive key {key}"),
        }
    }

    /// Ordinary keys and their specs, in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Spec)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Spec of one key
    pub fn get(&self, key: &str) -> Option<&Spec> {
        self.fields.get(key)
    }

    /// Directives in declaration order
    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// Whether `@array` was declared
    pub fn is_array(&self) -> bool {
        self.directives
            .iter()
            .any(|directive| matches!(directive, Directive::Array))
    }

    /// Number of ordinary keys
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether there are no ordinary keys
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
