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

//! Reserved `@` keys of object projections

use std::sync::Arc;

use super::{ObjectProjection, Projection};
use crate::engine::Projector;
use crate::function::{ContextFn, Predicate};

/// Key of the array-mapping directive
pub const ARRAY_KEY: &str = "@array";
/// Key of the conditional directive
pub const IF_KEY: &str = "@if";
/// Key (or key prefix, followed by `:suffix`) of the combine directive
pub const COMBINE_KEY: &str = "@combine";

/// Structural directive attached to an object projection
#[derive(Debug, Clone)]
pub enum Directive {
    /// `@array`: the data at this level is a list projected element-wise
    Array,

    /// `@if`: every item whose predicate holds contributes its entries
    If(Vec<Condition>),

    /// `@combine` / `@combine:<suffix>`: the function's record result is
    /// merged into the output
    Combine {
        /// Suffix distinguishing several combine directives
        suffix: Option<String>,
        /// Entry-producing function
        func: ContextFn,
    },
}

impl Directive {
    /// Key as written in a projection
    pub fn key(&self) -> String {
        match self {
            Directive::Array => ARRAY_KEY.to_string(),
            Directive::If(_) => IF_KEY.to_string(),
            Directive::Combine { suffix: None, .. } => COMBINE_KEY.to_string(),
            Directive::Combine {
                suffix: Some(suffix),
                ..
            } => format!("{COMBINE_KEY}:{suffix}"),
        }
    }
}

/// One `@if` item
#[derive(Debug, Clone)]
pub struct Condition {
    /// Predicate deciding whether the item contributes
    pub when: Predicate,
    /// Entries contributed when the predicate holds
    pub then: Then,
}

/// Entry source of a matching `@if` item
#[derive(Debug, Clone)]
pub enum Then {
    /// Compiled projection invoked over the full current data
    Project(Projector),
    /// Context function whose record result supplies the entries
    Compute(ContextFn),
    /// Projection applied to the full current data
    Inline(Arc<Projection>),
}

impl From<Projector> for Then {
    fn from(projector: Projector) -> Self {
        Then::Project(projector)
    }
}

impl From<ContextFn> for Then {
    fn from(func: ContextFn) -> Self {
        Then::Compute(func)
    }
}

impl From<Projection> for Then {
    fn from(projection: Projection) -> Self {
        Then::Inline(Arc::new(projection))
    }
}

impl From<ObjectProjection> for Then {
    fn from(projection: ObjectProjection) -> Self {
        Then::Inline(Arc::new(Projection::Object(projection)))
    }
}

impl From<Arc<Projection>> for Then {
    fn from(projection: Arc<Projection>) -> Self {
        Then::Inline(projection)
    }
}

/// Build an `@if` item
pub fn condition(when: Predicate, then: impl Into<Then>) -> Condition {
    Condition {
        when,
        then: then.into(),
    }
}
