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

//! Evaluation context handed to every user callback
//!
//! The context is cheap to clone: data, scopes and the projection are shared
//! through `Arc`, so every per-key evaluation gets its own copy.

use std::fmt;
use std::sync::Arc;

use super::variables::{Variable, Variables};
use crate::model::Value;
use crate::projection::Projection;

/// Position of the value being evaluated inside its parent
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Key {
    /// Top-level invocation
    #[default]
    Root,
    /// Property of a record
    Field(String),
    /// Position in a list
    Index(usize),
}

impl Key {
    /// Value form exposed to interpolation as `{{key}}`
    pub fn to_value(&self) -> Value {
        match self {
            Key::Root => Value::Null,
            Key::Field(name) => Value::from(name.as_str()),
            Key::Index(index) => Value::from(*index as u64),
        }
    }

    /// Field name, if this is a record key
    pub fn as_field(&self) -> Option<&str> {
        match self {
            Key::Field(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Root => f.write_str("$root"),
            Key::Field(name) => f.write_str(name),
            Key::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// Context passed to context functions, predicates, combine functions and pipes
#[derive(Clone)]
pub struct EvaluationContext {
    /// Merged variable scope (global, projection, instance and parent layers)
    pub variables: Arc<Variables>,

    /// Data at the current level. For pipes this is the value being piped.
    pub data: Arc<Value>,

    /// Key being evaluated
    pub key: Key,

    /// Projection that is being applied at this level
    pub projection: Arc<Projection>,

    /// Variables fixed when the projection was created
    pub projection_context: Option<Arc<Variables>>,

    /// Variables supplied to the top-level invocation
    pub instance_context: Option<Arc<Variables>>,

    /// Context of the enclosing projection
    pub parent: Option<Arc<EvaluationContext>>,

    /// Parsed pipe parameters (`None` outside pipes or without parameters)
    pub params: Option<Vec<Value>>,

    pub(crate) depth: usize,
}

impl EvaluationContext {
    pub(crate) fn new(
        variables: Arc<Variables>,
        data: Arc<Value>,
        projection: Arc<Projection>,
        projection_context: Option<Arc<Variables>>,
        instance_context: Option<Arc<Variables>>,
        parent: Option<Arc<EvaluationContext>>,
        depth: usize,
    ) -> Self {
        Self {
            variables,
            data,
            key: Key::Root,
            projection,
            projection_context,
            instance_context,
            parent,
            params: None,
            depth,
        }
    }

    /// Same context, pointed at another key
    pub(crate) fn for_key(&self, key: Key) -> Self {
        Self {
            key,
            ..self.clone()
        }
    }

    /// Same context with the data replaced, as seen by pipes and transformers
    pub fn with_data(&self, data: Value, params: Option<Vec<Value>>) -> Self {
        Self {
            data: Arc::new(data),
            params,
            ..self.clone()
        }
    }

    /// Look up a variable in the merged scope (dotted paths allowed)
    pub fn variable(&self, path: &str) -> Option<Variable> {
        self.variables.lookup(path)
    }

    /// Look up a plain value in the merged scope
    pub fn value_of(&self, path: &str) -> Option<Value> {
        match self.variables.lookup(path)? {
            Variable::Value(value) => Some(value),
            Variable::Scope(scope) => Some(scope.to_value()),
            Variable::Function(_) | Variable::Deferred(_) => None,
        }
    }

    /// Look up a variable in the instance context only
    pub fn instance(&self, path: &str) -> Option<Variable> {
        self.instance_context.as_ref()?.lookup(path)
    }

    /// Read a field of the current data
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Raw data value for the current key
    pub fn current(&self) -> Option<&Value> {
        match &self.key {
            Key::Field(name) => self.data.get(name),
            Key::Index(index) => self.data.as_array().and_then(|items| items.get(*index)),
            Key::Root => Some(self.data.as_ref()),
        }
    }

    /// Pipe parameter by position
    pub fn param(&self, index: usize) -> Option<&Value> {
        self.params.as_ref()?.get(index)
    }

    /// Nesting depth of this context
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl fmt::Debug for EvaluationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationContext")
            .field("key", &self.key)
            .field("data", &self.data)
            .field("variables", &self.variables.names().collect::<Vec<_>>())
            .field("params", &self.params)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}
