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

//! Variable scopes used for interpolation and context functions
//!
//! A scope maps names to values, functions (pipes and computed variables),
//! pending values, or nested scopes. Lookups accept dotted paths that walk
//! nested scopes first and then the records and arrays held by plain values.
//!
//! # Resolution
//!
//! `a.b.c` resolves `a` in this scope, then `b` inside whatever `a` holds:
//! a nested [`Variables`] scope or a record/array [`Value`]. Functions and
//! pending values are only reachable as the last segment of a path.

use indexmap::IndexMap;
use std::fmt;

use crate::function::{ContextFn, Deferred};
use crate::model::{Record, Value};

/// A single entry in a variable scope
#[derive(Clone)]
pub enum Variable {
    /// Plain value
    Value(Value),
    /// Function invoked with the evaluation context (pipes, computed variables)
    Function(ContextFn),
    /// Pending value awaited on lookup
    Deferred(Deferred),
    /// Nested scope, e.g. a namespace of pipes
    Scope(Variables),
}

impl Variable {
    /// Whether this variable can be called as a pipe
    pub fn is_function(&self) -> bool {
        matches!(self, Variable::Function(_))
    }

    /// Borrow the plain value, if any
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Variable::Value(value) => Some(value),
            _ => None,
        }
    }

    fn child(&self, segment: &str) -> Option<Variable> {
        match self {
            Variable::Scope(scope) => scope.get(segment).cloned(),
            Variable::Value(value) => value.get(segment).cloned().map(Variable::Value),
            Variable::Function(_) | Variable::Deferred(_) => None,
        }
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Variable::Function(func) => func.fmt(f),
            Variable::Deferred(deferred) => deferred.fmt(f),
            Variable::Scope(scope) => f.debug_tuple("Scope").field(scope).finish(),
        }
    }
}

macro_rules! variable_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Variable {
                fn from(value: $ty) -> Self {
                    Variable::Value(value.into())
                }
            }
        )*
    };
}

variable_from_value!(Value, serde_json::Value, Record, &str, String, bool, i64, i32, f64);

impl From<ContextFn> for Variable {
    fn from(func: ContextFn) -> Self {
        Variable::Function(func)
    }
}

impl From<Deferred> for Variable {
    fn from(deferred: Deferred) -> Self {
        Variable::Deferred(deferred)
    }
}

impl From<Variables> for Variable {
    fn from(scope: Variables) -> Self {
        Variable::Scope(scope)
    }
}

/// Ordered variable scope
#[derive(Clone, Default)]
pub struct Variables {
    entries: IndexMap<String, Variable>,
}

impl Variables {
    /// Create an empty scope
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scope from a JSON object. Non-object input yields an empty scope.
    pub fn from_json(value: serde_json::Value) -> Self {
        match Value::from(value) {
            Value::Object(record) => Self::from(record),
            _ => Self::new(),
        }
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, variable: impl Into<Variable>) -> Self {
        self.insert(name, variable);
        self
    }

    /// Insert or replace a variable
    pub fn insert(&mut self, name: impl Into<String>, variable: impl Into<Variable>) {
        self.entries.insert(name.into(), variable.into());
    }

    /// Direct (non-dotted) lookup
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.entries.get(name)
    }

    /// Dotted path lookup
    pub fn lookup(&self, path: &str) -> Option<Variable> {
        let mut segments = path.split('.');
        let first = self.entries.get(segments.next()?)?.clone();
        segments.try_fold(first, |current, segment| current.child(segment))
    }

    /// Overlay another scope; its entries win on conflict
    pub fn extend(&mut self, other: &Variables) {
        for (name, variable) in &other.entries {
            self.entries.insert(name.clone(), variable.clone());
        }
    }

    /// Plain-value view of the scope. Functions and pending values are left
    /// out; nested scopes become nested records.
    pub fn to_value(&self) -> Value {
        let record: Record = self
            .entries
            .iter()
            .filter_map(|(name, variable)| {
                let value = match variable {
                    Variable::Value(value) => value.clone(),
                    Variable::Scope(scope) => scope.to_value(),
                    Variable::Function(_) | Variable::Deferred(_) => return None,
                };
                Some((name.clone(), value))
            })
            .collect();
        Value::Object(record)
    }

    /// Check for a name
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check for an empty scope
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate over the entries
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Variable)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl From<Record> for Variables {
    fn from(record: Record) -> Self {
        Self {
            entries: record
                .into_iter()
                .map(|(name, value)| (name, Variable::Value(value)))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<Variable>> FromIterator<(K, V)> for Variables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl fmt::Debug for Variables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dotted_lookup_through_values() {
        let vars = Variables::from_json(json!({
            "custom": { "deep": { "value": "hello" } },
            "deep": { "1": { "2": { "3": { "value": "deep" } } } }
        }));

        let found = vars.lookup("custom.deep.value").unwrap();
        assert_eq!(found.as_value(), Some(&Value::from("hello")));
        let found = vars.lookup("deep.1.2.3.value").unwrap();
        assert_eq!(found.as_value(), Some(&Value::from("deep")));
        assert!(vars.lookup("custom.deep.not.found").is_none());
        assert!(vars.lookup("missing").is_none());
    }

    #[test]
    fn test_dotted_lookup_through_scopes() {
        let pipes = Variables::new().with("upper", ContextFn::sync(|_| Ok("x")));
        let vars = Variables::new().with("pipes", pipes);

        assert!(vars.lookup("pipes.upper").unwrap().is_function());
        assert!(vars.lookup("pipes.upper.more").is_none());
    }

    #[test]
    fn test_extend_overrides_and_keeps_order() {
        let mut base = Variables::new().with("a", 1).with("b", 2);
        base.extend(&Variables::new().with("b", 3).with("c", 4));

        assert_eq!(base.names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(base.get("b").and_then(Variable::as_value), Some(&Value::from(3)));
    }

    #[test]
    fn test_to_value_skips_functions() {
        let vars = Variables::new()
            .with("title", "hello")
            .with("fn", ContextFn::sync(|_| Ok("x")))
            .with("nested", Variables::new().with("inner", true));

        assert_eq!(
            vars.to_value().to_json(),
            json!({ "title": "hello", "nested": { "inner": true } })
        );
    }
}
