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

//! User supplied callables
//!
//! Context functions, predicates, pipes and combine functions all share one
//! shape: an async function from an [`EvaluationContext`] to a [`Computed`]
//! result. Any `Fn(EvaluationContext) -> impl Future<Output = Result<R>>` with
//! `R: Into<Computed>` implements [`ContextFunction`], so plain async closures
//! can be used directly.

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::context::EvaluationContext;
use crate::engine::Projector;
use crate::error::Result;
use crate::model::{ProjectedRecord, Record, Value};

/// Marker string a context function may return to fall back to the raw value
pub const INHERIT: &str = "_inherit";

/// What a context function produced
#[derive(Debug, Clone)]
pub enum Computed {
    /// A concrete value
    Value(Value),
    /// Nothing; the key is left out of the result
    Absent,
    /// Use the raw data value for the current key
    Inherit,
    /// Apply this projection to the raw data value for the current key
    Apply(Projector),
}

impl Computed {
    /// Convert into a value, mapping the inherit marker string to `Inherit`
    pub(crate) fn normalize(self) -> Self {
        match self {
            Computed::Value(Value::String(s)) if s == INHERIT => Computed::Inherit,
            other => other,
        }
    }
}

impl From<Value> for Computed {
    fn from(value: Value) -> Self {
        Computed::Value(value)
    }
}

impl From<serde_json::Value> for Computed {
    fn from(value: serde_json::Value) -> Self {
        Computed::Value(value.into())
    }
}

impl From<&str> for Computed {
    fn from(value: &str) -> Self {
        Computed::Value(value.into())
    }
}

impl From<String> for Computed {
    fn from(value: String) -> Self {
        Computed::Value(value.into())
    }
}

impl From<bool> for Computed {
    fn from(value: bool) -> Self {
        Computed::Value(value.into())
    }
}

impl From<i64> for Computed {
    fn from(value: i64) -> Self {
        Computed::Value(value.into())
    }
}

impl From<i32> for Computed {
    fn from(value: i32) -> Self {
        Computed::Value(value.into())
    }
}

impl From<f64> for Computed {
    fn from(value: f64) -> Self {
        Computed::Value(value.into())
    }
}

impl From<Record> for Computed {
    fn from(value: Record) -> Self {
        Computed::Value(value.into())
    }
}

impl From<ProjectedRecord> for Computed {
    fn from(value: ProjectedRecord) -> Self {
        Computed::Value(value.into())
    }
}

impl From<Projector> for Computed {
    fn from(value: Projector) -> Self {
        Computed::Apply(value)
    }
}

impl From<()> for Computed {
    fn from(_: ()) -> Self {
        Computed::Absent
    }
}

impl<T: Into<Computed>> From<Option<T>> for Computed {
    fn from(value: Option<T>) -> Self {
        value.map_or(Computed::Absent, Into::into)
    }
}

/// An async function over the evaluation context
#[async_trait]
pub trait ContextFunction: Send + Sync {
    /// Invoke the function
    async fn call(&self, context: EvaluationContext) -> Result<Computed>;
}

#[async_trait]
impl<F, Fut, R> ContextFunction for F
where
    F: Fn(EvaluationContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R>> + Send + 'static,
    R: Into<Computed> + Send + 'static,
{
    async fn call(&self, context: EvaluationContext) -> Result<Computed> {
        (self)(context).await.map(|result| result.into().normalize())
    }
}

/// Shared handle to a context function
#[derive(Clone)]
pub struct ContextFn(Arc<dyn ContextFunction>);

impl ContextFn {
    /// Wrap an async closure
    pub fn new<F, Fut, R>(func: F) -> Self
    where
        F: Fn(EvaluationContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R>> + Send + 'static,
        R: Into<Computed> + Send + 'static,
    {
        Self(Arc::new(func))
    }

    /// Wrap a synchronous closure
    pub fn sync<F, R>(func: F) -> Self
    where
        F: Fn(EvaluationContext) -> Result<R> + Send + Sync + 'static,
        R: Into<Computed> + Send + 'static,
    {
        Self::new(move |context| futures::future::ready(func(context)))
    }

    /// Wrap an existing [`ContextFunction`] implementation
    pub fn from_function(func: Arc<dyn ContextFunction>) -> Self {
        Self(func)
    }

    /// Invoke the function
    pub async fn call(&self, context: EvaluationContext) -> Result<Computed> {
        self.0.call(context).await
    }

    /// Whether both handles point at the same function
    pub fn ptr_eq(&self, other: &ContextFn) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ContextFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContextFn(..)")
    }
}

/// A condition evaluated against the evaluation context
#[derive(Clone, Debug)]
pub struct Predicate(ContextFn);

impl Predicate {
    /// Wrap an async closure; the result is tested for truthiness
    pub fn new<F, Fut, R>(func: F) -> Self
    where
        F: Fn(EvaluationContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R>> + Send + 'static,
        R: Into<Computed> + Send + 'static,
    {
        Self(ContextFn::new(func))
    }

    /// Wrap a synchronous closure
    pub fn sync<F, R>(func: F) -> Self
    where
        F: Fn(EvaluationContext) -> Result<R> + Send + Sync + 'static,
        R: Into<Computed> + Send + 'static,
    {
        Self(ContextFn::sync(func))
    }

    /// A predicate with a fixed outcome
    pub fn always(outcome: bool) -> Self {
        Self::sync(move |_| Ok(outcome))
    }

    /// Evaluate the predicate
    pub async fn test(&self, context: EvaluationContext) -> Result<bool> {
        Ok(match self.0.call(context).await? {
            Computed::Value(value) => value.is_truthy(),
            Computed::Apply(_) | Computed::Inherit => true,
            Computed::Absent => false,
        })
    }
}

impl From<ContextFn> for Predicate {
    fn from(func: ContextFn) -> Self {
        Self(func)
    }
}

/// A pending value, awaited on first use and shared by every reader
#[derive(Clone)]
pub struct Deferred(Shared<BoxFuture<'static, Value>>);

impl Deferred {
    /// Wrap a future
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Value> + Send + 'static,
    {
        Self(future.boxed().shared())
    }

    /// An already settled value
    pub fn ready(value: impl Into<Value>) -> Self {
        Self::new(futures::future::ready(value.into()))
    }

    /// Wait for the value
    pub async fn resolve(&self) -> Value {
        self.0.clone().await
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.peek() {
            Some(value) => f.debug_tuple("Deferred").field(value).finish(),
            None => f.write_str("Deferred(<pending>)"),
        }
    }
}
