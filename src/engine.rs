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

//! Projection engine - the main entry point for projecting data
//!
//! A [`ProjectionEngine`] owns the configuration, the value transformers and
//! the one-time global context. Projections compiled by an engine become
//! [`Projector`]s, which keep a handle to the engine so nested projectors see
//! the same global context.
//!
//! ```rust,no_run
//! use octofhir_projection::{ProjectionEngine, Variables};
//! use octofhir_projection::projection::ObjectProjection;
//! use serde_json::json;
//!
//! # async fn run() -> octofhir_projection::Result<()> {
//! let engine = ProjectionEngine::with_global(Variables::new().with("symbol", "!"));
//! let greeting = engine.create(
//!     ObjectProjection::new()
//!         .field("name", "string")
//!         .field("message", "Hello {{current.name}}{{symbol}}"),
//! );
//!
//! let result = greeting.project(json!({ "name": "Ada" }), None).await?;
//! # Ok(())
//! # }
//! ```

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::context::{EvaluationContext, GlobalContext, GlobalSource, Variables};
use crate::error::{ProjectionError, Result};
use crate::evaluator::Invocation;
use crate::function::{ContextFn, Predicate};
use crate::model::Value;
use crate::projection::Projection;

/// Engine-level rewrite applied to raw values before interpolation
///
/// `when` is tested with a context whose `data` is the raw value; when it
/// holds, the value returned by `then` replaces it.
#[derive(Debug, Clone)]
pub struct ValueTransformer {
    /// Name used in diagnostics
    pub name: String,
    /// Whether the transformer applies to a value
    pub when: Predicate,
    /// Replacement value
    pub then: ContextFn,
}

impl ValueTransformer {
    /// Create a named transformer
    pub fn new(name: impl Into<String>, when: Predicate, then: ContextFn) -> Self {
        Self {
            name: name.into(),
            when,
            then,
        }
    }
}

/// State shared by an engine and every projector it creates
pub(crate) struct EngineShared {
    pub(crate) global: GlobalContext,
    pub(crate) transformers: Vec<ValueTransformer>,
    pub(crate) config: EngineConfig,
}

/// Projection engine
#[derive(Clone)]
pub struct ProjectionEngine {
    shared: Arc<EngineShared>,
}

impl Default for ProjectionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectionEngine {
    /// Engine with an empty global context and default configuration
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Engine with a ready global context
    pub fn with_global(variables: Variables) -> Self {
        Self::builder().global(variables).build()
    }

    /// Engine whose global context is produced by an async initializer
    ///
    /// The initializer runs on the first invocation that needs it. Callers
    /// arriving while it runs wait for the same run.
    pub fn with_global_fn<F, Fut>(init: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Variables>> + Send + 'static,
    {
        Self::builder().global_fn(init).build()
    }

    /// Start configuring an engine
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Compile a projection
    pub fn create(&self, projection: impl Into<Projection>) -> Projector {
        Projector::new(Arc::new(projection.into()), None, self.shared.clone())
    }

    /// Compile a projection with a projection-level context
    pub fn create_with_context(&self, projection: impl Into<Projection>, context: Variables) -> Projector {
        Projector::new(
            Arc::new(projection.into()),
            Some(Arc::new(context)),
            self.shared.clone(),
        )
    }

    /// Materialized global context
    pub async fn global_context(&self) -> Result<Arc<Variables>> {
        self.shared.global.resolve().await
    }

    /// Whether the global context is available without waiting
    pub fn is_global_ready(&self) -> bool {
        self.shared.global.is_ready()
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    /// Registered transformers, in application order
    pub fn transformers(&self) -> &[ValueTransformer] {
        &self.shared.transformers
    }
}

impl fmt::Debug for ProjectionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectionEngine")
            .field("config", &self.shared.config)
            .field("transformers", &self.shared.transformers.len())
            .field("global_ready", &self.shared.global.is_ready())
            .finish()
    }
}

/// One-time registration of the global context
///
/// Accepts ready variables or a [`GlobalSource::Lazy`] initializer and
/// returns the engine that owns it.
pub fn initialize(source: impl Into<GlobalSource>) -> ProjectionEngine {
    ProjectionEngine::builder().source(source.into()).build()
}

/// Builder for [`ProjectionEngine`]
#[derive(Default)]
pub struct EngineBuilder {
    source: GlobalSource,
    transformers: Vec<ValueTransformer>,
    config: EngineConfig,
}

impl EngineBuilder {
    /// Ready global variables
    pub fn global(self, variables: Variables) -> Self {
        self.source(GlobalSource::Static(variables))
    }

    /// Lazily initialized global variables
    pub fn global_fn<F, Fut>(self, init: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Variables>> + Send + 'static,
    {
        self.source(GlobalSource::lazy(init))
    }

    /// Global context source
    pub fn source(mut self, source: GlobalSource) -> Self {
        self.source = source;
        self
    }

    /// Append a value transformer
    pub fn transformer(mut self, transformer: ValueTransformer) -> Self {
        self.transformers.push(transformer);
        self
    }

    /// Engine configuration
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the engine
    pub fn build(self) -> ProjectionEngine {
        for warning in self.config.validate() {
            log::warn!("{warning}");
        }
        ProjectionEngine {
            shared: Arc::new(EngineShared {
                global: GlobalContext::new(self.source),
                transformers: self.transformers,
                config: self.config,
            }),
        }
    }
}

/// Compiled projection
///
/// A projector is the "marked" callable of a projection: it can be used
/// anywhere a [`Spec`](crate::projection::Spec) or `@if` result is expected
/// and is applied as a nested projection rather than called as a function.
#[derive(Clone)]
pub struct Projector {
    projection: Arc<Projection>,
    context: Option<Arc<Variables>>,
    engine: Arc<EngineShared>,
}

impl Projector {
    pub(crate) fn new(
        projection: Arc<Projection>,
        context: Option<Arc<Variables>>,
        engine: Arc<EngineShared>,
    ) -> Self {
        Self {
            projection,
            context,
            engine,
        }
    }

    /// Source projection
    pub fn projection(&self) -> &Arc<Projection> {
        &self.projection
    }

    /// Projection-level context
    pub fn context(&self) -> Option<&Arc<Variables>> {
        self.context.as_ref()
    }

    /// Marker distinguishing projectors from plain context functions
    pub fn is_projection(&self) -> bool {
        true
    }

    /// Apply the projection to data
    ///
    /// Returns `None` when the data is falsy.
    pub async fn project(&self, data: impl Into<Value>, instance: Option<Variables>) -> Result<Option<Value>> {
        self.invoke(data.into(), instance.map(Arc::new), None).await
    }

    /// Apply the projection as a nested invocation
    pub fn invoke(
        &self,
        data: Value,
        instance: Option<Arc<Variables>>,
        parent: Option<Arc<EvaluationContext>>,
    ) -> BoxFuture<'static, Result<Option<Value>>> {
        let depth = parent.as_ref().map_or(0, |p| p.depth + 1);
        Invocation {
            engine: self.engine.clone(),
            projection: self.projection.clone(),
            projection_context: self.context.clone(),
            instance,
            parent,
            depth,
        }
        .run(data)
    }

    /// Apply the projection and deserialize the result into `T`
    pub async fn project_as<T: DeserializeOwned>(
        &self,
        data: impl Into<Value>,
        instance: Option<Variables>,
    ) -> Result<Option<T>> {
        let Some(result) = self.project(data, instance).await? else {
            return Ok(None);
        };
        serde_json::from_value(result.to_json())
            .map(Some)
            .map_err(|e| ProjectionError::Shape {
                message: e.to_string(),
            })
    }

    /// Apply the projection and return the result as a list
    ///
    /// A single record becomes a one-item list; an absent result an empty one.
    pub async fn project_array(&self, data: impl Into<Value>, instance: Option<Variables>) -> Result<Vec<Value>> {
        Ok(match self.project(data, instance).await? {
            Some(Value::Array(items)) => items,
            Some(single) => vec![single],
            None => Vec::new(),
        })
    }
}

impl fmt::Debug for Projector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Projector")
            .field("projection", &self.projection)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
