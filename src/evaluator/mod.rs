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

//! Projection evaluator
//!
//! The evaluator walks a projection against data. [`recursion`] decides
//! between list and record evaluation, [`value`] resolves each key,
//! [`directives`] handles `@if` and `@combine`, [`transform`] and
//! [`interpolation`] post-process resolved values, and [`assembler`] builds
//! the final record.

pub(crate) mod assembler;
pub(crate) mod directives;
pub(crate) mod interpolation;
pub mod reference;
pub(crate) mod recursion;
pub(crate) mod transform;
pub(crate) mod value;

use std::sync::Arc;

use crate::context::{EvaluationContext, Key, Variables};
use crate::engine::EngineShared;
use crate::projection::Projection;

pub use reference::{Alternative, Param, PipeCall, Reference, Target};

/// One application of a projection to one piece of data
pub(crate) struct Invocation {
    pub(crate) engine: Arc<EngineShared>,
    pub(crate) projection: Arc<Projection>,
    pub(crate) projection_context: Option<Arc<Variables>>,
    pub(crate) instance: Option<Arc<Variables>>,
    pub(crate) parent: Option<Arc<EvaluationContext>>,
    pub(crate) depth: usize,
}

impl Invocation {
    /// Invocation of another projection one level down, keeping this
    /// invocation's projection context and instance context
    pub(crate) fn nested(&self, projection: Arc<Projection>, parent: Arc<EvaluationContext>) -> Self {
        Self {
            engine: self.engine.clone(),
            projection,
            projection_context: self.projection_context.clone(),
            instance: self.instance.clone(),
            depth: parent.depth + 1,
            parent: Some(parent),
        }
    }

    /// Context for a value at `key` under `base`, used as the parent of a
    /// nested invocation
    pub(crate) fn parent_for(base: &EvaluationContext, key: Key) -> Arc<EvaluationContext> {
        Arc::new(base.for_key(key))
    }
}
