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

//! Declarative object projection in Rust
//!
//! A projection describes the shape of the output: which keys to keep, which
//! to compute, which nested records to project, and which strings carry
//! `{{ variable }}` references. The engine applies it to arbitrary data
//! asynchronously, merging global, projection, instance and parent context
//! layers for every level it walks.

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod function;
pub mod model;
pub mod projection;

pub use config::EngineConfig;
pub use context::{ContextResolver, EvaluationContext, GlobalSource, Key, Variable, Variables};
pub use engine::{EngineBuilder, ProjectionEngine, Projector, ValueTransformer, initialize};
pub use error::{ProjectionError, Result};
pub use function::{Computed, ContextFn, ContextFunction, Deferred, INHERIT, Predicate};
pub use model::{ProjectedRecord, Record, Value, to_date};
pub use projection::{
    Condition, Directive, ObjectProjection, Projection, Spec, Then, TypeTag, condition, optional, typed,
};
