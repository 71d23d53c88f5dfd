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

//! Execution context for projections
//!
//! Variables reach a projection through four layers, merged per evaluation
//! level by [`ContextResolver`]: the engine's global context, the context
//! fixed when a projection is created, the instance context of a top-level
//! call, and the parent layer threaded down by nested projections.

pub mod evaluation;
pub mod global;
pub mod resolver;
pub mod variables;

pub use evaluation::{EvaluationContext, Key};
pub use global::GlobalSource;
pub(crate) use global::GlobalContext;
pub use resolver::{CURRENT, ContextResolver, PARENT_CONTEXT};
pub use variables::{Variable, Variables};
