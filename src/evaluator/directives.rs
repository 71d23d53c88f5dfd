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

//! `@if` and `@combine` handling
//!
//! `@array` is structural and handled by the recursion step. Every `@if` item
//! is tested concurrently and all matching items contribute, so several
//! items may write the same key; the later item wins when assembled.

use futures::future::try_join_all;
use std::sync::Arc;

use super::Invocation;
use super::assembler::{Contribution, entries_of};
use crate::context::{EvaluationContext, Key};
use crate::error::Result;
use crate::function::Computed;
use crate::projection::{Condition, Directive, Then};

impl Invocation {
    /// Entries contributed by one directive
    pub(crate) async fn evaluate_directive(
        &self,
        base: &EvaluationContext,
        directive: &Directive,
    ) -> Result<Contribution> {
        let context = base.for_key(Key::Field(directive.key()));
        match directive {
            Directive::Array => Ok(Vec::new()),
            Directive::If(items) => {
                let contributions =
                    try_join_all(items.iter().map(|item| self.evaluate_condition(&context, item))).await?;
                Ok(contributions.into_iter().flatten().collect())
            }
            Directive::Combine { func, .. } => {
                let result = func.call(context.clone()).await?;
                let entries = self
                    .computed_entries(&context, result)
                    .await?
                    .unwrap_or_default();
                log::debug!("{} contributed {} entries", directive.key(), entries.len());
                Ok(entries)
            }
        }
    }

    async fn evaluate_condition(&self, context: &EvaluationContext, item: &Condition) -> Result<Contribution> {
        if !item.when.test(context.clone()).await? {
            return Ok(Vec::new());
        }

        let data = context.data.as_ref().clone();
        let parent = Arc::new(context.clone());
        let result = match &item.then {
            Then::Project(projector) => projector.invoke(data, self.instance.clone(), Some(parent)).await?,
            Then::Inline(projection) => self.nested(projection.clone(), parent).run(data).await?,
            Then::Compute(func) => {
                let computed = func.call(context.clone()).await?;
                return Ok(self.computed_entries(context, computed).await?.unwrap_or_default());
            }
        };
        Ok(result.map(entries_of).unwrap_or_default())
    }

    /// Entries of a function result. Falsy results contribute nothing; a
    /// returned projector is applied to the full current data.
    async fn computed_entries(
        &self,
        context: &EvaluationContext,
        computed: Computed,
    ) -> Result<Option<Contribution>> {
        let value = match computed {
            Computed::Value(value) => Some(value),
            Computed::Absent | Computed::Inherit => None,
            Computed::Apply(projector) => {
                projector
                    .invoke(
                        context.data.as_ref().clone(),
                        self.instance.clone(),
                        Some(Arc::new(context.clone())),
                    )
                    .await?
            }
        };
        Ok(value.filter(|v| v.is_truthy()).map(entries_of))
    }
}
