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

//! Record vs. list dispatch
//!
//! List data whose items are all structured (or any list under an `@array`
//! projection) fans out one nested invocation per item. Positional list
//! projections pair items with slots by index; object projections are
//! broadcast to every structured item, so primitives in an `@array` list are
//! skipped. Everything else is evaluated as one record.

use futures::future::{BoxFuture, FutureExt, try_join_all};
use std::sync::Arc;

use super::Invocation;
use crate::context::{ContextResolver, EvaluationContext, Key};
use crate::error::{ProjectionError, Result};
use crate::model::Value;
use crate::projection::{Projection, Spec};

impl Invocation {
    /// Apply the projection to `data`
    pub(crate) fn run(self, data: Value) -> BoxFuture<'static, Result<Option<Value>>> {
        async move { self.evaluate(data).await }.boxed()
    }

    async fn evaluate(&self, data: Value) -> Result<Option<Value>> {
        if !data.is_truthy() {
            return Ok(None);
        }

        let limit = self.engine.config.max_recursion_depth;
        if self.depth > limit {
            return Err(ProjectionError::RecursionLimit {
                depth: self.depth,
                limit,
            });
        }

        let data = match data {
            Value::String(raw) if self.engine.config.parse_string_input => Value::from_json_str(&raw)?,
            other => other,
        };
        if !data.is_truthy() {
            return Ok(None);
        }

        let data = Arc::new(data);
        let base = self.base_context(data.clone()).await?;

        if let Some(items) = data.as_array() {
            if self.projection.is_array() || items.iter().all(is_structured) {
                return self.evaluate_list(&base, items).await.map(Some);
            }
        }

        match self.projection.as_ref() {
            Projection::Object(object) => self.evaluate_record(&base, object).await.map(Some),
            Projection::List(slots) => self.evaluate_slots(&base, slots).await.map(Some),
        }
    }

    /// Merged scope and evaluation context for this level
    async fn base_context(&self, data: Arc<Value>) -> Result<EvaluationContext> {
        let global = self.engine.global.resolve().await?;
        let variables = ContextResolver::resolve(
            &data,
            &global,
            self.projection_context.as_deref(),
            self.instance.as_deref(),
            self.parent.as_deref(),
        );
        Ok(EvaluationContext::new(
            Arc::new(variables),
            data,
            self.projection.clone(),
            self.projection_context.clone(),
            self.instance.clone(),
            self.parent.clone(),
            self.depth,
        ))
    }

    /// Positional or broadcast projection of list items
    async fn evaluate_list(&self, base: &EvaluationContext, items: &[Value]) -> Result<Value> {
        let invocations: Vec<_> = match self.projection.as_ref() {
            Projection::List(slots) => {
                if items.len() != slots.len() && self.engine.config.warn_on_length_mismatch {
                    log::warn!(
                        "Data and projection length do not match ({} items, {} projections)",
                        items.len(),
                        slots.len()
                    );
                }
                items
                    .iter()
                    .zip(slots)
                    .enumerate()
                    .map(|(index, (item, slot))| {
                        let parent = Self::parent_for(base, Key::Index(index));
                        self.nested(slot.clone(), parent).run(item.clone())
                    })
                    .collect()
            }
            Projection::Object(_) => items
                .iter()
                .enumerate()
                .filter(|(_, item)| is_structured(item))
                .map(|(index, item)| {
                    let parent = Self::parent_for(base, Key::Index(index));
                    self.nested(self.projection.clone(), parent).run(item.clone())
                })
                .collect(),
        };

        let results = try_join_all(invocations).await?;
        Ok(Value::Array(
            results
                .into_iter()
                .flatten()
                .filter(|value| !value.is_null())
                .collect(),
        ))
    }

    /// List projection against non-list data: slot `i` is applied to `data[i]`
    async fn evaluate_slots(&self, base: &EvaluationContext, slots: &[Arc<Projection>]) -> Result<Value> {
        let specs: Vec<(String, Spec)> = slots
            .iter()
            .enumerate()
            .map(|(index, slot)| (index.to_string(), Spec::Nested(slot.clone())))
            .collect();

        let values = try_join_all(
            specs
                .iter()
                .map(|(key, spec)| self.evaluate_field(base.for_key(Key::Field(key.clone())), spec)),
        )
        .await?;

        Ok(Value::Array(values.into_iter().flatten().collect()))
    }
}

fn is_structured(item: &Value) -> bool {
    matches!(
        item,
        Value::Object(_) | Value::Projected(_) | Value::Array(_) | Value::Date(_)
    )
}
