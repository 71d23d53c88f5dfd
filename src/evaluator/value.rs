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

//! Per-key value resolution

use futures::future::try_join_all;
use std::sync::Arc;

use super::{Invocation, assembler, interpolation, transform};
use crate::context::{EvaluationContext, Key};
use crate::error::Result;
use crate::function::Computed;
use crate::model::{Value, to_date};
use crate::projection::{ObjectProjection, Spec, TypeTag};

impl Invocation {
    /// Evaluate every key and directive of an object projection against one
    /// record. All of them start together; the output keeps declaration order.
    pub(crate) async fn evaluate_record(
        &self,
        base: &EvaluationContext,
        object: &ObjectProjection,
    ) -> Result<Value> {
        let fields = try_join_all(
            object
                .fields()
                .map(|(key, spec)| self.evaluate_field(base.for_key(Key::Field(key.to_string())), spec)),
        );
        let directives = try_join_all(
            object
                .directives()
                .iter()
                .map(|directive| self.evaluate_directive(base, directive)),
        );

        let (values, contributions) = futures::try_join!(fields, directives)?;
        let entries = object.fields().map(|(key, _)| key).zip(values);
        Ok(assembler::assemble(entries, contributions))
    }

    /// Resolve one key: raw value, then transformers and interpolation.
    /// `None` means the key is absent from the output.
    pub(crate) async fn evaluate_field(&self, context: EvaluationContext, spec: &Spec) -> Result<Option<Value>> {
        let raw = match self.raw_value(&context, spec).await? {
            Some(raw) if !raw.is_null() => raw,
            _ => return Ok(None),
        };
        if raw.is_projection_output() || matches!(spec, Spec::Nested(_) | Spec::Project(_)) {
            return Ok(Some(raw));
        }

        let Some(value) = transform::apply(&self.engine.transformers, &context, raw).await? else {
            return Ok(None);
        };
        if value.is_projection_output() {
            return Ok(Some(value));
        }

        let value = interpolation::interpolate(&context, value).await?;
        Ok(value.filter(|v| !v.is_null()))
    }

    async fn raw_value(&self, context: &EvaluationContext, spec: &Spec) -> Result<Option<Value>> {
        let current = || context.current().cloned();

        let raw = match spec {
            Spec::Type(TypeTag::Date) => context.current().and_then(to_date).map(Value::Date),
            Spec::Passthrough | Spec::Type(_) => current(),
            Spec::Project(projector) => {
                projector
                    .invoke(
                        current().unwrap_or_default(),
                        self.instance.clone(),
                        Some(Arc::new(context.clone())),
                    )
                    .await?
            }
            Spec::Function(func) => match func.call(context.clone()).await? {
                Computed::Value(value) => Some(value),
                Computed::Absent => None,
                Computed::Inherit => current(),
                Computed::Apply(projector) => {
                    projector
                        .invoke(
                            current().unwrap_or_default(),
                            self.instance.clone(),
                            Some(Arc::new(context.clone())),
                        )
                        .await?
                }
            },
            Spec::Deferred(deferred) => Some(deferred.resolve().await),
            Spec::Nested(projection) => match current() {
                Some(data) if data.is_truthy() => {
                    self.nested(projection.clone(), Arc::new(context.clone()))
                        .run(data)
                        .await?
                }
                _ => None,
            },
            Spec::Literal(value) => value.is_truthy().then(|| value.clone()),
        };
        Ok(raw)
    }
}
