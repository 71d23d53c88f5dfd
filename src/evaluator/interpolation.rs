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

//! `{{ reference }}` substitution in resolved values
//!
//! A string that is exactly one reference becomes the referenced value
//! itself. References embedded in longer strings are replaced left to right
//! by their display form, with `undefined` for references that resolve to
//! nothing. Plain records and arrays are walked recursively; projected
//! records and dates are never touched.

use futures::future::{BoxFuture, FutureExt, try_join_all};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use super::reference::{Alternative, Param, PipeCall, Reference, Target};
use crate::context::{EvaluationContext, Variable};
use crate::error::{ProjectionError, Result};
use crate::function::{Computed, ContextFn};
use crate::model::{Record, Value};

static REFERENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{[^}]+\}\}").expect("valid regex"));
static WHOLE_REFERENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\{\{[^}]+\}\}$").expect("valid regex"));

/// Text used for references that resolve to nothing
const UNDEFINED: &str = "undefined";

/// Substitute references inside `value`. `None` means the value resolved to
/// nothing.
pub(crate) fn interpolate<'a>(context: &'a EvaluationContext, value: Value) -> BoxFuture<'a, Result<Option<Value>>> {
    async move {
        match value {
            Value::String(text) => interpolate_string(context, text).await,
            Value::Array(items) => {
                let mut resolved = Vec::with_capacity(items.len());
                for item in items {
                    resolved.push(interpolate(context, item).await?.unwrap_or_default());
                }
                Ok(Some(Value::Array(resolved)))
            }
            Value::Object(record) => {
                let mut resolved = Record::with_capacity(record.len());
                for (key, item) in record {
                    if let Some(item) = interpolate(context, item).await? {
                        resolved.insert(key, item);
                    }
                }
                Ok(Some(Value::Object(resolved)))
            }
            other => Ok(Some(other)),
        }
    }
    .boxed()
}

async fn interpolate_string(context: &EvaluationContext, text: String) -> Result<Option<Value>> {
    if !REFERENCE.is_match(&text) {
        return Ok(Some(Value::String(text)));
    }
    if WHOLE_REFERENCE.is_match(&text) {
        return resolve(context, &Reference::parse(&text)).await;
    }

    let references: Vec<&str> = REFERENCE.find_iter(&text).map(|found| found.as_str()).collect();
    let mut result = text.clone();
    for reference in references {
        let replacement = match resolve(context, &Reference::parse(reference)).await? {
            Some(value) => value.to_display_string(),
            None => UNDEFINED.to_string(),
        };
        result = result.replacen(reference, &replacement, 1);
    }
    Ok(Some(Value::String(result)))
}

/// Resolve a parsed reference: the first alternative yielding a value wins
pub(crate) async fn resolve(context: &EvaluationContext, reference: &Reference) -> Result<Option<Value>> {
    for alternative in &reference.alternatives {
        if let Some(value) = resolve_target(context, alternative).await? {
            return apply_pipes(context, value, &alternative.pipes).await;
        }
    }
    Ok(None)
}

async fn resolve_target(context: &EvaluationContext, alternative: &Alternative) -> Result<Option<Value>> {
    match &alternative.target {
        Target::Spread => Ok(context.instance_context.as_ref().map(|instance| instance.to_value())),
        Target::Literal(value) => Ok(Some(value.clone())),
        Target::Path(path) => match context.variable(path) {
            None => Ok(None),
            Some(Variable::Value(value)) => Ok(Some(value)),
            Some(Variable::Scope(scope)) => Ok(Some(scope.to_value())),
            Some(Variable::Deferred(deferred)) => Ok(Some(deferred.resolve().await)),
            Some(Variable::Function(func)) => {
                let value = call_for_value(context, &func).await?;
                Ok(value.filter(Value::is_truthy))
            }
        },
    }
}

async fn apply_pipes(context: &EvaluationContext, value: Value, pipes: &[PipeCall]) -> Result<Option<Value>> {
    let mut current = value;
    for call in pipes {
        let pipe = lookup_pipe(context, &call.name)?;
        let params = try_join_all(call.params.iter().map(|param| resolve_param(context, param))).await?;
        let params = (!params.is_empty()).then_some(params);

        current = match pipe.call(context.with_data(current.clone(), params)).await? {
            Computed::Value(value) => value,
            Computed::Inherit => current,
            Computed::Absent => return Ok(None),
            Computed::Apply(projector) => {
                let projected = projector
                    .invoke(
                        current,
                        context.instance_context.clone(),
                        Some(Arc::new(context.clone())),
                    )
                    .await?;
                match projected {
                    Some(value) => value,
                    None => return Ok(None),
                }
            }
        };
    }
    Ok(Some(current))
}

fn lookup_pipe(context: &EvaluationContext, name: &str) -> Result<ContextFn> {
    match context.variable(name) {
        Some(Variable::Function(func)) => Ok(func),
        None => Err(ProjectionError::PipeNotFound { name: name.to_string() }),
        Some(Variable::Value(value)) if !value.is_truthy() => {
            Err(ProjectionError::PipeNotFound { name: name.to_string() })
        }
        Some(_) => Err(ProjectionError::PipeNotCallable { name: name.to_string() }),
    }
}

async fn resolve_param(context: &EvaluationContext, param: &Param) -> Result<Value> {
    let value = match param {
        Param::Literal(value) => value.clone(),
        Param::Path(path) => match context.variable(path) {
            None => Value::Null,
            Some(Variable::Value(value)) => value,
            Some(Variable::Scope(scope)) => scope.to_value(),
            Some(Variable::Deferred(deferred)) => deferred.resolve().await,
            Some(Variable::Function(func)) => call_for_value(context, &func).await?.unwrap_or_default(),
        },
    };
    Ok(value)
}

/// Call a function variable and turn its result into a value
async fn call_for_value(context: &EvaluationContext, func: &ContextFn) -> Result<Option<Value>> {
    let value = match func.call(context.clone()).await? {
        Computed::Value(value) => Some(value),
        Computed::Absent => None,
        Computed::Inherit => context.current().cloned(),
        Computed::Apply(projector) => {
            projector
                .invoke(
                    context.current().cloned().unwrap_or_default(),
                    context.instance_context.clone(),
                    Some(Arc::new(context.clone())),
                )
                .await?
        }
    };
    Ok(value)
}
