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

//! Engine-level value transformers

use std::sync::Arc;

use crate::context::EvaluationContext;
use crate::engine::ValueTransformer;
use crate::error::Result;
use crate::function::Computed;
use crate::model::Value;

/// Run the transformers in registration order, each seeing the previous
/// output. `None` means a transformer dropped the value.
pub(crate) async fn apply(
    transformers: &[ValueTransformer],
    context: &EvaluationContext,
    value: Value,
) -> Result<Option<Value>> {
    let mut current = value;
    for transformer in transformers {
        let scoped = context.with_data(current.clone(), None);
        if !transformer.when.test(scoped.clone()).await? {
            continue;
        }
        log::debug!("Transformer {} applies to {}", transformer.name, context.key);

        current = match transformer.then.call(scoped.clone()).await? {
            Computed::Value(value) => value,
            Computed::Inherit => current,
            Computed::Absent => return Ok(None),
            Computed::Apply(projector) => {
                let projected = projector
                    .invoke(current, context.instance_context.clone(), Some(Arc::new(scoped)))
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
