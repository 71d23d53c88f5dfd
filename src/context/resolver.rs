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

//! Layered scope merging

use super::evaluation::EvaluationContext;
use super::variables::Variables;
use crate::model::Value;

/// Name under which the data at the current level is exposed
pub const CURRENT: &str = "current";

/// Name under which the layer of the enclosing level's own parent is exposed
pub const PARENT_CONTEXT: &str = "parentContext";

/// Merges the context layers into one flat lookup scope
///
/// Layers are applied lowest precedence first: `current`, global, projection,
/// instance, then the parent layer. A later layer replaces earlier entries
/// with the same name.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextResolver;

impl ContextResolver {
    /// Build the merged scope for one evaluation level
    pub fn resolve(
        current: &Value,
        global: &Variables,
        projection: Option<&Variables>,
        instance: Option<&Variables>,
        parent: Option<&EvaluationContext>,
    ) -> Variables {
        let mut merged = Variables::new().with(CURRENT, current.clone());
        merged.extend(global);
        if let Some(projection) = projection {
            merged.extend(projection);
        }
        if let Some(instance) = instance {
            merged.extend(instance);
        }
        if let Some(parent) = parent {
            merged.extend(&Self::parent_layer(parent));
        }
        merged
    }

    /// Variables contributed by the enclosing level: its data, the key that
    /// led here and, as `parentContext`, the same layer one level further up
    fn parent_layer(parent: &EvaluationContext) -> Variables {
        let mut layer = Variables::new()
            .with("data", parent.data.as_ref().clone())
            .with("key", parent.key.to_value());
        if let Some(grandparent) = &parent.parent {
            layer.insert(PARENT_CONTEXT, Self::parent_layer(grandparent));
        }
        layer
    }
}
