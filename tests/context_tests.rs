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

//! Integration tests for context layers seen by context functions

use octofhir_projection::{ContextFn, EvaluationContext, Key, ObjectProjection, ProjectionEngine, Value, Variables};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::{Arc, Mutex};

fn instance_value(ctx: &EvaluationContext, name: &str) -> Option<Value> {
    ctx.instance(name).and_then(|v| v.as_value().cloned())
}

#[tokio::test]
async fn test_functions_see_every_context_layer() {
    let engine = ProjectionEngine::with_global(
        Variables::new()
            .with("symbol", "!!!")
            .with("globalValue", "global value"),
    );

    let projector = engine.create_with_context(
        ObjectProjection::new()
            .field("value", "string")
            .field("info", "string")
            .field(
                "customContextValue",
                ContextFn::sync(|ctx| Ok(instance_value(&ctx, "customContext"))),
            )
            .field(
                "message",
                ContextFn::sync(|ctx| {
                    let show = |name: &str| ctx.value_of(name).map(|v| v.to_display_string()).unwrap_or_default();
                    Ok(format!(
                        "Title: {}\nDescription: {}\nCustom Context: {}",
                        show("title"),
                        show("description"),
                        show("customContext")
                    ))
                }),
            )
            .field("globalValue", ContextFn::sync(|ctx| Ok(ctx.value_of("globalValue")))),
        Variables::new().with("description", "This is a test"),
    );

    let instance = Variables::new()
        .with("title", "Hello World")
        .with("customContext", "custom context value");

    let result = projector
        .project(
            json!({ "value": "{{title}}{{symbol}}", "info": "{{description}}" }),
            Some(instance),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        result.to_json(),
        json!({
            "value": "Hello World!!!",
            "info": "This is a test",
            "customContextValue": "custom context value",
            "message": "Title: Hello World\nDescription: This is a test\nCustom Context: custom context value",
            "globalValue": "global value"
        })
    );
}

#[tokio::test]
async fn test_child_projector_sees_instance_context() {
    let engine = ProjectionEngine::new();
    let inner = engine.create(
        ObjectProjection::new()
            .field("title", "string")
            .field(
                "contextValue",
                ContextFn::sync(|ctx| Ok(instance_value(&ctx, "customContext"))),
            ),
    );
    let outer = engine.create(
        ObjectProjection::new()
            .field("value", "string")
            .field("innerValue", inner),
    );

    let result = outer
        .project(
            json!({ "value": "Hello world!!!", "innerValue": { "title": "Inner Title" } }),
            Some(Variables::new().with("customContext", "custom context value")),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        result.to_json(),
        json!({
            "value": "Hello world!!!",
            "innerValue": { "title": "Inner Title", "contextValue": "custom context value" }
        })
    );
}

#[tokio::test]
async fn test_nested_levels_expose_parent_and_current() {
    let seen: Arc<Mutex<Vec<(String, usize)>>> = Arc::default();
    let recorder = seen.clone();

    let projection = ObjectProjection::new().field(
        "address",
        ObjectProjection::new()
            .field("city", "string")
            .field("owner", "{{data.name}} in {{current.city}}")
            .field(
                "via",
                ContextFn::sync(move |ctx| {
                    let parent_key = ctx
                        .parent
                        .as_ref()
                        .map(|parent| parent.key.to_string())
                        .unwrap_or_default();
                    if let Ok(mut seen) = recorder.lock() {
                        seen.push((parent_key.clone(), ctx.depth()));
                    }
                    Ok(matches!(ctx.key, Key::Field(ref name) if name == "via").then_some(parent_key))
                }),
            ),
    );

    let result = ProjectionEngine::new()
        .create(projection)
        .project(json!({ "name": "Ada", "address": { "city": "London" } }), None)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        result.to_json(),
        json!({ "address": { "city": "London", "owner": "Ada in London", "via": "address" } })
    );
    assert_eq!(seen.lock().unwrap().clone(), vec![("address".to_string(), 1)]);
}

#[tokio::test]
async fn test_projection_context_is_fixed_per_projector() {
    let engine = ProjectionEngine::new();
    let projection = ObjectProjection::new().field("greeting", "{{salutation}}, {{name}}");

    let formal = engine.create_with_context(projection.clone(), Variables::new().with("salutation", "Good day"));
    let casual = engine.create_with_context(projection, Variables::new().with("salutation", "Hi"));
    let data = json!({ "x": 1 });
    let instance = Variables::new().with("name", "Ada");

    let formal = formal.project(data.clone(), Some(instance.clone())).await.unwrap().unwrap();
    let casual = casual.project(data, Some(instance)).await.unwrap().unwrap();

    assert_eq!(formal.to_json(), json!({ "greeting": "Good day, Ada" }));
    assert_eq!(casual.to_json(), json!({ "greeting": "Hi, Ada" }));
}

#[tokio::test]
async fn test_grandparent_data_through_parent_context() {
    let projection = ObjectProjection::new().field(
        "a",
        ObjectProjection::new().field(
            "b",
            ObjectProjection::new()
                .field("name", "string")
                .field("top", "{{parentContext.data.top || \"none\"}}")
                .field("via", "{{parentContext.key}}/{{key}}"),
        ),
    );

    let result = ProjectionEngine::new()
        .create(projection)
        .project(json!({ "top": "T", "a": { "b": { "name": "leaf" } } }), None)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        result.to_json(),
        json!({ "a": { "b": { "name": "leaf", "top": "T", "via": "a/b" } } })
    );
}
