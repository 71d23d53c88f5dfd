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

//! Integration tests for global context initialization

use futures::future::join_all;
use octofhir_projection::{
    GlobalSource, ObjectProjection, ProjectionEngine, ProjectionError, Variables, initialize,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn value_projection() -> ObjectProjection {
    ObjectProjection::new().field("value", "{{variableTitle}}")
}

fn counting_engine(counter: Arc<AtomicUsize>) -> ProjectionEngine {
    ProjectionEngine::with_global_fn(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(Variables::new().with("variableTitle", "variable title"))
        }
    })
}

#[tokio::test]
async fn test_empty_static_and_lazy_sources() {
    let empty = ProjectionEngine::new().create(value_projection());
    assert_eq!(
        empty.project(json!({}), None).await.unwrap().map(|v| v.to_json()),
        Some(json!({}))
    );

    let lazy = ProjectionEngine::with_global_fn(|| async {
        Ok(Variables::new().with("variableTitle", "variable title"))
    })
    .create(value_projection());
    assert_eq!(
        lazy.project(json!({}), None).await.unwrap().map(|v| v.to_json()),
        Some(json!({ "value": "variable title" }))
    );

    let ready = initialize(Variables::new().with("variableTitle", "variable title")).create(value_projection());
    assert_eq!(
        ready.project(json!({}), None).await.unwrap().map(|v| v.to_json()),
        Some(json!({ "value": "variable title" }))
    );
}

#[tokio::test]
async fn test_concurrent_invocations_initialize_once() {
    let counter = Arc::new(AtomicUsize::new(0));
    let engine = counting_engine(counter.clone());
    let projector = engine.create(value_projection());

    assert!(!engine.is_global_ready());
    let results = join_all((0..5).map(|_| projector.project(json!({}), None))).await;

    assert_eq!(results.len(), 5);
    for result in results {
        assert_eq!(
            result.unwrap().map(|v| v.to_json()),
            Some(json!({ "value": "variable title" }))
        );
    }
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert!(engine.is_global_ready());
}

#[tokio::test]
async fn test_sequential_invocations_initialize_once() {
    let counter = Arc::new(AtomicUsize::new(0));
    let engine = counting_engine(counter.clone());
    let projector = engine.create(value_projection());

    for _ in 0..5 {
        projector.project(json!({}), None).await.unwrap();
    }
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_projectors_share_the_engine_global() {
    let counter = Arc::new(AtomicUsize::new(0));
    let engine = counting_engine(counter.clone());

    let first = engine.create(value_projection());
    let second = engine.create(ObjectProjection::new().field("other", "{{variableTitle}}!"));

    let (a, b) = tokio::join!(first.project(json!({}), None), second.project(json!({}), None));
    assert_eq!(a.unwrap().map(|v| v.to_json()), Some(json!({ "value": "variable title" })));
    assert_eq!(b.unwrap().map(|v| v.to_json()), Some(json!({ "other": "variable title!" })));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_initialization_propagates() {
    let engine = initialize(GlobalSource::lazy(|| async {
        Err(ProjectionError::callback("config service unavailable"))
    }));
    let projector = engine.create(value_projection());

    let error = projector.project(json!({}), None).await.unwrap_err();
    assert!(error.is_callback());
    assert!(error.to_string().contains("config service unavailable"));
    assert!(!engine.is_global_ready());
}

#[tokio::test]
async fn test_global_context_accessor() {
    let engine = ProjectionEngine::with_global(Variables::new().with("symbol", "!!!"));
    assert!(engine.is_global_ready());

    let global = engine.global_context().await.unwrap();
    assert_eq!(
        global.get("symbol").and_then(|v| v.as_value()).map(|v| v.to_json()),
        Some(json!("!!!"))
    );
}
