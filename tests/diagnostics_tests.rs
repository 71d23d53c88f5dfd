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

//! Integration tests for logged diagnostics
//!
//! The logger is process-wide, so this file holds a single test.

use log::{Level, LevelFilter, Log, Metadata, Record};
use octofhir_projection::{EngineConfig, ObjectProjection, Projection, ProjectionEngine};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Mutex;

struct CapturingLogger {
    warnings: Mutex<Vec<String>>,
}

impl CapturingLogger {
    fn take(&self) -> Vec<String> {
        self.warnings.lock().map(|mut w| std::mem::take(&mut *w)).unwrap_or_default()
    }
}

impl Log for CapturingLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Warn
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            if let Ok(mut warnings) = self.warnings.lock() {
                warnings.push(record.args().to_string());
            }
        }
    }

    fn flush(&self) {}
}

static LOGGER: CapturingLogger = CapturingLogger {
    warnings: Mutex::new(Vec::new()),
};

fn pair() -> Projection {
    Projection::from(vec![
        ObjectProjection::new().field("a", "string"),
        ObjectProjection::new().field("b", "string"),
    ])
}

#[tokio::test]
async fn test_length_mismatch_warning_follows_config() {
    log::set_logger(&LOGGER).unwrap();
    log::set_max_level(LevelFilter::Warn);
    let data = json!([{ "a": "x" }, { "b": "y" }, { "c": "z" }]);

    let warning = ProjectionEngine::new().create(pair());
    let result = warning.project(data.clone(), None).await.unwrap().unwrap();
    assert_eq!(result.to_json(), json!([{ "a": "x" }, { "b": "y" }]));
    let warnings = LOGGER.take();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("3 items, 2 projections"));

    let matching = warning
        .project(json!([{ "a": "x" }, { "b": "y" }]), None)
        .await
        .unwrap();
    assert!(matching.is_some());
    assert!(LOGGER.take().is_empty());

    let quiet = ProjectionEngine::builder()
        .config(EngineConfig::default().with_length_mismatch_warning(false))
        .build()
        .create(pair());
    let result = quiet.project(data, None).await.unwrap().unwrap();
    assert_eq!(result.to_json(), json!([{ "a": "x" }, { "b": "y" }]));
    assert!(LOGGER.take().is_empty());
}
