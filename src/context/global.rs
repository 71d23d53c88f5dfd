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

//! One-time global context
//!
//! Each engine owns one cell. A lazy source is materialized on first use;
//! callers arriving while the initializer runs wait on the same cell instead
//! of starting their own run. A failed initialization leaves the cell empty.

use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

use super::variables::Variables;
use crate::error::Result;

type Initializer = Arc<dyn Fn() -> BoxFuture<'static, Result<Variables>> + Send + Sync>;

/// Where the global variables come from
#[derive(Clone)]
pub enum GlobalSource {
    /// Variables available immediately
    Static(Variables),
    /// Zero-argument initializer run at most once
    Lazy(Initializer),
}

impl GlobalSource {
    /// Build a lazy source from an async closure
    pub fn lazy<F, Fut>(init: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Variables>> + Send + 'static,
    {
        GlobalSource::Lazy(Arc::new(move || Box::pin(init())))
    }
}

impl Default for GlobalSource {
    fn default() -> Self {
        GlobalSource::Static(Variables::new())
    }
}

impl From<Variables> for GlobalSource {
    fn from(variables: Variables) -> Self {
        GlobalSource::Static(variables)
    }
}

impl fmt::Debug for GlobalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlobalSource::Static(variables) => f.debug_tuple("Static").field(variables).finish(),
            GlobalSource::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

/// Single-flight cell holding the materialized global variables
pub(crate) struct GlobalContext {
    source: GlobalSource,
    cell: OnceCell<Arc<Variables>>,
}

impl GlobalContext {
    pub(crate) fn new(source: GlobalSource) -> Self {
        let cell = match &source {
            GlobalSource::Static(variables) => OnceCell::new_with(Some(Arc::new(variables.clone()))),
            GlobalSource::Lazy(_) => OnceCell::new(),
        };
        Self { source, cell }
    }

    /// Materialized global variables
    pub(crate) async fn resolve(&self) -> Result<Arc<Variables>> {
        let variables = self
            .cell
            .get_or_try_init(|| async {
                match &self.source {
                    GlobalSource::Static(variables) => Ok(Arc::new(variables.clone())),
                    GlobalSource::Lazy(init) => {
                        log::debug!("Materializing global projection context");
                        let variables = init().await.map(Arc::new);
                        if let Ok(ready) = &variables {
                            log::debug!("Global projection context ready ({} variables)", ready.len());
                        }
                        variables
                    }
                }
            })
            .await?;
        Ok(variables.clone())
    }

    /// Whether the global variables are available without waiting
    pub(crate) fn is_ready(&self) -> bool {
        self.cell.initialized()
    }
}
