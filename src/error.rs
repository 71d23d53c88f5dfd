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

//! Error types for projection evaluation
//!
//! Every failure surfaces through the result of the top-level projection call.
//! Nothing inside the engine retries; date coercion is the only place that
//! recovers locally (an unparseable date becomes an absent key).

use thiserror::Error;

/// Result type alias for projection operations
pub type Result<T> = std::result::Result<T, ProjectionError>;

/// Errors produced while building or evaluating projections
#[derive(Error, Debug)]
pub enum ProjectionError {
    /// String input could not be parsed as structured data
    #[error("Malformed input: {cause} (value: {value:?})")]
    MalformedInput {
        /// The offending input string
        value: String,
        /// Underlying parser error message
        cause: String,
    },

    /// A `{{value | pipe}}` reference named a pipe that is not in scope
    #[error("Pipe \"{name}\" not found")]
    PipeNotFound {
        /// Name of the missing pipe
        name: String,
    },

    /// A `{{value | pipe}}` reference named a variable that is not a function
    #[error("Pipe \"{name}\" is not a function")]
    PipeNotCallable {
        /// Name of the non-callable variable
        name: String,
    },

    /// A user supplied context function, predicate, combine function,
    /// pipe or global initializer failed
    #[error("Callback failed: {0}")]
    Callback(#[from] anyhow::Error),

    /// Nested projections went deeper than the configured limit
    #[error("Recursion depth {depth} exceeds the configured limit of {limit}")]
    RecursionLimit {
        /// Depth that was reached
        depth: usize,
        /// Configured maximum
        limit: usize,
    },

    /// A projected result could not be converted into the requested shape
    #[error("Shape error: {message}")]
    Shape {
        /// Human-readable conversion error
        message: String,
    },

    /// A projection document could not be turned into a projection
    #[error("Invalid projection: {message}")]
    InvalidProjection {
        /// Human-readable error message
        message: String,
    },
}

impl ProjectionError {
    /// Create a callback error from a message
    pub fn callback(message: impl std::fmt::Display) -> Self {
        Self::Callback(anyhow::anyhow!("{message}"))
    }

    /// Create a malformed input error
    pub fn malformed_input(value: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::MalformedInput {
            value: value.into(),
            cause: cause.to_string(),
        }
    }

    /// Create an invalid projection error
    pub fn invalid_projection(message: impl Into<String>) -> Self {
        Self::InvalidProjection {
            message: message.into(),
        }
    }

    /// Whether this error came from user code rather than the engine
    pub fn is_callback(&self) -> bool {
        matches!(self, Self::Callback(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipe_errors_name_the_pipe() {
        let missing = ProjectionError::PipeNotFound {
            name: "uppercase".to_string(),
        };
        assert_eq!(missing.to_string(), "Pipe \"uppercase\" not found");

        let wrong_kind = ProjectionError::PipeNotCallable {
            name: "title".to_string(),
        };
        assert_eq!(wrong_kind.to_string(), "Pipe \"title\" is not a function");
    }

    #[test]
    fn test_malformed_input_keeps_value_and_cause() {
        let err = ProjectionError::malformed_input("{oops", "key must be a string");
        match &err {
            ProjectionError::MalformedInput { value, cause } => {
                assert_eq!(value, "{oops");
                assert_eq!(cause, "key must be a string");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("{oops"));
    }

    #[test]
    fn test_callback_from_anyhow() {
        let err: ProjectionError = anyhow::anyhow!("boom").into();
        assert!(err.is_callback());
        assert_eq!(err.to_string(), "Callback failed: boom");
        assert!(ProjectionError::callback("bad").is_callback());
    }
}
