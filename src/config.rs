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

//! Engine configuration

/// Configuration for a [`ProjectionEngine`](crate::ProjectionEngine)
///
/// # Examples
///
/// ```rust
/// use octofhir_projection::EngineConfig;
///
/// // Use default configuration
/// let config = EngineConfig::default();
///
/// // Or use builder pattern methods
/// let config = EngineConfig::default()
///     .with_max_recursion_depth(64)
///     .with_parse_string_input(false);
/// assert_eq!(config.max_recursion_depth, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum nesting depth of projection invocations
    ///
    /// Every nested projection, list item and `@if` projection adds one level.
    /// Exceeding the limit fails the whole invocation with
    /// `ProjectionError::RecursionLimit`. Default: 256
    pub max_recursion_depth: usize,

    /// Parse string data as JSON
    ///
    /// When enabled, string input is parsed before projecting and a parse
    /// failure is reported as `ProjectionError::MalformedInput`. When disabled
    /// the string is projected as a primitive. Default: true
    pub parse_string_input: bool,

    /// Log a warning when list data and a positional projection differ in
    /// length. Only the overlapping positions are projected either way.
    /// Default: true
    pub warn_on_length_mismatch: bool,
}

impl EngineConfig {
    /// Create new configuration with all defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum recursion depth
    pub fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    /// Enable or disable JSON parsing of string input
    pub fn with_parse_string_input(mut self, enabled: bool) -> Self {
        self.parse_string_input = enabled;
        self
    }

    /// Enable or disable the length mismatch warning
    pub fn with_length_mismatch_warning(mut self, enabled: bool) -> Self {
        self.warn_on_length_mismatch = enabled;
        self
    }

    /// Shallow nesting, no implicit parsing of string input
    pub fn strict() -> Self {
        Self {
            max_recursion_depth: 64,
            parse_string_input: false,
            warn_on_length_mismatch: true,
        }
    }

    /// Deep nesting and quiet diagnostics
    pub fn lenient() -> Self {
        Self {
            max_recursion_depth: 1024,
            parse_string_input: true,
            warn_on_length_mismatch: false,
        }
    }

    /// Check configuration values and return warnings for questionable settings
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.max_recursion_depth == 0 {
            warnings.push("max_recursion_depth is 0 - only the top level is projected, any nested projection fails".to_string());
        } else if self.max_recursion_depth > 4096 {
            warnings.push(
                "max_recursion_depth is very high (>4096) - deep data may overflow the stack"
                    .to_string(),
            );
        }

        warnings
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_recursion_depth: 256,
            parse_string_input: true,
            warn_on_length_mismatch: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.max_recursion_depth, 256);
        assert!(config.parse_string_input);
        assert!(config.warn_on_length_mismatch);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_builder_pattern() {
        let config = EngineConfig::new()
            .with_max_recursion_depth(10)
            .with_parse_string_input(false)
            .with_length_mismatch_warning(false);

        assert_eq!(config.max_recursion_depth, 10);
        assert!(!config.parse_string_input);
        assert!(!config.warn_on_length_mismatch);
    }

    #[test]
    fn test_presets() {
        assert!(!EngineConfig::strict().parse_string_input);
        assert!(!EngineConfig::lenient().warn_on_length_mismatch);
        assert_eq!(EngineConfig::default().with_max_recursion_depth(0).validate().len(), 1);
    }

    #[test]
    fn test_zero_depth_warning_names_nested_levels() {
        let warnings = EngineConfig::default().with_max_recursion_depth(0).validate();
        assert!(warnings[0].contains("nested projection fails"));
        assert!(!warnings[0].contains("every invocation"));
    }
}
