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

//! Variable reference grammar
//!
//! ```text
//! reference   := "{{" alternative ( "||" alternative )* "}}"
//! alternative := target ( "|" pipe )*
//! pipe        := name ( ":" param )*
//! target      := "..." | literal | path
//! param       := literal | path
//! literal     := '"' chars '"' | digits | "true" | "false"
//! ```
//!
//! Whitespace around every token is ignored. Parsing never fails: anything
//! that is not a literal is treated as a dotted variable path.

use crate::model::Value;

/// Target that resolves to the whole instance context
pub const SPREAD: &str = "...";

/// Parsed `{{ ... }}` reference
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    /// Fallback chain; the first alternative that resolves wins
    pub alternatives: Vec<Alternative>,
}

/// One `||`-separated alternative
#[derive(Debug, Clone, PartialEq)]
pub struct Alternative {
    /// What the alternative reads
    pub target: Target,
    /// Pipes applied left to right to the target's value
    pub pipes: Vec<PipeCall>,
}

/// Source of an alternative's value
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// `...`: the instance context as a record
    Spread,
    /// Quoted string, integer or boolean
    Literal(Value),
    /// Dotted variable path
    Path(String),
}

/// `|name:param:...`
#[derive(Debug, Clone, PartialEq)]
pub struct PipeCall {
    /// Variable holding the pipe function
    pub name: String,
    /// Parameters in declaration order
    pub params: Vec<Param>,
}

/// Pipe parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// Quoted string, integer or boolean
    Literal(Value),
    /// Variable lookup; functions are invoked
    Path(String),
}

impl Reference {
    /// Parse a reference, with or without the surrounding braces
    pub fn parse(source: &str) -> Self {
        let body = source.trim();
        let body = body
            .strip_prefix("{{")
            .and_then(|rest| rest.strip_suffix("}}"))
            .unwrap_or(body);

        Self {
            alternatives: body.split("||").map(Alternative::parse).collect(),
        }
    }
}

impl Alternative {
    fn parse(source: &str) -> Self {
        let mut segments = source.split('|').map(str::trim);
        let target = match segments.next().unwrap_or_default() {
            SPREAD => Target::Spread,
            token => parse_literal(token).map_or_else(|| Target::Path(token.to_string()), Target::Literal),
        };
        let pipes = segments.filter(|s| !s.is_empty()).map(PipeCall::parse).collect();
        Self { target, pipes }
    }
}

impl PipeCall {
    fn parse(source: &str) -> Self {
        let mut parts = source.split(':').map(str::trim);
        let name = parts.next().unwrap_or_default().to_string();
        let params = parts
            .map(|token| parse_literal(token).map_or_else(|| Param::Path(token.to_string()), Param::Literal))
            .collect();
        Self { name, params }
    }
}

/// Quoted string, integer or boolean literal
pub fn parse_literal(token: &str) -> Option<Value> {
    if token.len() >= 3 && token.starts_with('"') && token.ends_with('"') {
        return Some(Value::from(&token[1..token.len() - 1]));
    }
    if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
        return Some(match token.parse::<i64>() {
            Ok(n) => Value::from(n),
            Err(_) => Value::from(token.parse::<f64>().ok()?),
        });
    }
    match token {
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        _ => None,
    }
}
