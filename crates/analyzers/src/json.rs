//! In-process JSON document checker.

use async_trait::async_trait;
use critic_core::AnalyzeResult;
use jsonschema::{Draft, JSONSchema};
use serde_json::Value;
use std::path::Path;

use crate::analyzer::Analyzer;
use crate::error::{AnalyzerError, AnalyzerResult};
use crate::kind::AnalyzerKind;

pub const SUMMARY_INVALID_SYNTAX: &str = "Invalid JSON syntax";
pub const SUMMARY_VALIDATION_ISSUES: &str = "JSON validation issues found";

/// Schema violations are not tied to a position in the source text.
const VIOLATION_LINE: u32 = 1;

/// Checks JSON syntax and, optionally, conformance to a JSON Schema.
pub struct JsonAnalyzer {
    compiled: JSONSchema,
}

impl JsonAnalyzer {
    /// Build an analyzer, loading the schema from `schema_path` when given.
    /// Without a schema every well-formed document passes.
    pub fn new(schema_path: Option<&Path>) -> AnalyzerResult<Self> {
        let schema = match schema_path {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                serde_json::from_str(&content).map_err(|e| {
                    AnalyzerError::InvalidSchema(format!("{}: {e}", path.display()))
                })?
            }
            None => serde_json::json!({}),
        };
        Self::with_schema(&schema)
    }

    /// Build an analyzer validating against an in-memory schema.
    pub fn with_schema(schema: &Value) -> AnalyzerResult<Self> {
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(schema)
            .map_err(|e| AnalyzerError::InvalidSchema(e.to_string()))?;
        Ok(Self { compiled })
    }
}

#[async_trait]
impl Analyzer for JsonAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Json
    }

    async fn analyze_file(&self, path: &str, content: &str) -> AnalyzeResult {
        if !AnalyzerKind::Json.accepts(path) {
            return AnalyzeResult::with_summary(path, AnalyzerKind::Json.mismatch_summary());
        }

        let document: Value = match serde_json::from_str(content) {
            Ok(value) => value,
            Err(e) => {
                // Anchor at the last line; the parser position is not reliable
                // for truncated input.
                let last_line = u32::try_from(content.split('\n').count()).unwrap_or(u32::MAX);
                let mut result = AnalyzeResult::with_summary(path, SUMMARY_INVALID_SYNTAX);
                result.push(last_line, e.to_string());
                return result;
            }
        };

        let violations: Vec<String> = match self.compiled.validate(&document) {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .map(|e| {
                    let at = e.instance_path.to_string();
                    if at.is_empty() {
                        e.to_string()
                    } else {
                        format!("{e} at {at}")
                    }
                })
                .collect(),
        };

        if violations.is_empty() {
            return AnalyzeResult::ok(path);
        }

        let mut result = AnalyzeResult::with_summary(path, SUMMARY_VALIDATION_ISSUES);
        for violation in violations {
            result.push(VIOLATION_LINE, violation);
        }
        result
    }
}
