//! Immutable mapping from analyzer identifier to adapter.

use critic_core::config::AnalyzersConfig;
use critic_core::{AnalyzeRequest, AnalyzeResult, FileInput};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::analyzer::Analyzer;
use crate::error::{AnalyzerError, AnalyzerResult};
use crate::json::JsonAnalyzer;
use crate::kind::AnalyzerKind;
use crate::tool::ToolAnalyzer;

/// Routes a file to the analyzer registered for a kind.
///
/// Built once at startup and shared by handle; holds no per-request state.
#[derive(Clone, Default)]
pub struct AnalyzerRegistry {
    analyzers: BTreeMap<AnalyzerKind, Arc<dyn Analyzer>>,
}

impl AnalyzerRegistry {
    /// Build a registry from explicit adapters. A later adapter for the same
    /// kind replaces an earlier one.
    pub fn new(analyzers: impl IntoIterator<Item = Arc<dyn Analyzer>>) -> Self {
        Self {
            analyzers: analyzers
                .into_iter()
                .map(|analyzer| (analyzer.kind(), analyzer))
                .collect(),
        }
    }

    /// Register every supported analyzer using the configured tool paths.
    pub fn from_config(config: &AnalyzersConfig) -> AnalyzerResult<Self> {
        let json = JsonAnalyzer::new(config.json_schema_path.as_deref())?;

        let mut analyzers: Vec<Arc<dyn Analyzer>> = ToolAnalyzer::all_from_config(config)
            .into_iter()
            .map(|tool| Arc::new(tool) as Arc<dyn Analyzer>)
            .collect();
        analyzers.push(Arc::new(json));

        let registry = Self::new(analyzers);
        tracing::info!(kinds = ?registry.kinds(), "analyzer registry ready");
        Ok(registry)
    }

    /// Registered identifiers in stable order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.analyzers.keys().map(|kind| kind.as_str()).collect()
    }

    /// Look up the analyzer for an identifier.
    pub fn get(&self, kind: &str) -> AnalyzerResult<&Arc<dyn Analyzer>> {
        let parsed: AnalyzerKind = kind.parse()?;
        self.analyzers
            .get(&parsed)
            .ok_or_else(|| AnalyzerError::UnknownAnalyzer(kind.to_string()))
    }

    /// Analyze one file with the analyzer registered for `kind`.
    pub async fn dispatch(&self, kind: &str, file: &FileInput) -> AnalyzerResult<AnalyzeResult> {
        let analyzer = self.get(kind)?;
        Ok(analyzer.analyze_file(&file.path, &file.content).await)
    }

    /// Analyze a batch with the analyzer registered for `kind`.
    pub async fn dispatch_batch(
        &self,
        kind: &str,
        request: &AnalyzeRequest,
    ) -> AnalyzerResult<Vec<AnalyzeResult>> {
        let analyzer = self.get(kind)?;
        Ok(analyzer.analyze_files(request).await)
    }
}

impl std::fmt::Debug for AnalyzerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyzerRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
