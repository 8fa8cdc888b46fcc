//! The adapter capability shared by every analyzer.

use async_trait::async_trait;
use critic_core::{AnalyzeRequest, AnalyzeResult};

use crate::kind::AnalyzerKind;

/// A backend that analyzes one file at a time.
///
/// Implementations never fail: tool problems are reported through the
/// result's summary.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Which kind of file this analyzer handles.
    fn kind(&self) -> AnalyzerKind;

    /// Analyze a single file.
    async fn analyze_file(&self, path: &str, content: &str) -> AnalyzeResult;

    /// Analyze a batch, preserving request order.
    async fn analyze_files(&self, request: &AnalyzeRequest) -> Vec<AnalyzeResult> {
        let mut results = Vec::with_capacity(request.files.len());
        for file in &request.files {
            results.push(self.analyze_file(&file.path, &file.content).await);
        }
        results
    }
}
