//! Canonical analysis result shared by every analyzer.

use serde::{Deserialize, Serialize};

/// Summary reported when no findings were recorded.
pub const SUMMARY_OK: &str = "OK";

/// Summary reported once the first finding is recorded.
pub const SUMMARY_ISSUES: &str = "Issues found";

/// A single file submitted for analysis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInput {
    pub path: String,
    pub content: String,
}

impl FileInput {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// An ordered batch of files submitted for analysis.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub files: Vec<FileInput>,
}

/// A finding anchored to a line of the analyzed file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineComment {
    /// 1-based line number, or [`LineComment::UNKNOWN_LINE`] when the tool
    /// reported none.
    pub line: u32,
    pub comment: String,
}

impl LineComment {
    pub const UNKNOWN_LINE: u32 = 0;
}

/// Per-file analysis outcome, identical in shape for every analyzer.
///
/// The summary starts as [`SUMMARY_OK`] and becomes [`SUMMARY_ISSUES`] when
/// the first comment is pushed. A result holding comments never reports
/// [`SUMMARY_OK`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeResult {
    path: String,
    summary_comment: String,
    line_comments: Vec<LineComment>,
}

impl AnalyzeResult {
    /// A clean result for `path`.
    pub fn ok(path: impl Into<String>) -> Self {
        Self::with_summary(path, SUMMARY_OK)
    }

    /// A result carrying a status summary such as an extension mismatch.
    pub fn with_summary(path: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            summary_comment: summary.into(),
            line_comments: Vec::new(),
        }
    }

    /// Record a finding.
    pub fn push(&mut self, line: u32, comment: impl Into<String>) {
        if self.summary_comment == SUMMARY_OK {
            self.summary_comment = SUMMARY_ISSUES.to_string();
        }
        self.line_comments.push(LineComment {
            line,
            comment: comment.into(),
        });
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn summary_comment(&self) -> &str {
        &self.summary_comment
    }

    pub fn line_comments(&self) -> &[LineComment] {
        &self.line_comments
    }

    pub fn is_clean(&self) -> bool {
        self.line_comments.is_empty()
    }
}
