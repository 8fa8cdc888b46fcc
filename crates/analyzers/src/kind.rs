//! Analyzer identifiers and the file extensions each one accepts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::AnalyzerError;

/// Supported analyzer kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerKind {
    /// C and C++ sources, checked with cppcheck.
    Cpp,
    /// Java sources, checked with checkstyle.
    Java,
    /// JavaScript sources, checked with eslint.
    #[serde(rename = "javascript")]
    JavaScript,
    /// Python sources, checked with flake8.
    Python,
    /// JSON documents, checked in-process.
    Json,
}

impl AnalyzerKind {
    pub const ALL: [AnalyzerKind; 5] = [
        AnalyzerKind::Cpp,
        AnalyzerKind::Java,
        AnalyzerKind::JavaScript,
        AnalyzerKind::Python,
        AnalyzerKind::Json,
    ];

    /// Identifier used to select the analyzer.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cpp => "cpp",
            Self::Java => "java",
            Self::JavaScript => "javascript",
            Self::Python => "python",
            Self::Json => "json",
        }
    }

    /// Human-readable language name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cpp => "C/C++",
            Self::Java => "Java",
            Self::JavaScript => "JavaScript",
            Self::Python => "Python",
            Self::Json => "JSON",
        }
    }

    /// Accepted file extensions, lowercase and without the dot.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Cpp => &["c", "cpp", "cc", "cxx", "h", "hpp"],
            Self::Java => &["java"],
            Self::JavaScript => &["js", "jsx"],
            Self::Python => &["py"],
            Self::Json => &["json"],
        }
    }

    /// Whether `path` carries one of this kind's extensions (case-insensitive).
    pub fn accepts(&self, path: &str) -> bool {
        Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.extensions().contains(&ext.as_str())
            })
            .unwrap_or(false)
    }

    /// Summary reported for a file this kind does not handle.
    pub fn mismatch_summary(&self) -> String {
        format!("Not a {} file", self.label())
    }
}

impl fmt::Display for AnalyzerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalyzerKind {
    type Err = AnalyzerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| AnalyzerError::UnknownAnalyzer(s.to_string()))
    }
}
