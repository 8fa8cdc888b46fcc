//! Static-analysis adapters for critic.
//!
//! Every adapter turns one file into the canonical
//! [`AnalyzeResult`](critic_core::AnalyzeResult):
//! - [`ToolAnalyzer`] runs an external checker (cppcheck, checkstyle,
//!   eslint, flake8) and decodes its output with an [`OutputDecoder`]
//! - [`JsonAnalyzer`] validates JSON documents in-process
//!
//! [`AnalyzerRegistry`] maps analyzer identifiers to adapters and is built
//! once at startup.

pub mod analyzer;
pub mod decoder;
pub mod error;
pub mod json;
pub mod kind;
pub mod registry;
pub mod tool;

pub use analyzer::Analyzer;
pub use decoder::OutputDecoder;
pub use error::{AnalyzerError, AnalyzerResult};
pub use json::JsonAnalyzer;
pub use kind::AnalyzerKind;
pub use registry::AnalyzerRegistry;
pub use tool::ToolAnalyzer;
