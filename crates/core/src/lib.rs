//! Core domain types and shared logic for the critic service.
//!
//! This crate defines the data shared by the other crates:
//! - Caller identity derived from a verified credential
//! - The canonical analysis result every analyzer produces
//! - Application configuration

pub mod analysis;
pub mod config;
pub mod error;
pub mod identity;

pub use analysis::{
    AnalyzeRequest, AnalyzeResult, FileInput, LineComment, SUMMARY_ISSUES, SUMMARY_OK,
};
pub use error::{Error, Result};
pub use identity::Identity;

/// Maximum accepted archive upload: 25 MiB.
pub const MAX_ARCHIVE_SIZE: usize = 25 * 1024 * 1024;

/// Maximum accepted JSON request body: 25 MiB.
pub const MAX_JSON_BODY_SIZE: usize = 25 * 1024 * 1024;

/// Default ceiling on the decompressed content of one archive: 100 MiB.
pub const MAX_EXTRACTED_SIZE: usize = 100 * 1024 * 1024;
