//! HTTP API server for critic.
//!
//! This crate provides the HTTP surface:
//! - Credential verification and per-resource ownership checks
//! - Project and file management
//! - Zip archive ingestion into a project
//! - Dispatch of stored files to static analyzers

pub mod auth;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod ingest;
pub mod metrics;
pub mod routes;
pub mod state;

pub use auth::{TokenAuthenticator, TraceId};
pub use error::ApiError;
pub use guard::AuthorizationGuard;
pub use ingest::{IngestReport, SkippedEntry};
pub use routes::create_router;
pub use state::AppState;
