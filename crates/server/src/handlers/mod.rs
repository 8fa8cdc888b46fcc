//! HTTP request handlers.

pub mod analyze;
pub mod common;
pub mod files;
pub mod health;
pub mod projects;

pub use analyze::*;
pub use files::*;
pub use health::*;
pub use projects::*;
