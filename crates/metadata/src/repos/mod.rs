//! Repository traits for metadata operations.

pub mod files;
pub mod projects;

pub use files::FileRepo;
pub use projects::ProjectRepo;
