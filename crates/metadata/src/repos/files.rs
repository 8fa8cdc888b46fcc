//! File repository trait.

use crate::error::MetadataResult;
use crate::models::FileRow;
use async_trait::async_trait;
use time::OffsetDateTime;

/// Repository for files within a project.
#[async_trait]
pub trait FileRepo: Send + Sync {
    /// Create a file, or replace the content of the file already stored at
    /// `(project_id, path)`. An existing row keeps its ID and `created_at`.
    async fn upsert_file(
        &self,
        project_id: i64,
        path: &str,
        content: &str,
        now: OffsetDateTime,
    ) -> MetadataResult<FileRow>;

    /// Get a file by ID.
    async fn get_file(&self, file_id: i64) -> MetadataResult<Option<FileRow>>;

    /// List a project's files ordered by path.
    async fn list_files_by_project(&self, project_id: i64) -> MetadataResult<Vec<FileRow>>;

    /// Replace a file's path and content.
    ///
    /// Moving onto a path already used in the project yields `AlreadyExists`.
    async fn update_file(
        &self,
        file_id: i64,
        path: &str,
        content: &str,
        now: OffsetDateTime,
    ) -> MetadataResult<FileRow>;

    /// Delete a file by ID.
    async fn delete_file(&self, file_id: i64) -> MetadataResult<()>;

    /// Count files in a project.
    async fn count_files_by_project(&self, project_id: i64) -> MetadataResult<u64>;
}
