//! Project repository trait.

use crate::error::MetadataResult;
use crate::models::{CascadeDeleteStats, ProjectRow};
use async_trait::async_trait;
use time::OffsetDateTime;

/// Repository for projects.
#[async_trait]
pub trait ProjectRepo: Send + Sync {
    /// Create a new project owned by `owner_user_id`.
    async fn create_project(
        &self,
        name: &str,
        owner_user_id: i64,
        now: OffsetDateTime,
    ) -> MetadataResult<ProjectRow>;

    /// Get a project by ID.
    async fn get_project(&self, project_id: i64) -> MetadataResult<Option<ProjectRow>>;

    /// List projects owned by a user, newest first.
    async fn list_projects_by_owner(&self, owner_user_id: i64) -> MetadataResult<Vec<ProjectRow>>;

    /// Rename a project.
    ///
    /// The row must still belong to `owner_user_id`; otherwise `NotFound`.
    async fn update_project(
        &self,
        project_id: i64,
        owner_user_id: i64,
        name: &str,
        now: OffsetDateTime,
    ) -> MetadataResult<ProjectRow>;

    /// Delete a project and all of its files atomically.
    ///
    /// Ownership is re-checked inside the transaction; a project that is
    /// missing or owned by someone else yields `NotFound`.
    async fn delete_project_with_cascade(
        &self,
        project_id: i64,
        owner_user_id: i64,
    ) -> MetadataResult<CascadeDeleteStats>;
}
