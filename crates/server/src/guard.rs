//! Ownership checks in front of every project and file operation.

use crate::error::{ApiError, ApiResult};
use critic_core::Identity;
use critic_metadata::MetadataStore;
use critic_metadata::models::{FileRow, ProjectRow};
use critic_metadata::repos::{FileRepo, ProjectRepo};
use std::sync::Arc;

/// Resolves a target and checks that the caller owns it.
///
/// Checks run in a fixed order: resolve the target (`NotFound` when absent),
/// then compare owners (`Forbidden` on mismatch). Credential verification
/// has already happened in the auth middleware.
#[derive(Clone)]
pub struct AuthorizationGuard {
    metadata: Arc<dyn MetadataStore>,
}

impl AuthorizationGuard {
    pub fn new(metadata: Arc<dyn MetadataStore>) -> Self {
        Self { metadata }
    }

    /// Load a project the caller owns.
    pub async fn authorize_project(
        &self,
        identity: &Identity,
        project_id: i64,
    ) -> ApiResult<ProjectRow> {
        let project = self
            .metadata
            .get_project(project_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("project {project_id} not found")))?;

        if !identity.owns(project.owner_user_id) {
            tracing::debug!(
                user_id = identity.user_id,
                project_id,
                "ownership check failed"
            );
            crate::metrics::record_auth_failure("not_owner");
            return Err(ApiError::Forbidden(format!(
                "project {project_id} belongs to another user"
            )));
        }

        Ok(project)
    }

    /// Load a file the caller owns through its parent project.
    ///
    /// Ownership is decided by the file's actual parent. A file that exists
    /// but lives under a different project than `project_id` is `NotFound`.
    pub async fn authorize_file(
        &self,
        identity: &Identity,
        project_id: i64,
        file_id: i64,
    ) -> ApiResult<(ProjectRow, FileRow)> {
        let file = self
            .metadata
            .get_file(file_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("file {file_id} not found")))?;

        let project = self.authorize_project(identity, file.project_id).await?;

        if file.project_id != project_id {
            return Err(ApiError::NotFound(format!(
                "file {file_id} not found in project {project_id}"
            )));
        }

        Ok((project, file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use critic_metadata::SqliteStore;
    use time::OffsetDateTime;

    async fn guard() -> (tempfile::TempDir, Arc<dyn MetadataStore>, AuthorizationGuard) {
        let temp = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(temp.path().join("critic.db"), 5)
            .await
            .unwrap();
        let metadata: Arc<dyn MetadataStore> = Arc::new(store);
        let guard = AuthorizationGuard::new(metadata.clone());
        (temp, metadata, guard)
    }

    #[tokio::test]
    async fn test_owner_passes_and_stranger_is_forbidden() {
        let (_temp, metadata, guard) = guard().await;
        let now = OffsetDateTime::now_utc();
        let project = metadata.create_project("demo", 1, now).await.unwrap();

        let owner = Identity::new(1, "ada");
        let stranger = Identity::new(2, "eve");

        assert_eq!(
            guard.authorize_project(&owner, project.id).await.unwrap().id,
            project.id
        );
        assert!(matches!(
            guard.authorize_project(&stranger, project.id).await,
            Err(ApiError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_target_is_not_found_for_anyone() {
        let (_temp, _metadata, guard) = guard().await;
        let identity = Identity::new(1, "ada");
        assert!(matches!(
            guard.authorize_project(&identity, 999).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            guard.authorize_file(&identity, 1, 999).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_file_checked_against_actual_parent() {
        let (_temp, metadata, guard) = guard().await;
        let now = OffsetDateTime::now_utc();
        let mine = metadata.create_project("mine", 1, now).await.unwrap();
        let also_mine = metadata.create_project("also", 1, now).await.unwrap();
        let theirs = metadata.create_project("theirs", 2, now).await.unwrap();
        let their_file = metadata
            .upsert_file(theirs.id, "a.py", "x = 1", now)
            .await
            .unwrap();
        let my_file = metadata
            .upsert_file(mine.id, "b.py", "y = 2", now)
            .await
            .unwrap();

        let me = Identity::new(1, "ada");

        // Routing a foreign file through my own project does not bypass ownership.
        assert!(matches!(
            guard.authorize_file(&me, mine.id, their_file.id).await,
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            guard.authorize_file(&me, also_mine.id, my_file.id).await,
            Err(ApiError::NotFound(_))
        ));

        let (project, file) = guard.authorize_file(&me, mine.id, my_file.id).await.unwrap();
        assert_eq!(project.id, mine.id);
        assert_eq!(file.path, "b.py");
    }
}
