//! Metadata store trait and implementations.

use crate::error::{MetadataError, MetadataResult};
use crate::repos::{FileRepo, ProjectRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore: ProjectRepo + FileRepo + Send + Sync {
    /// Run database migrations.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path` and apply the schema.
    pub async fn new(path: impl AsRef<Path>, busy_timeout_secs: u64) -> MetadataResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(busy_timeout_secs));

        let pool = SqlitePoolOptions::new()
            // A single connection keeps writes serialized and avoids
            // "database is locked" under concurrent requests.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        tracing::info!(path = %path.display(), "opened sqlite metadata store");

        Ok(store)
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Map constraint failures raised by file writes onto repository errors.
fn map_file_write_error(err: sqlx::Error, project_id: i64, path: &str) -> MetadataError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return MetadataError::AlreadyExists(format!(
                "file '{path}' already exists in project {project_id}"
            ));
        }
        if db_err.is_foreign_key_violation() {
            return MetadataError::NotFound(format!("project {project_id} not found"));
        }
    }
    err.into()
}

mod sqlite_impl {
    use super::*;
    use crate::models::*;
    use time::OffsetDateTime;

    #[async_trait]
    impl ProjectRepo for SqliteStore {
        async fn create_project(
            &self,
            name: &str,
            owner_user_id: i64,
            now: OffsetDateTime,
        ) -> MetadataResult<ProjectRow> {
            let row = sqlx::query_as::<_, ProjectRow>(
                r#"
                INSERT INTO projects (name, owner_user_id, created_at, updated_at)
                VALUES (?, ?, ?, ?)
                RETURNING *
                "#,
            )
            .bind(name)
            .bind(owner_user_id)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;
            Ok(row)
        }

        async fn get_project(&self, project_id: i64) -> MetadataResult<Option<ProjectRow>> {
            let row = sqlx::query_as::<_, ProjectRow>("SELECT * FROM projects WHERE id = ?")
                .bind(project_id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn list_projects_by_owner(
            &self,
            owner_user_id: i64,
        ) -> MetadataResult<Vec<ProjectRow>> {
            let rows = sqlx::query_as::<_, ProjectRow>(
                "SELECT * FROM projects WHERE owner_user_id = ? ORDER BY created_at DESC, id DESC",
            )
            .bind(owner_user_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }

        async fn update_project(
            &self,
            project_id: i64,
            owner_user_id: i64,
            name: &str,
            now: OffsetDateTime,
        ) -> MetadataResult<ProjectRow> {
            sqlx::query_as::<_, ProjectRow>(
                r#"
                UPDATE projects SET name = ?, updated_at = ?
                WHERE id = ? AND owner_user_id = ?
                RETURNING *
                "#,
            )
            .bind(name)
            .bind(now)
            .bind(project_id)
            .bind(owner_user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| MetadataError::NotFound(format!("project {project_id} not found")))
        }

        async fn delete_project_with_cascade(
            &self,
            project_id: i64,
            owner_user_id: i64,
        ) -> MetadataResult<CascadeDeleteStats> {
            let mut tx = self.pool.begin().await?;

            let owned: Option<i64> =
                sqlx::query_scalar("SELECT id FROM projects WHERE id = ? AND owner_user_id = ?")
                    .bind(project_id)
                    .bind(owner_user_id)
                    .fetch_optional(&mut *tx)
                    .await?;

            if owned.is_none() {
                return Err(MetadataError::NotFound(format!(
                    "project {project_id} not found"
                )));
            }

            // Files go first so no file outlives its project even without
            // foreign key enforcement.
            let files = sqlx::query("DELETE FROM files WHERE project_id = ?")
                .bind(project_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

            sqlx::query("DELETE FROM projects WHERE id = ?")
                .bind(project_id)
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;

            Ok(CascadeDeleteStats { files })
        }
    }

    #[async_trait]
    impl FileRepo for SqliteStore {
        async fn upsert_file(
            &self,
            project_id: i64,
            path: &str,
            content: &str,
            now: OffsetDateTime,
        ) -> MetadataResult<FileRow> {
            sqlx::query_as::<_, FileRow>(
                r#"
                INSERT INTO files (project_id, path, content, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT (project_id, path)
                DO UPDATE SET content = excluded.content, updated_at = excluded.updated_at
                RETURNING *
                "#,
            )
            .bind(project_id)
            .bind(path)
            .bind(content)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_file_write_error(e, project_id, path))
        }

        async fn get_file(&self, file_id: i64) -> MetadataResult<Option<FileRow>> {
            let row = sqlx::query_as::<_, FileRow>("SELECT * FROM files WHERE id = ?")
                .bind(file_id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn list_files_by_project(&self, project_id: i64) -> MetadataResult<Vec<FileRow>> {
            let rows = sqlx::query_as::<_, FileRow>(
                "SELECT * FROM files WHERE project_id = ? ORDER BY path",
            )
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }

        async fn update_file(
            &self,
            file_id: i64,
            path: &str,
            content: &str,
            now: OffsetDateTime,
        ) -> MetadataResult<FileRow> {
            let existing = self
                .get_file(file_id)
                .await?
                .ok_or_else(|| MetadataError::NotFound(format!("file {file_id} not found")))?;

            sqlx::query_as::<_, FileRow>(
                r#"
                UPDATE files SET path = ?, content = ?, updated_at = ?
                WHERE id = ?
                RETURNING *
                "#,
            )
            .bind(path)
            .bind(content)
            .bind(now)
            .bind(file_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_file_write_error(e, existing.project_id, path))?
            .ok_or_else(|| MetadataError::NotFound(format!("file {file_id} not found")))
        }

        async fn delete_file(&self, file_id: i64) -> MetadataResult<()> {
            let deleted = sqlx::query("DELETE FROM files WHERE id = ?")
                .bind(file_id)
                .execute(&self.pool)
                .await?
                .rows_affected();

            if deleted == 0 {
                return Err(MetadataError::NotFound(format!("file {file_id} not found")));
            }
            Ok(())
        }

        async fn count_files_by_project(&self, project_id: i64) -> MetadataResult<u64> {
            let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE project_id = ?")
                .bind(project_id)
                .fetch_one(&self.pool)
                .await?;
            Ok(count as u64)
        }
    }
}

const SCHEMA_SQL: &str = r#"
-- Projects
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL CHECK (length(name) > 0),
    owner_user_id INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_projects_owner ON projects(owner_user_id);

-- Files
CREATE TABLE IF NOT EXISTS files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    path TEXT NOT NULL CHECK (length(path) > 0),
    content TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE(project_id, path)
);
CREATE INDEX IF NOT EXISTS idx_files_project ON files(project_id);
"#;
