//! Database models mapping to the metadata schema.

use sqlx::FromRow;
use time::OffsetDateTime;

// =============================================================================
// Projects
// =============================================================================

/// Project record. Owned by exactly one user.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectRow {
    pub id: i64,
    pub name: String,
    pub owner_user_id: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

// =============================================================================
// Files
// =============================================================================

/// File record. `(project_id, path)` is unique.
#[derive(Debug, Clone, FromRow)]
pub struct FileRow {
    pub id: i64,
    pub project_id: i64,
    pub path: String,
    pub content: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Statistics from cascade deletion of a project.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct CascadeDeleteStats {
    pub files: u64,
}
