//! Shared handler helpers.

use crate::error::{ApiError, ApiResult};
use axum::body::{Body, Bytes};
use http_body_util::LengthLimitError;
use critic_metadata::models::{FileRow, ProjectRow};
use serde::Serialize;
use serde::de::DeserializeOwned;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Parse a numeric resource ID taken from the request path.
pub fn parse_id(kind: &str, raw: &str) -> ApiResult<i64> {
    raw.parse::<i64>()
        .map_err(|e| ApiError::BadRequest(format!("invalid {kind} ID: {e}")))
}

/// Buffer a request body of at most `limit` bytes.
///
/// A body over the limit is `PayloadTooLarge`; any other read failure, such
/// as the client going away mid-stream, is `BadRequest`.
pub async fn read_body(body: Body, limit: usize) -> ApiResult<Bytes> {
    axum::body::to_bytes(body, limit).await.map_err(|e| {
        if is_length_limit(&e) {
            ApiError::PayloadTooLarge { limit }
        } else {
            ApiError::BadRequest(format!("failed to read body: {e}"))
        }
    })
}

fn is_length_limit(err: &axum::Error) -> bool {
    std::error::Error::source(err).is_some_and(|source| source.is::<LengthLimitError>())
}

/// Read and deserialize a JSON request body of at most `limit` bytes.
pub async fn read_json<T: DeserializeOwned>(body: Body, limit: usize) -> ApiResult<T> {
    let bytes = read_body(body, limit).await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::BadRequest(format!("invalid JSON: {e}")))
}

fn format_timestamp(ts: OffsetDateTime) -> ApiResult<String> {
    ts.format(&Rfc3339)
        .map_err(|e| ApiError::Internal(format!("failed to format timestamp: {e}")))
}

/// Project as returned by the API.
#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: i64,
    pub name: String,
    pub user_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl ProjectResponse {
    pub fn from_row(row: ProjectRow) -> ApiResult<Self> {
        Ok(Self {
            id: row.id,
            name: row.name,
            user_id: row.owner_user_id,
            created_at: format_timestamp(row.created_at)?,
            updated_at: format_timestamp(row.updated_at)?,
        })
    }
}

/// File as returned by the API.
#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub id: i64,
    pub project_id: i64,
    pub path: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

impl FileResponse {
    pub fn from_row(row: FileRow) -> ApiResult<Self> {
        Ok(Self {
            id: row.id,
            project_id: row.project_id,
            path: row.path,
            content: row.content,
            created_at: format_timestamp(row.created_at)?,
            updated_at: format_timestamp(row.updated_at)?,
        })
    }
}

pub fn file_responses(rows: Vec<FileRow>) -> ApiResult<Vec<FileResponse>> {
    rows.into_iter().map(FileResponse::from_row).collect()
}
