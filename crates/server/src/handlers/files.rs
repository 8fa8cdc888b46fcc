//! File endpoints nested under a project.

use super::common::{FileResponse, file_responses, parse_id, read_json};
use crate::auth::require_auth;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use critic_core::MAX_JSON_BODY_SIZE;
use critic_metadata::repos::FileRepo;
use serde::Deserialize;
use time::OffsetDateTime;

/// Request body for writing a file.
#[derive(Debug, Deserialize)]
pub struct FileRequest {
    pub path: String,
    #[serde(default)]
    pub content: String,
}

impl FileRequest {
    fn validated_path(&self) -> ApiResult<&str> {
        let path = self.path.trim();
        if path.is_empty() {
            return Err(ApiError::BadRequest("file path cannot be empty".to_string()));
        }
        Ok(path)
    }
}

/// GET /api/projects/{project_id}/files - List a project's files.
pub async fn list_files(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    req: Request,
) -> ApiResult<Json<Vec<FileResponse>>> {
    let auth = require_auth(&req)?;
    let project_id = parse_id("project", &project_id)?;

    state.guard.authorize_project(&auth.identity, project_id).await?;

    let rows = state.metadata.list_files_by_project(project_id).await?;
    Ok(Json(file_responses(rows)?))
}

/// POST /api/projects/{project_id}/files - Create or replace a file by path.
pub async fn upsert_file(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    req: Request,
) -> ApiResult<(StatusCode, Json<FileResponse>)> {
    let identity = require_auth(&req)?.identity.clone();
    let project_id = parse_id("project", &project_id)?;

    state.guard.authorize_project(&identity, project_id).await?;

    let body: FileRequest = read_json(req.into_body(), MAX_JSON_BODY_SIZE).await?;
    let path = body.validated_path()?;

    let row = state
        .metadata
        .upsert_file(project_id, path, &body.content, OffsetDateTime::now_utc())
        .await?;

    crate::metrics::FILES_UPSERTED.inc();
    tracing::debug!(project_id, file_id = row.id, path = %row.path, "file written");

    Ok((StatusCode::CREATED, Json(FileResponse::from_row(row)?)))
}

/// PUT /api/projects/{project_id}/files/{file_id} - Replace path and content.
pub async fn update_file(
    State(state): State<AppState>,
    Path((project_id, file_id)): Path<(String, String)>,
    req: Request,
) -> ApiResult<Json<FileResponse>> {
    let identity = require_auth(&req)?.identity.clone();
    let project_id = parse_id("project", &project_id)?;
    let file_id = parse_id("file", &file_id)?;

    state
        .guard
        .authorize_file(&identity, project_id, file_id)
        .await?;

    let body: FileRequest = read_json(req.into_body(), MAX_JSON_BODY_SIZE).await?;
    let path = body.validated_path()?;

    let row = state
        .metadata
        .update_file(file_id, path, &body.content, OffsetDateTime::now_utc())
        .await?;

    tracing::debug!(project_id, file_id, path = %row.path, "file updated");

    Ok(Json(FileResponse::from_row(row)?))
}

/// DELETE /api/projects/{project_id}/files/{file_id} - Delete a file.
pub async fn delete_file(
    State(state): State<AppState>,
    Path((project_id, file_id)): Path<(String, String)>,
    req: Request,
) -> ApiResult<StatusCode> {
    let auth = require_auth(&req)?;
    let project_id = parse_id("project", &project_id)?;
    let file_id = parse_id("file", &file_id)?;

    state
        .guard
        .authorize_file(&auth.identity, project_id, file_id)
        .await?;

    state.metadata.delete_file(file_id).await?;

    tracing::debug!(project_id, file_id, "file deleted");

    Ok(StatusCode::NO_CONTENT)
}
