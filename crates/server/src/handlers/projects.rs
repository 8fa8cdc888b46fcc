//! Project endpoints.

use super::common::{
    FileResponse, ProjectResponse, file_responses, parse_id, read_body, read_json,
};
use crate::auth::require_auth;
use crate::error::{ApiError, ApiResult};
use crate::ingest::{IngestReport, ingest_archive};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use critic_core::MAX_JSON_BODY_SIZE;
use critic_metadata::repos::{FileRepo, ProjectRepo};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Request body for creating or renaming a project.
#[derive(Debug, Deserialize)]
pub struct ProjectNameRequest {
    pub name: String,
}

/// A project together with its files.
#[derive(Debug, Serialize)]
pub struct ProjectDetailResponse {
    #[serde(flatten)]
    pub project: ProjectResponse,
    pub files: Vec<FileResponse>,
}

fn validate_project_name(name: &str) -> ApiResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("project name cannot be empty".to_string()));
    }
    Ok(name)
}

/// GET /api/projects - List the caller's projects.
pub async fn list_projects(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<Json<Vec<ProjectResponse>>> {
    let auth = require_auth(&req)?;

    let rows = state
        .metadata
        .list_projects_by_owner(auth.identity.user_id)
        .await?;

    let projects = rows
        .into_iter()
        .map(ProjectResponse::from_row)
        .collect::<ApiResult<Vec<_>>>()?;
    Ok(Json(projects))
}

/// POST /api/projects - Create a project owned by the caller.
pub async fn create_project(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<(StatusCode, Json<ProjectResponse>)> {
    let identity = require_auth(&req)?.identity.clone();

    let body: ProjectNameRequest = read_json(req.into_body(), MAX_JSON_BODY_SIZE).await?;
    let name = validate_project_name(&body.name)?;

    let row = state
        .metadata
        .create_project(name, identity.user_id, OffsetDateTime::now_utc())
        .await?;

    crate::metrics::PROJECTS_CREATED.inc();
    tracing::info!(project_id = row.id, owner = %identity, "project created");

    Ok((StatusCode::CREATED, Json(ProjectResponse::from_row(row)?)))
}

/// GET /api/projects/{project_id} - Project with its files.
pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    req: Request,
) -> ApiResult<Json<ProjectDetailResponse>> {
    let auth = require_auth(&req)?;
    let project_id = parse_id("project", &project_id)?;

    let project = state.guard.authorize_project(&auth.identity, project_id).await?;
    let files = state.metadata.list_files_by_project(project.id).await?;

    Ok(Json(ProjectDetailResponse {
        project: ProjectResponse::from_row(project)?,
        files: file_responses(files)?,
    }))
}

/// PUT /api/projects/{project_id} - Rename a project.
pub async fn update_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    req: Request,
) -> ApiResult<Json<ProjectResponse>> {
    let identity = require_auth(&req)?.identity.clone();
    let project_id = parse_id("project", &project_id)?;

    state.guard.authorize_project(&identity, project_id).await?;

    let body: ProjectNameRequest = read_json(req.into_body(), MAX_JSON_BODY_SIZE).await?;
    let name = validate_project_name(&body.name)?;

    let row = state
        .metadata
        .update_project(project_id, identity.user_id, name, OffsetDateTime::now_utc())
        .await?;

    tracing::info!(project_id, "project renamed");

    Ok(Json(ProjectResponse::from_row(row)?))
}

/// DELETE /api/projects/{project_id} - Delete a project and all its files.
pub async fn delete_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    req: Request,
) -> ApiResult<StatusCode> {
    let auth = require_auth(&req)?;
    let project_id = parse_id("project", &project_id)?;

    state.guard.authorize_project(&auth.identity, project_id).await?;

    let stats = state
        .metadata
        .delete_project_with_cascade(project_id, auth.identity.user_id)
        .await?;

    crate::metrics::PROJECTS_DELETED.inc();
    tracing::info!(project_id, files = stats.files, "project deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/projects/{project_id}/upload - Ingest a zip archive.
pub async fn upload_archive(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    req: Request,
) -> ApiResult<(StatusCode, Json<IngestReport>)> {
    let identity = require_auth(&req)?.identity.clone();
    let project_id = parse_id("project", &project_id)?;

    state.guard.authorize_project(&identity, project_id).await?;

    let limits = state.ingest_limits();

    // Reject on the declared length before buffering anything.
    let declared = req
        .headers()
        .get(axum::http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|size| size > limits.archive_bytes) {
        crate::metrics::ARCHIVES_REJECTED
            .with_label_values(&["too_large"])
            .inc();
        return Err(ApiError::PayloadTooLarge {
            limit: limits.archive_bytes,
        });
    }

    let bytes = read_body(req.into_body(), limits.archive_bytes)
        .await
        .inspect_err(|e| {
            if matches!(e, ApiError::PayloadTooLarge { .. }) {
                crate::metrics::ARCHIVES_REJECTED
                    .with_label_values(&["too_large"])
                    .inc();
            }
        })?;

    let report = ingest_archive(state.metadata.as_ref(), project_id, bytes, limits).await?;

    Ok((StatusCode::CREATED, Json(report)))
}
