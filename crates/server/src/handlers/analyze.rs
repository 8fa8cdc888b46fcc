//! Analysis endpoints.

use super::common::{parse_id, read_json};
use crate::auth::require_auth;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, Query, Request, State};
use critic_core::{AnalyzeRequest, AnalyzeResult, FileInput, MAX_JSON_BODY_SIZE};
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Deserialize)]
pub struct AnalyzeQuery {
    pub analyzer: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzersResponse {
    pub analyzers: Vec<&'static str>,
}

/// Per-file results of a batch analysis, in request order.
#[derive(Debug, Serialize)]
pub struct AnalyzeBatchResponse {
    pub files: Vec<AnalyzeResult>,
}

/// GET /api/analyzers - Registered analyzer identifiers.
pub async fn list_analyzers(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<Json<AnalyzersResponse>> {
    require_auth(&req)?;
    Ok(Json(AnalyzersResponse {
        analyzers: state.analyzers.kinds(),
    }))
}

/// POST /api/analyzers/{kind} - Analyze an inline batch of files.
///
/// Body: `{"files": [{"path": "...", "content": "..."}]}`. Nothing is stored.
pub async fn analyze_batch(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    req: Request,
) -> ApiResult<Json<AnalyzeBatchResponse>> {
    require_auth(&req)?;
    // Unknown kinds fail before the body is read.
    state.analyzers.get(&kind)?;

    let request: AnalyzeRequest = read_json(req.into_body(), MAX_JSON_BODY_SIZE).await?;

    let started = Instant::now();
    let files = state.analyzers.dispatch_batch(&kind, &request).await?;
    let per_file = started.elapsed() / u32::try_from(files.len().max(1)).unwrap_or(u32::MAX);

    for result in &files {
        crate::metrics::record_analysis(&kind, result.is_clean(), per_file);
    }
    tracing::info!(analyzer = %kind, files = files.len(), "batch analyzed");

    Ok(Json(AnalyzeBatchResponse { files }))
}

/// POST /api/projects/{project_id}/files/{file_id}/analyze?analyzer=<kind>
///
/// Runs the named analyzer over a stored file. The query is parsed only once
/// the caller is authenticated and owns the file.
pub async fn analyze_file(
    State(state): State<AppState>,
    Path((project_id, file_id)): Path<(String, String)>,
    req: Request,
) -> ApiResult<Json<AnalyzeResult>> {
    let auth = require_auth(&req)?;
    let project_id = parse_id("project", &project_id)?;
    let file_id = parse_id("file", &file_id)?;

    let (_, file) = state
        .guard
        .authorize_file(&auth.identity, project_id, file_id)
        .await?;

    let Query(query) = Query::<AnalyzeQuery>::try_from_uri(req.uri())
        .map_err(|e| ApiError::BadRequest(format!("invalid query: {}", e.body_text())))?;
    let kind = query
        .analyzer
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing analyzer query parameter".to_string()))?;

    let started = Instant::now();
    let result = state
        .analyzers
        .dispatch(kind, &FileInput::new(file.path, file.content))
        .await?;

    crate::metrics::record_analysis(kind, result.is_clean(), started.elapsed());
    tracing::info!(
        project_id,
        file_id,
        analyzer = kind,
        summary = result.summary_comment(),
        comments = result.line_comments().len(),
        "file analyzed"
    );

    Ok(Json(result))
}
