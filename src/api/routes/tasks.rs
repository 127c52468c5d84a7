//! Task handlers: create, add references, poll status, drop.

use super::{AddQuery, CreateTaskResponse, StatusResponse, TaskQuery};
use crate::api::AppState;
use crate::error::ApiError;
use crate::types::TaskStatus;
use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

/// File name offered to clients for a finished archive
pub const ARCHIVE_FILE_NAME: &str = "files.zip";

/// POST /api/zip - Create a task
#[utoipa::path(
    post,
    path = "/api/zip",
    tag = "tasks",
    responses(
        (status = 200, description = "Task created", body = CreateTaskResponse),
        (status = 503, description = "Too many tasks in progress, or shutting down", body = ApiError)
    )
)]
pub async fn create_task(State(state): State<AppState>) -> Response {
    match state.collector.create_task().await {
        Ok(id) => (StatusCode::OK, Json(CreateTaskResponse { id })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /api/zip/add - Add one or more comma-separated URLs to a task
///
/// Each URL is handled independently; the report lists what was stored and
/// what was refused.
#[utoipa::path(
    post,
    path = "/api/zip/add",
    tag = "tasks",
    params(
        ("id" = u64, Query, description = "Task ID"),
        ("url" = String, Query, description = "One URL, or several separated by commas")
    ),
    responses(
        (status = 201, description = "Every URL was added", body = crate::types::AddReport),
        (status = 400, description = "At least one URL was refused", body = crate::types::AddReport),
        (status = 404, description = "Task not found", body = ApiError)
    )
)]
pub async fn add_references(
    State(state): State<AppState>,
    Query(query): Query<AddQuery>,
) -> Response {
    let urls: Vec<&str> = query
        .url
        .split(',')
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .collect();

    if urls.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiError::validation("no url given")),
        )
            .into_response();
    }

    match state.collector.add_references(query.id, urls).await {
        Ok(report) if report.all_added() => (StatusCode::CREATED, Json(report)).into_response(),
        Ok(report) => (StatusCode::BAD_REQUEST, Json(report)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /api/zip/status - Poll a task
///
/// While the task is collecting this returns the remaining capacity. Once
/// the task is full, the response is the ZIP archive itself and the task is
/// gone afterwards.
#[utoipa::path(
    get,
    path = "/api/zip/status",
    tag = "tasks",
    params(
        ("id" = u64, Query, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Collecting status, or the finished archive as application/zip once the task is full", body = StatusResponse),
        (status = 404, description = "Task not found", body = ApiError),
        (status = 409, description = "Archive already being assembled", body = ApiError),
        (status = 500, description = "Archive could not be assembled", body = ApiError)
    )
)]
pub async fn task_status(
    State(state): State<AppState>,
    Query(query): Query<TaskQuery>,
) -> Response {
    match state.collector.report_status(query.id).await {
        Ok(TaskStatus::Collecting { remaining, message }) => (
            StatusCode::OK,
            Json(StatusResponse {
                id: query.id,
                remaining,
                message,
            }),
        )
            .into_response(),
        Ok(TaskStatus::Archive(bytes)) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/zip".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename={ARCHIVE_FILE_NAME}"),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// DELETE /api/zip - Drop a task
///
/// Dropping an unknown task also succeeds.
#[utoipa::path(
    delete,
    path = "/api/zip",
    tag = "tasks",
    params(
        ("id" = u64, Query, description = "Task ID")
    ),
    responses(
        (status = 204, description = "Task dropped")
    )
)]
pub async fn drop_task(State(state): State<AppState>, Query(query): Query<TaskQuery>) -> StatusCode {
    state.collector.drop_task(query.id).await;
    StatusCode::NO_CONTENT
}
