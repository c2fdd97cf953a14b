//! services/api/src/web/progress.rs
//!
//! Handlers for per-user lecture completion tracking.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::state::AppState;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize)]
pub struct ProgressQuery {
    pub course: Uuid,
}

#[derive(Deserialize)]
pub struct MarkProgressQuery {
    pub course: Uuid,
    pub lecture: Uuid,
}

#[derive(Serialize, ToSchema)]
pub struct ProgressResponse {
    pub percentage: f64,
    pub completed_lectures: u64,
    pub total_lectures: u64,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Report the caller's completion for one course.
#[utoipa::path(
    get,
    path = "/progress",
    params(("course" = Uuid, Query, description = "Course id")),
    responses(
        (status = 200, description = "Completion summary", body = ProgressResponse),
        (status = 404, description = "No progress record; the course was never purchased")
    )
)]
pub async fn get_progress_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Query(query): Query<ProgressQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state.progress.get_progress(user_id, query.course).await?;
    Ok(Json(ProgressResponse {
        percentage: report.percentage,
        completed_lectures: report.completed_lectures,
        total_lectures: report.total_lectures,
    }))
}

/// Mark one lecture of a purchased course as completed. Idempotent.
#[utoipa::path(
    post,
    path = "/progress",
    params(
        ("course" = Uuid, Query, description = "Course id"),
        ("lecture" = Uuid, Query, description = "Lecture id")
    ),
    responses(
        (status = 201, description = "Progress recorded"),
        (status = 400, description = "Lecture does not belong to the course"),
        (status = 404, description = "No progress record, or unknown lecture")
    )
)]
pub async fn mark_progress_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Query(query): Query<MarkProgressQuery>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .progress
        .mark_complete(user_id, query.course, query.lecture)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "Progress updated" })),
    ))
}
