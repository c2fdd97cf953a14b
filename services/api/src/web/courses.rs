//! services/api/src/web/courses.rs
//!
//! Handlers for the public course catalog, lecture access for subscribers,
//! and the checkout/verification flow that turns a gateway payment into an
//! entitlement.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use coursehub_core::domain::{Course, Lecture};
use coursehub_core::entitlement::{CourseAccess, PurchaseOutcome};
use coursehub_core::ports::PortError;

use crate::error::ApiError;
use crate::web::state::AppState;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct CourseResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub created_by: String,
    pub price: f64,
    pub duration: i32,
    pub image_url: Option<String>,
}

impl From<Course> for CourseResponse {
    fn from(course: Course) -> Self {
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            category: course.category,
            created_by: course.created_by,
            price: course.price,
            duration: course.duration,
            image_url: course.image.map(|image| image.url),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct CourseListResponse {
    pub courses: Vec<CourseResponse>,
}

#[derive(Serialize, ToSchema)]
pub struct LectureResponse {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: Option<String>,
}

impl From<Lecture> for LectureResponse {
    fn from(lecture: Lecture) -> Self {
        Self {
            id: lecture.id,
            course_id: lecture.course_id,
            title: lecture.title,
            description: lecture.description,
            video_url: lecture.video.map(|video| video.url),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct LectureListResponse {
    pub lectures: Vec<LectureResponse>,
}

#[derive(Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: String,
    pub course_id: Uuid,
}

#[derive(Deserialize, ToSchema)]
pub struct VerifyRequest {
    pub session_id: String,
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Turns an access decision into the error subscribers-only routes raise.
fn require_subscription(access: CourseAccess) -> Result<(), ApiError> {
    match access {
        CourseAccess::Granted => Ok(()),
        CourseAccess::NotSubscribed => Err(ApiError::Port(PortError::Forbidden(
            "you have not subscribed to this course".to_string(),
        ))),
    }
}

//=========================================================================================
// Catalog Handlers
//=========================================================================================

/// List all courses in the catalog.
#[utoipa::path(
    get,
    path = "/courses",
    responses(
        (status = 200, description = "All courses", body = CourseListResponse)
    )
)]
pub async fn list_courses_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let courses = state.store.list_courses().await?;
    Ok(Json(CourseListResponse {
        courses: courses.into_iter().map(CourseResponse::from).collect(),
    }))
}

/// Fetch a single course by id.
#[utoipa::path(
    get,
    path = "/courses/{id}",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "The course", body = CourseResponse),
        (status = 404, description = "Course not found")
    )
)]
pub async fn get_course_handler(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let course = state.store.get_course(course_id).await?;
    Ok(Json(CourseResponse::from(course)))
}

/// List the lectures of a course the caller is entitled to.
#[utoipa::path(
    get,
    path = "/courses/{id}/lectures",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Lectures of the course", body = LectureListResponse),
        (status = 403, description = "Not subscribed to this course"),
        (status = 404, description = "Course not found")
    )
)]
pub async fn list_lectures_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(course_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    // 1. The course must exist before the entitlement question makes sense
    state.store.get_course(course_id).await?;

    // 2. Admins pass, subscribers pass, everyone else is turned away
    let access = state.entitlements.check_access(user_id, course_id).await?;
    require_subscription(access)?;

    // 3. Hand back the lectures
    let lectures = state.store.list_lectures(course_id).await?;
    Ok(Json(LectureListResponse {
        lectures: lectures.into_iter().map(LectureResponse::from).collect(),
    }))
}

/// Fetch a single lecture, subject to the same entitlement check.
#[utoipa::path(
    get,
    path = "/lectures/{id}",
    params(("id" = Uuid, Path, description = "Lecture id")),
    responses(
        (status = 200, description = "The lecture", body = LectureResponse),
        (status = 403, description = "Not subscribed to this course"),
        (status = 404, description = "Lecture not found")
    )
)]
pub async fn get_lecture_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(lecture_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let lecture = state.store.get_lecture(lecture_id).await?;

    let access = state
        .entitlements
        .check_access(user_id, lecture.course_id)
        .await?;
    require_subscription(access)?;

    Ok(Json(LectureResponse::from(lecture)))
}

/// List the courses the caller has purchased.
#[utoipa::path(
    get,
    path = "/my/courses",
    responses(
        (status = 200, description = "The caller's courses", body = CourseListResponse)
    )
)]
pub async fn my_courses_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.store.get_user(user_id).await?;
    let courses = state.store.list_courses_by_ids(&user.subscriptions).await?;
    Ok(Json(CourseListResponse {
        courses: courses.into_iter().map(CourseResponse::from).collect(),
    }))
}

//=========================================================================================
// Checkout Handlers
//=========================================================================================

/// Open a gateway checkout session for a course.
#[utoipa::path(
    post,
    path = "/courses/{id}/checkout",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 201, description = "Checkout session created", body = CheckoutResponse),
        (status = 400, description = "Course already owned"),
        (status = 404, description = "Course not found")
    )
)]
pub async fn checkout_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(course_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.entitlements.create_checkout(user_id, course_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            session_id: session.session_id,
            url: session.url,
            course_id: session.course_id,
        }),
    ))
}

/// Verify a checkout session and grant the entitlement when it settled.
///
/// Safe to call repeatedly for the same session; a replay neither double
/// charges nor double grants.
#[utoipa::path(
    post,
    path = "/courses/{id}/verify",
    params(("id" = Uuid, Path, description = "Course id")),
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Payment verified, course granted"),
        (status = 400, description = "Payment not settled"),
        (status = 404, description = "Unknown session or course")
    )
)]
pub async fn verify_payment_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(course_id): Path<Uuid>,
    Json(req): Json<VerifyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .entitlements
        .verify_payment(user_id, course_id, &req.session_id)
        .await?;

    match outcome {
        PurchaseOutcome::Completed(course) => Ok((
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Course purchased successfully",
                "course": {
                    "id": course.id,
                    "title": course.title,
                    "description": course.description,
                    "image_url": course.image_url,
                },
            })),
        )),
        PurchaseOutcome::Rejected { status } => Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "message": "Payment failed",
                "status": status.as_str(),
            })),
        )),
    }
}
