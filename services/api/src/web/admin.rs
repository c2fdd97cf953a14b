//! services/api/src/web/admin.rs
//!
//! Admin-only handlers: course and lecture management with media uploads,
//! platform statistics, the user listing, and role changes.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use bytes::Bytes;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use coursehub_core::domain::{MediaAsset, Role, User};
use coursehub_core::ports::{MediaKind, MediaUpload, NewCourse, NewLecture, PortError};

use crate::error::ApiError;
use crate::web::courses::{CourseResponse, LectureResponse};
use crate::web::state::AppState;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct StatsResponse {
    pub total_courses: u64,
    pub total_lectures: u64,
    pub total_users: u64,
}

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub subscriptions: Vec<Uuid>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role.as_str().to_string(),
            subscriptions: user.subscriptions,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
}

//=========================================================================================
// Multipart Helpers
//=========================================================================================

struct UploadedFile {
    file_name: String,
    content_type: String,
    data: Bytes,
}

/// Text fields plus at most one file part, as sent by the admin forms.
struct AdminForm {
    fields: HashMap<String, String>,
    file: Option<UploadedFile>,
}

impl AdminForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut fields = HashMap::new();
        let mut file = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to read multipart data: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" {
                let file_name = field.file_name().unwrap_or("upload.bin").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(|e| {
                    ApiError::Internal(format!("Failed to read file bytes: {}", e))
                })?;
                file = Some(UploadedFile {
                    file_name,
                    content_type,
                    data,
                });
            } else {
                let value = field.text().await.map_err(|e| {
                    ApiError::Internal(format!("Failed to read multipart data: {}", e))
                })?;
                fields.insert(name, value);
            }
        }

        Ok(Self { fields, file })
    }

    fn require(&self, name: &str) -> Result<&str, ApiError> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| {
                ApiError::Port(PortError::InvalidInput(format!("{} is required", name)))
            })
    }
}

/// Pushes the form's file part (if any) to the blob store.
async fn upload_file(
    state: &AppState,
    file: Option<UploadedFile>,
    kind: MediaKind,
) -> Result<Option<MediaAsset>, ApiError> {
    let Some(file) = file else { return Ok(None) };
    let asset = state
        .media
        .upload(MediaUpload {
            data: file.data,
            file_name: file.file_name,
            content_type: file.content_type,
            kind,
        })
        .await?;
    Ok(Some(asset))
}

//=========================================================================================
// Course and Lecture Handlers
//=========================================================================================

/// Create a course from a multipart form with an optional image part.
#[utoipa::path(
    post,
    path = "/admin/courses",
    request_body(content_type = "multipart/form-data", description = "Course fields plus an optional image under `file`."),
    responses(
        (status = 201, description = "Course created", body = CourseResponse),
        (status = 400, description = "Missing or malformed fields"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn create_course_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    // 1. Collect the form
    let form = AdminForm::read(multipart).await?;

    let title = form.require("title")?.to_string();
    let description = form.require("description")?.to_string();
    let category = form.require("category")?.to_string();
    let created_by = form.require("created_by")?.to_string();

    let duration = form.require("duration")?.parse::<i32>().map_err(|_| {
        ApiError::Port(PortError::InvalidInput(
            "duration must be a whole number of minutes".to_string(),
        ))
    })?;
    let price = form.require("price")?.parse::<f64>().map_err(|_| {
        ApiError::Port(PortError::InvalidInput("price must be a number".to_string()))
    })?;
    if !price.is_finite() || price < 0.0 {
        return Err(ApiError::Port(PortError::InvalidInput(
            "price must be a non-negative number".to_string(),
        )));
    }

    // 2. Push the image to the blob store first, so the record never points
    //    at a blob that failed to upload
    let image = upload_file(&state, form.file, MediaKind::Image).await?;

    // 3. Create the record
    let course = state
        .admin
        .create_course(NewCourse {
            title,
            description,
            category,
            created_by,
            price,
            duration,
            image,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Course created successfully",
            "course": CourseResponse::from(course),
        })),
    ))
}

/// Add a lecture to a course from a multipart form with an optional video part.
#[utoipa::path(
    post,
    path = "/admin/courses/{id}/lectures",
    params(("id" = Uuid, Path, description = "Course id")),
    request_body(content_type = "multipart/form-data", description = "Lecture fields plus an optional video under `file`."),
    responses(
        (status = 201, description = "Lecture added", body = LectureResponse),
        (status = 400, description = "Missing or malformed fields"),
        (status = 404, description = "Course not found")
    )
)]
pub async fn add_lecture_handler(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = AdminForm::read(multipart).await?;

    let title = form.require("title")?.to_string();
    let description = form.require("description")?.to_string();

    let video = upload_file(&state, form.file, MediaKind::Video).await?;

    let lecture = state
        .admin
        .add_lecture(NewLecture {
            course_id,
            title,
            description,
            video,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Lecture added",
            "lecture": LectureResponse::from(lecture),
        })),
    ))
}

/// Delete a lecture and release its video blob.
#[utoipa::path(
    delete,
    path = "/admin/lectures/{id}",
    params(("id" = Uuid, Path, description = "Lecture id")),
    responses(
        (status = 200, description = "Lecture deleted"),
        (status = 404, description = "Lecture not found")
    )
)]
pub async fn delete_lecture_handler(
    State(state): State<Arc<AppState>>,
    Path(lecture_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.admin.delete_lecture(lecture_id).await?;
    Ok(Json(json!({ "message": "Lecture deleted" })))
}

/// Delete a course, its lectures and media, and strip it from subscriptions.
#[utoipa::path(
    delete,
    path = "/admin/courses/{id}",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course deleted"),
        (status = 404, description = "Course not found")
    )
)]
pub async fn delete_course_handler(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.admin.delete_course(course_id).await?;
    Ok(Json(json!({ "message": "Course deleted" })))
}

//=========================================================================================
// Stats, Users and Roles
//=========================================================================================

/// Point-in-time platform counts.
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses(
        (status = 200, description = "Platform statistics", body = StatsResponse)
    )
)]
pub async fn stats_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = state.admin.stats().await?;
    Ok(Json(json!({
        "stats": StatsResponse {
            total_courses: stats.total_courses,
            total_lectures: stats.total_lectures,
            total_users: stats.total_users,
        },
    })))
}

/// List every user except the caller.
#[utoipa::path(
    get,
    path = "/admin/users",
    responses(
        (status = 200, description = "All other users", body = UserListResponse)
    )
)]
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let users = state.admin.list_users(user_id).await?;
    Ok(Json(UserListResponse {
        users: users.into_iter().map(UserResponse::from).collect(),
    }))
}

/// Toggle a user between the user and admin roles. Superadmin only.
#[utoipa::path(
    put,
    path = "/admin/users/{id}/role",
    params(("id" = Uuid, Path, description = "Target user id")),
    responses(
        (status = 200, description = "Role updated"),
        (status = 400, description = "Target is a superadmin"),
        (status = 403, description = "Caller is not a superadmin"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_role_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(target_user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let role = state.admin.update_role(user_id, target_user_id).await?;
    let message = match role {
        Role::Admin => "Role updated to admin",
        _ => "Role updated to user",
    };
    Ok(Json(json!({ "message": message, "role": role.as_str() })))
}
