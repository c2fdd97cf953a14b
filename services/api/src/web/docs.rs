//! services/api/src/web/docs.rs
//!
//! The master definition for the OpenAPI specification.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
        crate::web::courses::list_courses_handler,
        crate::web::courses::get_course_handler,
        crate::web::courses::list_lectures_handler,
        crate::web::courses::get_lecture_handler,
        crate::web::courses::my_courses_handler,
        crate::web::courses::checkout_handler,
        crate::web::courses::verify_payment_handler,
        crate::web::progress::get_progress_handler,
        crate::web::progress::mark_progress_handler,
        crate::web::admin::create_course_handler,
        crate::web::admin::add_lecture_handler,
        crate::web::admin::delete_lecture_handler,
        crate::web::admin::delete_course_handler,
        crate::web::admin::stats_handler,
        crate::web::admin::list_users_handler,
        crate::web::admin::update_role_handler
    ),
    components(
        schemas(
            crate::web::auth::SignupRequest,
            crate::web::auth::LoginRequest,
            crate::web::auth::AuthResponse,
            crate::web::courses::CourseResponse,
            crate::web::courses::CourseListResponse,
            crate::web::courses::LectureResponse,
            crate::web::courses::LectureListResponse,
            crate::web::courses::CheckoutResponse,
            crate::web::courses::VerifyRequest,
            crate::web::progress::ProgressResponse,
            crate::web::admin::StatsResponse,
            crate::web::admin::UserResponse,
            crate::web::admin::UserListResponse
        )
    ),
    tags(
        (name = "Course Marketplace API", description = "Courses, checkout, progress tracking and admin operations.")
    )
)]
pub struct ApiDoc;
