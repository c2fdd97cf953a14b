//! crates/coursehub_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Course, Lecture, MediaAsset, PaymentStatus, Progress, Role, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Upstream service failure: {0}")]
    Upstream(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Store-facing Parameter Types
//=========================================================================================

/// Column values for a course about to be created.
#[derive(Debug, Clone)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
    pub category: String,
    pub created_by: String,
    pub price: f64,
    pub duration: i32,
    pub image: Option<MediaAsset>,
}

#[derive(Debug, Clone)]
pub struct NewLecture {
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub video: Option<MediaAsset>,
}

/// A settled payment as reported by the gateway, keyed by its session id.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub session_id: String,
    pub status: PaymentStatus,
    pub amount_total: i64,
    pub customer_email: Option<String>,
}

//=========================================================================================
// Document Store Port
//=========================================================================================

#[async_trait]
pub trait MarketStore: Send + Sync {
    // --- User Management ---
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        hashed_password: &str,
        role: Role,
    ) -> PortResult<User>;

    async fn get_user(&self, user_id: Uuid) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn list_users_except(&self, user_id: Uuid) -> PortResult<Vec<User>>;

    async fn set_user_role(&self, user_id: Uuid, role: Role) -> PortResult<()>;

    async fn count_users(&self) -> PortResult<u64>;

    // --- Auth Sessions ---
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Courses ---
    async fn create_course(&self, new: NewCourse) -> PortResult<Course>;

    async fn get_course(&self, course_id: Uuid) -> PortResult<Course>;

    async fn list_courses(&self) -> PortResult<Vec<Course>>;

    async fn list_courses_by_ids(&self, ids: &[Uuid]) -> PortResult<Vec<Course>>;

    async fn delete_course(&self, course_id: Uuid) -> PortResult<()>;

    async fn count_courses(&self) -> PortResult<u64>;

    // --- Lectures ---
    async fn create_lecture(&self, new: NewLecture) -> PortResult<Lecture>;

    async fn get_lecture(&self, lecture_id: Uuid) -> PortResult<Lecture>;

    async fn list_lectures(&self, course_id: Uuid) -> PortResult<Vec<Lecture>>;

    async fn delete_lecture(&self, lecture_id: Uuid) -> PortResult<()>;

    async fn count_lectures(&self) -> PortResult<u64>;

    async fn count_course_lectures(&self, course_id: Uuid) -> PortResult<u64>;

    // --- Payments ---
    /// Records a payment unless one already exists for the same gateway
    /// session id. Returns `false` when a record was already present.
    ///
    /// Implementations must back this with a store-level uniqueness
    /// guarantee on the session id; two concurrent verifications of one
    /// session can both pass any application-level existence check.
    async fn record_payment(&self, new: NewPayment) -> PortResult<bool>;

    // --- Entitlements & Progress ---
    async fn is_subscribed(&self, user_id: Uuid, course_id: Uuid) -> PortResult<bool>;

    /// Adds the course to the user's subscription set and creates the empty
    /// progress record for the pair, as one atomic unit. Both halves are
    /// idempotent: re-granting an existing entitlement is a no-op.
    async fn grant_course_access(&self, user_id: Uuid, course_id: Uuid) -> PortResult<()>;

    /// Strips the course id from every user's subscription set.
    async fn remove_course_from_subscriptions(&self, course_id: Uuid) -> PortResult<()>;

    async fn get_progress(&self, user_id: Uuid, course_id: Uuid) -> PortResult<Progress>;

    /// Appends a lecture to the completed set unless it is already there.
    async fn add_completed_lecture(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        lecture_id: Uuid,
    ) -> PortResult<()>;
}

//=========================================================================================
// Media Blob Store Port
//=========================================================================================

/// Distinguishes uploads so the blob store can pick content handling and
/// the matching deletion endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// A file about to be pushed to the blob store.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub data: Bytes,
    pub file_name: String,
    pub content_type: String,
    pub kind: MediaKind,
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Uploads a blob, returning its public URL and the opaque deletion key.
    async fn upload(&self, upload: MediaUpload) -> PortResult<MediaAsset>;

    /// Deletes a previously uploaded blob. Cascading callers treat failures
    /// here as best-effort.
    async fn delete(&self, key: &str, kind: MediaKind) -> PortResult<()>;
}

//=========================================================================================
// Payment Gateway Port
//=========================================================================================

/// Everything the gateway needs to open a checkout session for one course.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    /// Price in the gateway's minor currency units.
    pub unit_amount: i64,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// A freshly created gateway session: where to send the user, and the id to
/// verify with afterwards.
#[derive(Debug, Clone)]
pub struct GatewaySession {
    pub id: String,
    pub url: String,
}

/// The gateway's view of an existing session.
#[derive(Debug, Clone)]
pub struct SessionDetails {
    pub status: PaymentStatus,
    pub amount_total: i64,
    pub customer_email: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_session(&self, request: CheckoutRequest) -> PortResult<GatewaySession>;

    /// Fetches a session by id; `None` when the gateway does not know it.
    async fn retrieve_session(&self, session_id: &str) -> PortResult<Option<SessionDetails>>;
}
