//! crates/coursehub_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Access tier of a user account.
///
/// `Superadmin` passes every admin gate and is additionally the only role
/// allowed to change other users' roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
    Superadmin,
}

impl Role {
    /// Whether this role clears admin-only gates.
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin | Role::Superadmin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Superadmin => "superadmin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "superadmin" => Ok(Role::Superadmin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// A user account together with the set of course ids it has purchased.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Subscribed course ids. Order carries no meaning; only membership does.
    pub subscriptions: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: Uuid,
    pub email: String,
    pub hashed_password: String,
    pub role: Role,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// A previously uploaded media object: the public URL to serve it from,
/// plus the opaque key needed to delete it from the blob store again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    pub url: String,
    pub key: String,
}

#[derive(Debug, Clone)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub created_by: String,
    /// Price in major currency units; converted to the gateway's minor
    /// units only at checkout time.
    pub price: f64,
    /// Total length in minutes.
    pub duration: i32,
    pub image: Option<MediaAsset>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Lecture {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub video: Option<MediaAsset>,
    pub created_at: DateTime<Utc>,
}

/// Settlement state the payment gateway reports for a checkout session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Paid,
    Unpaid,
    NoPaymentRequired,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Paid => "paid",
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::NoPaymentRequired => "no_payment_required",
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paid" => Ok(PaymentStatus::Paid),
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "no_payment_required" => Ok(PaymentStatus::NoPaymentRequired),
            other => Err(format!("unknown payment status '{other}'")),
        }
    }
}

/// A recorded gateway payment. Append-mostly; at most one record ever
/// exists per gateway session id.
#[derive(Debug, Clone)]
pub struct Payment {
    pub id: Uuid,
    /// The gateway checkout session this payment settles. Unique business key.
    pub session_id: String,
    pub status: PaymentStatus,
    /// Total charged, in minor currency units.
    pub amount_total: i64,
    pub customer_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Per-user, per-course record of which lectures have been completed.
/// Created exactly once when the entitlement is granted; never deleted by
/// the normal flow.
#[derive(Debug, Clone)]
pub struct Progress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub completed_lectures: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}
