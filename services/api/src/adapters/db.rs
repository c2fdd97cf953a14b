//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `MarketStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Queries are checked at runtime rather than via the compile-time macros so the
//! service builds without a live `DATABASE_URL`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coursehub_core::domain::{
    AuthSession, Course, Lecture, MediaAsset, Progress, Role, User, UserCredentials,
};
use coursehub_core::ports::{
    MarketStore, NewCourse, NewLecture, NewPayment, PortError, PortResult,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `MarketStore` port.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new `PgStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn parse_role(raw: &str) -> PortResult<Role> {
    raw.parse::<Role>().map_err(PortError::Unexpected)
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    name: String,
    email: String,
    role: String,
    subscriptions: Vec<Uuid>,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> PortResult<User> {
        Ok(User {
            id: self.id,
            name: self.name,
            email: self.email,
            role: parse_role(&self.role)?,
            subscriptions: self.subscriptions,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: Uuid,
    email: String,
    hashed_password: String,
    role: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> PortResult<UserCredentials> {
        Ok(UserCredentials {
            id: self.id,
            email: self.email,
            hashed_password: self.hashed_password,
            role: parse_role(&self.role)?,
        })
    }
}

#[derive(FromRow)]
struct AuthSessionRecord {
    id: String,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}
impl AuthSessionRecord {
    fn to_domain(self) -> AuthSession {
        AuthSession {
            id: self.id,
            user_id: self.user_id,
            expires_at: self.expires_at,
        }
    }
}

#[derive(FromRow)]
struct CourseRecord {
    id: Uuid,
    title: String,
    description: String,
    category: String,
    created_by: String,
    price: f64,
    duration: i32,
    image_url: Option<String>,
    image_key: Option<String>,
    created_at: DateTime<Utc>,
}
impl CourseRecord {
    fn to_domain(self) -> Course {
        Course {
            id: self.id,
            title: self.title,
            description: self.description,
            category: self.category,
            created_by: self.created_by,
            price: self.price,
            duration: self.duration,
            image: zip_asset(self.image_url, self.image_key),
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct LectureRecord {
    id: Uuid,
    course_id: Uuid,
    title: String,
    description: String,
    video_url: Option<String>,
    video_key: Option<String>,
    created_at: DateTime<Utc>,
}
impl LectureRecord {
    fn to_domain(self) -> Lecture {
        Lecture {
            id: self.id,
            course_id: self.course_id,
            title: self.title,
            description: self.description,
            video: zip_asset(self.video_url, self.video_key),
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct ProgressRecord {
    id: Uuid,
    user_id: Uuid,
    course_id: Uuid,
    completed_lectures: Vec<Uuid>,
    created_at: DateTime<Utc>,
}
impl ProgressRecord {
    fn to_domain(self) -> Progress {
        Progress {
            id: self.id,
            user_id: self.user_id,
            course_id: self.course_id,
            completed_lectures: self.completed_lectures,
            created_at: self.created_at,
        }
    }
}

/// Media columns come in url/key pairs; an asset exists only when both are set.
fn zip_asset(url: Option<String>, key: Option<String>) -> Option<MediaAsset> {
    match (url, key) {
        (Some(url), Some(key)) => Some(MediaAsset { url, key }),
        _ => None,
    }
}

const COURSE_COLUMNS: &str =
    "id, title, description, category, created_by, price, duration, image_url, image_key, created_at";
const LECTURE_COLUMNS: &str =
    "id, course_id, title, description, video_url, video_key, created_at";

//=========================================================================================
// `MarketStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl MarketStore for PgStore {
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        hashed_password: &str,
        role: Role,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (id, name, email, hashed_password, role) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, name, email, role, subscriptions, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(hashed_password)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                PortError::AlreadyExists(format!("A user with email {} already exists", email))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;

        record.to_domain()
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, name, email, role, subscriptions, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
            _ => PortError::Unexpected(e.to_string()),
        })?;

        record.to_domain()
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, email, hashed_password, role FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("User with email {} not found", email))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;

        record.to_domain()
    }

    async fn list_users_except(&self, user_id: Uuid) -> PortResult<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>(
            "SELECT id, name, email, role, subscriptions, created_at FROM users \
             WHERE id <> $1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        records.into_iter().map(UserRecord::to_domain).collect()
    }

    async fn set_user_role(&self, user_id: Uuid, role: Role) -> PortResult<()> {
        let result = sqlx::query("UPDATE users SET role = $2 WHERE id = $1")
            .bind(user_id)
            .bind(role.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("User {} not found", user_id)));
        }
        Ok(())
    }

    async fn count_users(&self) -> PortResult<u64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(count as u64)
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let record = sqlx::query_as::<_, AuthSessionRecord>(
            "SELECT id, user_id, expires_at FROM auth_sessions WHERE id = $1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let session = record
            .map(AuthSessionRecord::to_domain)
            .ok_or(PortError::Unauthorized)?;
        if session.expires_at <= Utc::now() {
            return Err(PortError::Unauthorized);
        }
        Ok(session.user_id)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn create_course(&self, new: NewCourse) -> PortResult<Course> {
        let record = sqlx::query_as::<_, CourseRecord>(&format!(
            "INSERT INTO courses (id, title, description, category, created_by, price, duration, image_url, image_key) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COURSE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.category)
        .bind(&new.created_by)
        .bind(new.price)
        .bind(new.duration)
        .bind(new.image.as_ref().map(|asset| asset.url.as_str()))
        .bind(new.image.as_ref().map(|asset| asset.key.as_str()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(record.to_domain())
    }

    async fn get_course(&self, course_id: Uuid) -> PortResult<Course> {
        let record = sqlx::query_as::<_, CourseRecord>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"
        ))
        .bind(course_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Course {} not found", course_id))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;

        Ok(record.to_domain())
    }

    async fn list_courses(&self) -> PortResult<Vec<Course>> {
        let records = sqlx::query_as::<_, CourseRecord>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(records.into_iter().map(CourseRecord::to_domain).collect())
    }

    async fn list_courses_by_ids(&self, ids: &[Uuid]) -> PortResult<Vec<Course>> {
        let records = sqlx::query_as::<_, CourseRecord>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE id = ANY($1) ORDER BY created_at ASC"
        ))
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(records.into_iter().map(CourseRecord::to_domain).collect())
    }

    async fn delete_course(&self, course_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(course_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Course {} not found", course_id)));
        }
        Ok(())
    }

    async fn count_courses(&self) -> PortResult<u64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM courses")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(count as u64)
    }

    async fn create_lecture(&self, new: NewLecture) -> PortResult<Lecture> {
        let record = sqlx::query_as::<_, LectureRecord>(&format!(
            "INSERT INTO lectures (id, course_id, title, description, video_url, video_key) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {LECTURE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.course_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.video.as_ref().map(|asset| asset.url.as_str()))
        .bind(new.video.as_ref().map(|asset| asset.key.as_str()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                PortError::NotFound(format!("Course {} not found", new.course_id))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;

        Ok(record.to_domain())
    }

    async fn get_lecture(&self, lecture_id: Uuid) -> PortResult<Lecture> {
        let record = sqlx::query_as::<_, LectureRecord>(&format!(
            "SELECT {LECTURE_COLUMNS} FROM lectures WHERE id = $1"
        ))
        .bind(lecture_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Lecture {} not found", lecture_id))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;

        Ok(record.to_domain())
    }

    async fn list_lectures(&self, course_id: Uuid) -> PortResult<Vec<Lecture>> {
        let records = sqlx::query_as::<_, LectureRecord>(&format!(
            "SELECT {LECTURE_COLUMNS} FROM lectures WHERE course_id = $1 ORDER BY created_at ASC"
        ))
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(records.into_iter().map(LectureRecord::to_domain).collect())
    }

    async fn delete_lecture(&self, lecture_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM lectures WHERE id = $1")
            .bind(lecture_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Lecture {} not found", lecture_id)));
        }
        Ok(())
    }

    async fn count_lectures(&self) -> PortResult<u64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM lectures")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(count as u64)
    }

    async fn count_course_lectures(&self, course_id: Uuid) -> PortResult<u64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM lectures WHERE course_id = $1")
                .bind(course_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(count as u64)
    }

    async fn record_payment(&self, new: NewPayment) -> PortResult<bool> {
        // The UNIQUE constraint on session_id is what makes concurrent
        // verifications of one session settle on exactly one record.
        let result = sqlx::query(
            "INSERT INTO payments (id, session_id, status, amount_total, customer_email) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (session_id) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(&new.session_id)
        .bind(new.status.as_str())
        .bind(new.amount_total)
        .bind(&new.customer_email)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn is_subscribed(&self, user_id: Uuid, course_id: Uuid) -> PortResult<bool> {
        let subscribed =
            sqlx::query_scalar::<_, bool>("SELECT $2 = ANY(subscriptions) FROM users WHERE id = $1")
                .bind(user_id)
                .bind(course_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| match e {
                    sqlx::Error::RowNotFound => {
                        PortError::NotFound(format!("User {} not found", user_id))
                    }
                    _ => PortError::Unexpected(e.to_string()),
                })?;
        Ok(subscribed)
    }

    async fn grant_course_access(&self, user_id: Uuid, course_id: Uuid) -> PortResult<()> {
        // Subscription membership and the progress record must appear
        // together, so both writes share one transaction.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let result = sqlx::query(
            "UPDATE users SET subscriptions = array_append(subscriptions, $2) \
             WHERE id = $1 AND NOT ($2 = ANY(subscriptions))",
        )
        .bind(user_id)
        .bind(course_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Zero rows means either an already-subscribed user (fine) or a
        // missing one (not fine). Tell them apart before committing.
        if result.rows_affected() == 0 {
            let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
            if !exists {
                return Err(PortError::NotFound(format!("User {} not found", user_id)));
            }
        }

        sqlx::query(
            "INSERT INTO progress (id, user_id, course_id) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, course_id) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(course_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn remove_course_from_subscriptions(&self, course_id: Uuid) -> PortResult<()> {
        sqlx::query(
            "UPDATE users SET subscriptions = array_remove(subscriptions, $1) \
             WHERE $1 = ANY(subscriptions)",
        )
        .bind(course_id)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn get_progress(&self, user_id: Uuid, course_id: Uuid) -> PortResult<Progress> {
        let record = sqlx::query_as::<_, ProgressRecord>(
            "SELECT id, user_id, course_id, completed_lectures, created_at FROM progress \
             WHERE user_id = $1 AND course_id = $2",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("No progress for course {}", course_id))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;

        Ok(record.to_domain())
    }

    async fn add_completed_lecture(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        lecture_id: Uuid,
    ) -> PortResult<()> {
        // Guarded append keeps the completed set duplicate-free; zero rows
        // affected just means the lecture was already marked.
        sqlx::query(
            "UPDATE progress SET completed_lectures = array_append(completed_lectures, $3) \
             WHERE user_id = $1 AND course_id = $2 AND NOT ($3 = ANY(completed_lectures))",
        )
        .bind(user_id)
        .bind(course_id)
        .bind(lecture_id)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }
}
