//! crates/coursehub_core/src/admin.rs
//!
//! Administrative lifecycle operations: course and lecture management with
//! cascading cleanup, platform statistics, and role changes.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{Course, Lecture, Role, User};
use crate::ports::{
    MarketStore, MediaKind, MediaStore, NewCourse, NewLecture, PortError, PortResult,
};

/// Point-in-time platform counts. The three reads are independent; no
/// consistency is guaranteed across them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformStats {
    pub total_courses: u64,
    pub total_lectures: u64,
    pub total_users: u64,
}

pub struct AdminOps {
    store: Arc<dyn MarketStore>,
    media: Arc<dyn MediaStore>,
}

impl AdminOps {
    pub fn new(store: Arc<dyn MarketStore>, media: Arc<dyn MediaStore>) -> Self {
        Self { store, media }
    }

    pub async fn create_course(&self, new: NewCourse) -> PortResult<Course> {
        let course = self.store.create_course(new).await?;
        info!(course_id = %course.id, title = %course.title, "course created");
        Ok(course)
    }

    /// Adds a lecture to an existing course.
    pub async fn add_lecture(&self, new: NewLecture) -> PortResult<Lecture> {
        // Surfaces NotFound for a dangling course reference before writing.
        self.store.get_course(new.course_id).await?;
        self.store.create_lecture(new).await
    }

    /// Deletes one lecture, releasing its video blob first.
    pub async fn delete_lecture(&self, lecture_id: Uuid) -> PortResult<()> {
        let lecture = self.store.get_lecture(lecture_id).await?;
        if let Some(video) = &lecture.video {
            self.release_blob(&video.key, MediaKind::Video).await;
        }
        self.store.delete_lecture(lecture_id).await
    }

    /// Deletes a course and everything hanging off it: every lecture and
    /// its video blob, the course image, and the course id inside user
    /// subscription sets.
    ///
    /// Blob releases are best-effort: an orphaned blob is a lesser failure
    /// than an orphaned record reference, so those failures are logged and
    /// the record deletions continue regardless.
    pub async fn delete_course(&self, course_id: Uuid) -> PortResult<()> {
        let course = self.store.get_course(course_id).await?;
        let lectures = self.store.list_lectures(course_id).await?;

        // Lectures are independent of each other; clean them up concurrently.
        let deletions = lectures.into_iter().map(|lecture| async move {
            if let Some(video) = &lecture.video {
                self.release_blob(&video.key, MediaKind::Video).await;
            }
            self.store.delete_lecture(lecture.id).await
        });
        for result in join_all(deletions).await {
            result?;
        }

        if let Some(image) = &course.image {
            self.release_blob(&image.key, MediaKind::Image).await;
        }

        self.store.remove_course_from_subscriptions(course_id).await?;
        self.store.delete_course(course_id).await?;
        info!(%course_id, "course deleted");
        Ok(())
    }

    pub async fn stats(&self) -> PortResult<PlatformStats> {
        Ok(PlatformStats {
            total_courses: self.store.count_courses().await?,
            total_lectures: self.store.count_lectures().await?,
            total_users: self.store.count_users().await?,
        })
    }

    /// Lists every user except the caller.
    pub async fn list_users(&self, acting_user_id: Uuid) -> PortResult<Vec<User>> {
        self.store.list_users_except(acting_user_id).await
    }

    /// Toggles a target between `User` and `Admin`.
    ///
    /// Only a superadmin may call this, and a superadmin's own tier can
    /// never be changed here.
    pub async fn update_role(
        &self,
        acting_user_id: Uuid,
        target_user_id: Uuid,
    ) -> PortResult<Role> {
        let actor = self.store.get_user(acting_user_id).await?;
        if actor.role != Role::Superadmin {
            return Err(PortError::Forbidden(
                "only a superadmin can update roles".to_string(),
            ));
        }

        let target = self.store.get_user(target_user_id).await?;
        let next = match target.role {
            Role::User => Role::Admin,
            Role::Admin => Role::User,
            Role::Superadmin => {
                return Err(PortError::InvalidInput(
                    "a superadmin's role cannot be changed".to_string(),
                ))
            }
        };

        self.store.set_user_role(target_user_id, next).await?;
        info!(%target_user_id, role = next.as_str(), "user role updated");
        Ok(next)
    }

    async fn release_blob(&self, key: &str, kind: MediaKind) {
        if let Err(err) = self.media.delete(key, kind).await {
            warn!(key, ?kind, error = %err, "failed to release media blob");
        }
    }
}
