//! crates/coursehub_core/src/progress.rs
//!
//! Per-user completion tracking for subscribed courses.

use std::sync::Arc;

use uuid::Uuid;

use crate::ports::{MarketStore, PortError, PortResult};

/// Completion summary for one (user, course) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressReport {
    /// Completed over total, scaled to 0..=100. A course with no lectures
    /// reads as 0 rather than dividing by zero.
    pub percentage: f64,
    pub completed_lectures: u64,
    pub total_lectures: u64,
}

pub struct ProgressTracker {
    store: Arc<dyn MarketStore>,
}

impl ProgressTracker {
    pub fn new(store: Arc<dyn MarketStore>) -> Self {
        Self { store }
    }

    /// Marks a lecture of a subscribed course as completed. Idempotent:
    /// re-marking a lecture leaves the completed set unchanged.
    ///
    /// The progress record only exists once entitlement has been granted,
    /// so its absence doubles as the access check. The lecture must belong
    /// to the course it is reported against.
    pub async fn mark_complete(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        lecture_id: Uuid,
    ) -> PortResult<()> {
        self.store.get_progress(user_id, course_id).await?;

        let lecture = self.store.get_lecture(lecture_id).await?;
        if lecture.course_id != course_id {
            return Err(PortError::InvalidInput(format!(
                "lecture {lecture_id} does not belong to course {course_id}"
            )));
        }

        self.store
            .add_completed_lecture(user_id, course_id, lecture_id)
            .await
    }

    /// Reports completion against the live lecture count of the course.
    pub async fn get_progress(&self, user_id: Uuid, course_id: Uuid) -> PortResult<ProgressReport> {
        let progress = self.store.get_progress(user_id, course_id).await?;
        let total = self.store.count_course_lectures(course_id).await?;
        let completed = progress.completed_lectures.len() as u64;

        Ok(ProgressReport {
            percentage: completion_percentage(completed, total),
            completed_lectures: completed,
            total_lectures: total,
        })
    }
}

fn completion_percentage(completed: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    completed as f64 * 100.0 / total as f64
}
