//! crates/coursehub_core/tests/support/mod.rs
//!
//! In-memory fakes for the service ports, letting the entitlement,
//! progress, and admin flows run without a real database, blob store, or
//! payment gateway.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use coursehub_core::admin::AdminOps;
use coursehub_core::domain::{
    Course, Lecture, MediaAsset, Payment, PaymentStatus, Progress, Role, User, UserCredentials,
};
use coursehub_core::entitlement::{CheckoutUrls, EntitlementService};
use coursehub_core::ports::{
    CheckoutRequest, GatewaySession, MarketStore, MediaKind, MediaStore, MediaUpload, NewCourse,
    NewLecture, NewPayment, PaymentGateway, PortError, PortResult, SessionDetails,
};
use coursehub_core::progress::ProgressTracker;

//=========================================================================================
// In-memory Document Store
//=========================================================================================

#[derive(Default)]
pub struct InMemoryStore {
    pub users: Mutex<HashMap<Uuid, User>>,
    pub credentials: Mutex<HashMap<String, UserCredentials>>,
    pub auth_sessions: Mutex<HashMap<String, Uuid>>,
    pub courses: Mutex<HashMap<Uuid, Course>>,
    pub lectures: Mutex<HashMap<Uuid, Lecture>>,
    pub payments: Mutex<Vec<Payment>>,
    pub progress: Mutex<Vec<Progress>>,
}

impl InMemoryStore {
    pub fn seed_user(&self, role: Role) -> Uuid {
        let id = Uuid::new_v4();
        let user = User {
            id,
            name: format!("user-{id}"),
            email: format!("{id}@example.test"),
            role,
            subscriptions: Vec::new(),
            created_at: Utc::now(),
        };
        self.users.lock().unwrap().insert(id, user);
        id
    }

    pub fn seed_course(&self, title: &str, price: f64) -> Uuid {
        self.insert_course(title, price, None)
    }

    pub fn seed_course_with_image(&self, title: &str, price: f64, key: &str) -> Uuid {
        self.insert_course(title, price, Some(asset(key)))
    }

    fn insert_course(&self, title: &str, price: f64, image: Option<MediaAsset>) -> Uuid {
        let id = Uuid::new_v4();
        let course = Course {
            id,
            title: title.to_string(),
            description: format!("{title} description"),
            category: "engineering".to_string(),
            created_by: "instructor".to_string(),
            price,
            duration: 90,
            image,
            created_at: Utc::now(),
        };
        self.courses.lock().unwrap().insert(id, course);
        id
    }

    pub fn seed_lecture(&self, course_id: Uuid, title: &str) -> Uuid {
        self.insert_lecture(course_id, title, None)
    }

    pub fn seed_lecture_with_video(&self, course_id: Uuid, title: &str, key: &str) -> Uuid {
        self.insert_lecture(course_id, title, Some(asset(key)))
    }

    fn insert_lecture(&self, course_id: Uuid, title: &str, video: Option<MediaAsset>) -> Uuid {
        let id = Uuid::new_v4();
        let lecture = Lecture {
            id,
            course_id,
            title: title.to_string(),
            description: format!("{title} description"),
            video,
            created_at: Utc::now(),
        };
        self.lectures.lock().unwrap().insert(id, lecture);
        id
    }

    pub fn payment_count(&self, session_id: &str) -> usize {
        self.payments
            .lock()
            .unwrap()
            .iter()
            .filter(|payment| payment.session_id == session_id)
            .count()
    }

    pub fn progress_for(&self, user_id: Uuid, course_id: Uuid) -> Option<Progress> {
        self.progress
            .lock()
            .unwrap()
            .iter()
            .find(|record| record.user_id == user_id && record.course_id == course_id)
            .cloned()
    }

    pub fn subscriptions_of(&self, user_id: Uuid) -> Vec<Uuid> {
        self.users
            .lock()
            .unwrap()
            .get(&user_id)
            .map(|user| user.subscriptions.clone())
            .unwrap_or_default()
    }

    pub fn role_of(&self, user_id: Uuid) -> Role {
        self.users.lock().unwrap()[&user_id].role
    }
}

fn asset(key: &str) -> MediaAsset {
    MediaAsset {
        url: format!("https://cdn.example.test/{key}"),
        key: key.to_string(),
    }
}

#[async_trait]
impl MarketStore for InMemoryStore {
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        hashed_password: &str,
        role: Role,
    ) -> PortResult<User> {
        let id = Uuid::new_v4();
        let user = User {
            id,
            name: name.to_string(),
            email: email.to_string(),
            role,
            subscriptions: Vec::new(),
            created_at: Utc::now(),
        };
        self.credentials.lock().unwrap().insert(
            email.to_string(),
            UserCredentials {
                id,
                email: email.to_string(),
                hashed_password: hashed_password.to_string(),
                role,
            },
        );
        self.users.lock().unwrap().insert(id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        self.users
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("user {user_id}")))
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.credentials
            .lock()
            .unwrap()
            .get(email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("user {email}")))
    }

    async fn list_users_except(&self, user_id: Uuid) -> PortResult<Vec<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .filter(|user| user.id != user_id)
            .cloned()
            .collect())
    }

    async fn set_user_role(&self, user_id: Uuid, role: Role) -> PortResult<()> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| PortError::NotFound(format!("user {user_id}")))?;
        user.role = role;
        Ok(())
    }

    async fn count_users(&self) -> PortResult<u64> {
        Ok(self.users.lock().unwrap().len() as u64)
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        _expires_at: chrono::DateTime<Utc>,
    ) -> PortResult<()> {
        self.auth_sessions
            .lock()
            .unwrap()
            .insert(session_id.to_string(), user_id);
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        self.auth_sessions
            .lock()
            .unwrap()
            .get(session_id)
            .copied()
            .ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.auth_sessions.lock().unwrap().remove(session_id);
        Ok(())
    }

    async fn create_course(&self, new: NewCourse) -> PortResult<Course> {
        let course = Course {
            id: Uuid::new_v4(),
            title: new.title,
            description: new.description,
            category: new.category,
            created_by: new.created_by,
            price: new.price,
            duration: new.duration,
            image: new.image,
            created_at: Utc::now(),
        };
        self.courses.lock().unwrap().insert(course.id, course.clone());
        Ok(course)
    }

    async fn get_course(&self, course_id: Uuid) -> PortResult<Course> {
        self.courses
            .lock()
            .unwrap()
            .get(&course_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("course {course_id}")))
    }

    async fn list_courses(&self) -> PortResult<Vec<Course>> {
        Ok(self.courses.lock().unwrap().values().cloned().collect())
    }

    async fn list_courses_by_ids(&self, ids: &[Uuid]) -> PortResult<Vec<Course>> {
        let courses = self.courses.lock().unwrap();
        Ok(ids.iter().filter_map(|id| courses.get(id).cloned()).collect())
    }

    async fn delete_course(&self, course_id: Uuid) -> PortResult<()> {
        self.courses.lock().unwrap().remove(&course_id);
        Ok(())
    }

    async fn count_courses(&self) -> PortResult<u64> {
        Ok(self.courses.lock().unwrap().len() as u64)
    }

    async fn create_lecture(&self, new: NewLecture) -> PortResult<Lecture> {
        let lecture = Lecture {
            id: Uuid::new_v4(),
            course_id: new.course_id,
            title: new.title,
            description: new.description,
            video: new.video,
            created_at: Utc::now(),
        };
        self.lectures
            .lock()
            .unwrap()
            .insert(lecture.id, lecture.clone());
        Ok(lecture)
    }

    async fn get_lecture(&self, lecture_id: Uuid) -> PortResult<Lecture> {
        self.lectures
            .lock()
            .unwrap()
            .get(&lecture_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("lecture {lecture_id}")))
    }

    async fn list_lectures(&self, course_id: Uuid) -> PortResult<Vec<Lecture>> {
        Ok(self
            .lectures
            .lock()
            .unwrap()
            .values()
            .filter(|lecture| lecture.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn delete_lecture(&self, lecture_id: Uuid) -> PortResult<()> {
        self.lectures.lock().unwrap().remove(&lecture_id);
        Ok(())
    }

    async fn count_lectures(&self) -> PortResult<u64> {
        Ok(self.lectures.lock().unwrap().len() as u64)
    }

    async fn count_course_lectures(&self, course_id: Uuid) -> PortResult<u64> {
        Ok(self
            .lectures
            .lock()
            .unwrap()
            .values()
            .filter(|lecture| lecture.course_id == course_id)
            .count() as u64)
    }

    async fn record_payment(&self, new: NewPayment) -> PortResult<bool> {
        let mut payments = self.payments.lock().unwrap();
        if payments
            .iter()
            .any(|payment| payment.session_id == new.session_id)
        {
            return Ok(false);
        }
        payments.push(Payment {
            id: Uuid::new_v4(),
            session_id: new.session_id,
            status: new.status,
            amount_total: new.amount_total,
            customer_email: new.customer_email,
            created_at: Utc::now(),
        });
        Ok(true)
    }

    async fn is_subscribed(&self, user_id: Uuid, course_id: Uuid) -> PortResult<bool> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .get(&user_id)
            .map(|user| user.subscriptions.contains(&course_id))
            .unwrap_or(false))
    }

    async fn grant_course_access(&self, user_id: Uuid, course_id: Uuid) -> PortResult<()> {
        {
            let mut users = self.users.lock().unwrap();
            let user = users
                .get_mut(&user_id)
                .ok_or_else(|| PortError::NotFound(format!("user {user_id}")))?;
            if !user.subscriptions.contains(&course_id) {
                user.subscriptions.push(course_id);
            }
        }
        let mut progress = self.progress.lock().unwrap();
        let exists = progress
            .iter()
            .any(|record| record.user_id == user_id && record.course_id == course_id);
        if !exists {
            progress.push(Progress {
                id: Uuid::new_v4(),
                user_id,
                course_id,
                completed_lectures: Vec::new(),
                created_at: Utc::now(),
            });
        }
        Ok(())
    }

    async fn remove_course_from_subscriptions(&self, course_id: Uuid) -> PortResult<()> {
        for user in self.users.lock().unwrap().values_mut() {
            user.subscriptions.retain(|id| *id != course_id);
        }
        Ok(())
    }

    async fn get_progress(&self, user_id: Uuid, course_id: Uuid) -> PortResult<Progress> {
        self.progress_for(user_id, course_id)
            .ok_or_else(|| PortError::NotFound(format!("progress for course {course_id}")))
    }

    async fn add_completed_lecture(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        lecture_id: Uuid,
    ) -> PortResult<()> {
        let mut progress = self.progress.lock().unwrap();
        let record = progress
            .iter_mut()
            .find(|record| record.user_id == user_id && record.course_id == course_id)
            .ok_or_else(|| PortError::NotFound(format!("progress for course {course_id}")))?;
        if !record.completed_lectures.contains(&lecture_id) {
            record.completed_lectures.push(lecture_id);
        }
        Ok(())
    }
}

//=========================================================================================
// Recording Media Store
//=========================================================================================

/// Records uploads and deletions; individual keys can be told to fail so
/// the cascade's best-effort policy is observable.
#[derive(Default)]
pub struct RecordingMedia {
    pub deleted: Mutex<Vec<(String, MediaKind)>>,
    fail_keys: Mutex<HashSet<String>>,
}

impl RecordingMedia {
    pub fn fail_on(&self, key: &str) {
        self.fail_keys.lock().unwrap().insert(key.to_string());
    }

    pub fn deleted_keys(&self) -> Vec<String> {
        self.deleted
            .lock()
            .unwrap()
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }
}

#[async_trait]
impl MediaStore for RecordingMedia {
    async fn upload(&self, upload: MediaUpload) -> PortResult<MediaAsset> {
        Ok(asset(&upload.file_name))
    }

    async fn delete(&self, key: &str, kind: MediaKind) -> PortResult<()> {
        if self.fail_keys.lock().unwrap().contains(key) {
            return Err(PortError::Upstream(format!(
                "blob store refused to delete {key}"
            )));
        }
        self.deleted.lock().unwrap().push((key.to_string(), kind));
        Ok(())
    }
}

//=========================================================================================
// Fake Payment Gateway
//=========================================================================================

#[derive(Default)]
pub struct FakeGateway {
    sessions: Mutex<HashMap<String, SessionDetails>>,
    pub created: Mutex<Vec<CheckoutRequest>>,
}

impl FakeGateway {
    pub fn add_session(&self, session_id: &str, status: PaymentStatus, amount_total: i64) {
        self.sessions.lock().unwrap().insert(
            session_id.to_string(),
            SessionDetails {
                status,
                amount_total,
                customer_email: Some("buyer@example.test".to_string()),
            },
        );
    }

    pub fn created_requests(&self) -> Vec<CheckoutRequest> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_session(&self, request: CheckoutRequest) -> PortResult<GatewaySession> {
        let mut created = self.created.lock().unwrap();
        created.push(request);
        Ok(GatewaySession {
            id: format!("cs_test_{}", created.len()),
            url: "https://checkout.example.test/pay".to_string(),
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> PortResult<Option<SessionDetails>> {
        Ok(self.sessions.lock().unwrap().get(session_id).cloned())
    }
}

//=========================================================================================
// Service Builders
//=========================================================================================

pub fn entitlements(store: &Arc<InMemoryStore>, gateway: &Arc<FakeGateway>) -> EntitlementService {
    EntitlementService::new(
        store.clone(),
        gateway.clone(),
        CheckoutUrls {
            success: "https://app.example.test/payment-success?session_id={CHECKOUT_SESSION_ID}"
                .to_string(),
            cancel: "https://app.example.test/payment/failed".to_string(),
        },
        "inr".to_string(),
    )
}

pub fn tracker(store: &Arc<InMemoryStore>) -> ProgressTracker {
    ProgressTracker::new(store.clone())
}

pub fn admin(store: &Arc<InMemoryStore>, media: &Arc<RecordingMedia>) -> AdminOps {
    AdminOps::new(store.clone(), media.clone())
}
