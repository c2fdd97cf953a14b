//! crates/coursehub_core/src/entitlement.rs
//!
//! The entitlement flow: deciding who may access a course's lectures,
//! opening checkout sessions, and the idempotent verification step that
//! turns a paid gateway session into a subscription plus an empty progress
//! record.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::PaymentStatus;
use crate::ports::{
    CheckoutRequest, MarketStore, NewPayment, PaymentGateway, PortError, PortResult,
};

//=========================================================================================
// Result Types
//=========================================================================================

/// Externally-configured redirect targets for the hosted checkout page.
#[derive(Debug, Clone)]
pub struct CheckoutUrls {
    pub success: String,
    pub cancel: String,
}

/// Outcome of an access check against one course.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseAccess {
    Granted,
    /// The caller holds no entitlement for this course.
    NotSubscribed,
}

/// A checkout session handed back to the client for redirection.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub session_id: String,
    pub url: String,
    pub course_id: Uuid,
}

/// The public summary of a purchased course returned after verification.
#[derive(Debug, Clone)]
pub struct CourseSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
}

/// Result of a verification run.
///
/// `Rejected` is an ordinary business outcome, not an error: the gateway
/// knows the session but reports it as unsettled.
#[derive(Debug, Clone)]
pub enum PurchaseOutcome {
    Completed(CourseSummary),
    Rejected { status: PaymentStatus },
}

//=========================================================================================
// The Entitlement Service
//=========================================================================================

/// Grants and checks course access. Admin roles always pass; everyone else
/// earns access through a verified gateway payment.
pub struct EntitlementService {
    store: Arc<dyn MarketStore>,
    gateway: Arc<dyn PaymentGateway>,
    urls: CheckoutUrls,
    currency: String,
}

impl EntitlementService {
    pub fn new(
        store: Arc<dyn MarketStore>,
        gateway: Arc<dyn PaymentGateway>,
        urls: CheckoutUrls,
        currency: String,
    ) -> Self {
        Self {
            store,
            gateway,
            urls,
            currency,
        }
    }

    /// Decides whether a user may access a course's lectures: admins always
    /// may, everyone else needs the course in their subscription set.
    pub async fn check_access(&self, user_id: Uuid, course_id: Uuid) -> PortResult<CourseAccess> {
        let user = self.store.get_user(user_id).await?;
        if user.role.is_admin() || user.subscriptions.contains(&course_id) {
            return Ok(CourseAccess::Granted);
        }
        Ok(CourseAccess::NotSubscribed)
    }

    /// Opens a gateway checkout session for a course the user does not own
    /// yet.
    pub async fn create_checkout(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> PortResult<CheckoutSession> {
        let user = self.store.get_user(user_id).await?;
        let course = self.store.get_course(course_id).await?;

        if user.subscriptions.contains(&course.id) {
            return Err(PortError::AlreadyExists(
                "you already own this course".to_string(),
            ));
        }

        let session = self
            .gateway
            .create_session(CheckoutRequest {
                course_id: course.id,
                title: course.title.clone(),
                description: course.description.clone(),
                unit_amount: to_minor_units(course.price),
                currency: self.currency.clone(),
                success_url: self.urls.success.clone(),
                cancel_url: self.urls.cancel.clone(),
            })
            .await?;
        info!(course_id = %course.id, session_id = %session.id, "checkout session created");

        Ok(CheckoutSession {
            session_id: session.id,
            url: session.url,
            course_id: course.id,
        })
    }

    /// Verifies a gateway session and, if it settled, grants the entitlement.
    ///
    /// Safe to call repeatedly for the same session (webhook redelivery, a
    /// user refreshing the success page): the payment record is inserted at
    /// most once, and an existing subscription passes straight through to a
    /// successful result.
    pub async fn verify_payment(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        session_id: &str,
    ) -> PortResult<PurchaseOutcome> {
        // 1. Both identifiers are caller-supplied; reject blanks up front.
        if session_id.trim().is_empty() {
            return Err(PortError::InvalidInput("session id is required".to_string()));
        }
        if course_id.is_nil() {
            return Err(PortError::InvalidInput("course id is required".to_string()));
        }

        // 2. The gateway is the source of truth for the session.
        let details = self
            .gateway
            .retrieve_session(session_id)
            .await?
            .ok_or_else(|| PortError::NotFound(format!("gateway session {session_id}")))?;

        // 3. An unsettled session is reported back, not raised.
        if details.status != PaymentStatus::Paid {
            info!(%session_id, status = details.status.as_str(), "payment not settled");
            return Ok(PurchaseOutcome::Rejected {
                status: details.status,
            });
        }

        // 4. At most one payment record per session id. The store's
        //    uniqueness constraint decides concurrent retries.
        let inserted = self
            .store
            .record_payment(NewPayment {
                session_id: session_id.to_string(),
                status: details.status,
                amount_total: details.amount_total,
                customer_email: details.customer_email.clone(),
            })
            .await?;
        if !inserted {
            debug!(%session_id, "payment already recorded; continuing");
        }

        // 5. The course may have been deleted between checkout and verify.
        let course = self.store.get_course(course_id).await?;

        // 6. Subscription membership and the progress record are created
        //    together; a subscribed user is left untouched.
        if !self.store.is_subscribed(user_id, course.id).await? {
            self.store.grant_course_access(user_id, course.id).await?;
            info!(%user_id, course_id = %course.id, %session_id, "course purchased");
        }

        Ok(PurchaseOutcome::Completed(CourseSummary {
            id: course.id,
            title: course.title,
            description: course.description,
            image_url: course.image.map(|image| image.url),
        }))
    }
}

/// Converts a major-unit price into the gateway's integer minor units.
/// Rounds rather than truncates: `499.995` must become `50000`, not `49999`.
pub fn to_minor_units(price: f64) -> i64 {
    (price * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::to_minor_units;

    #[test]
    fn minor_units_round_instead_of_truncating() {
        assert_eq!(to_minor_units(499.995), 50000);
        assert_eq!(to_minor_units(0.995), 100);
    }

    #[test]
    fn minor_units_scale_exact_prices() {
        assert_eq!(to_minor_units(499.0), 49900);
        assert_eq!(to_minor_units(10.5), 1050);
        assert_eq!(to_minor_units(0.0), 0);
    }
}
