//! Integration tests for the checkout and payment-verification flow,
//! driven through in-memory fakes of the store and gateway ports.

mod support;

use std::sync::Arc;

use coursehub_core::domain::{PaymentStatus, Role};
use coursehub_core::entitlement::{CourseAccess, PurchaseOutcome};
use coursehub_core::ports::PortError;
use uuid::Uuid;

use support::{FakeGateway, InMemoryStore};

#[tokio::test]
async fn paid_session_grants_access_and_empty_progress() {
    let store = Arc::new(InMemoryStore::default());
    let gateway = Arc::new(FakeGateway::default());
    gateway.add_session("cs_paid", PaymentStatus::Paid, 49900);
    let service = support::entitlements(&store, &gateway);

    let user_id = store.seed_user(Role::User);
    let course_id = store.seed_course("Rust for Backend Engineers", 499.0);

    let outcome = service
        .verify_payment(user_id, course_id, "cs_paid")
        .await
        .expect("verification succeeds");
    let summary = match outcome {
        PurchaseOutcome::Completed(summary) => summary,
        PurchaseOutcome::Rejected { status } => panic!("rejected with {status:?}"),
    };
    assert_eq!(summary.id, course_id);

    let access = service.check_access(user_id, course_id).await.unwrap();
    assert_eq!(access, CourseAccess::Granted);

    let progress = store
        .progress_for(user_id, course_id)
        .expect("progress record created alongside the subscription");
    assert!(progress.completed_lectures.is_empty());
}

#[tokio::test]
async fn repeated_verification_writes_nothing_twice() {
    let store = Arc::new(InMemoryStore::default());
    let gateway = Arc::new(FakeGateway::default());
    gateway.add_session("cs_retry", PaymentStatus::Paid, 49900);
    let service = support::entitlements(&store, &gateway);

    let user_id = store.seed_user(Role::User);
    let course_id = store.seed_course("Distributed Systems", 499.0);

    let first = service
        .verify_payment(user_id, course_id, "cs_retry")
        .await
        .unwrap();
    let second = service
        .verify_payment(user_id, course_id, "cs_retry")
        .await
        .unwrap();
    assert!(matches!(first, PurchaseOutcome::Completed(_)));
    assert!(matches!(second, PurchaseOutcome::Completed(_)));

    assert_eq!(store.payment_count("cs_retry"), 1);
    assert_eq!(store.subscriptions_of(user_id), vec![course_id]);
    assert_eq!(
        store
            .progress
            .lock()
            .unwrap()
            .iter()
            .filter(|record| record.user_id == user_id && record.course_id == course_id)
            .count(),
        1
    );
}

#[tokio::test]
async fn unpaid_session_is_rejected_without_writes() {
    let store = Arc::new(InMemoryStore::default());
    let gateway = Arc::new(FakeGateway::default());
    gateway.add_session("cs_unpaid", PaymentStatus::Unpaid, 49900);
    let service = support::entitlements(&store, &gateway);

    let user_id = store.seed_user(Role::User);
    let course_id = store.seed_course("Compilers", 499.0);

    let outcome = service
        .verify_payment(user_id, course_id, "cs_unpaid")
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        PurchaseOutcome::Rejected {
            status: PaymentStatus::Unpaid
        }
    ));

    assert_eq!(store.payment_count("cs_unpaid"), 0);
    assert!(store.subscriptions_of(user_id).is_empty());
    assert!(store.progress_for(user_id, course_id).is_none());
}

#[tokio::test]
async fn blank_identifiers_are_invalid_input() {
    let store = Arc::new(InMemoryStore::default());
    let gateway = Arc::new(FakeGateway::default());
    let service = support::entitlements(&store, &gateway);

    let user_id = store.seed_user(Role::User);
    let course_id = store.seed_course("Databases", 499.0);

    let err = service
        .verify_payment(user_id, course_id, "  ")
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::InvalidInput(_)));

    let err = service
        .verify_payment(user_id, Uuid::nil(), "cs_x")
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::InvalidInput(_)));
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let store = Arc::new(InMemoryStore::default());
    let gateway = Arc::new(FakeGateway::default());
    let service = support::entitlements(&store, &gateway);

    let user_id = store.seed_user(Role::User);
    let course_id = store.seed_course("Networking", 499.0);

    let err = service
        .verify_payment(user_id, course_id, "cs_missing")
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::NotFound(_)));
}

#[tokio::test]
async fn vanished_course_fails_after_the_payment_is_recorded() {
    let store = Arc::new(InMemoryStore::default());
    let gateway = Arc::new(FakeGateway::default());
    gateway.add_session("cs_orphan", PaymentStatus::Paid, 49900);
    let service = support::entitlements(&store, &gateway);

    let user_id = store.seed_user(Role::User);
    let course_id = store.seed_course("Operating Systems", 499.0);
    store.courses.lock().unwrap().remove(&course_id);

    let err = service
        .verify_payment(user_id, course_id, "cs_orphan")
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::NotFound(_)));

    // The payment itself settled at the gateway, so its record stays.
    assert_eq!(store.payment_count("cs_orphan"), 1);
    assert!(store.subscriptions_of(user_id).is_empty());
}

#[tokio::test]
async fn checkout_rejects_an_already_owned_course() {
    let store = Arc::new(InMemoryStore::default());
    let gateway = Arc::new(FakeGateway::default());
    gateway.add_session("cs_own", PaymentStatus::Paid, 49900);
    let service = support::entitlements(&store, &gateway);

    let user_id = store.seed_user(Role::User);
    let course_id = store.seed_course("Cryptography", 499.0);
    service
        .verify_payment(user_id, course_id, "cs_own")
        .await
        .unwrap();

    let err = service.create_checkout(user_id, course_id).await.unwrap_err();
    assert!(matches!(err, PortError::AlreadyExists(_)));
    assert!(gateway.created_requests().is_empty());
}

#[tokio::test]
async fn checkout_prices_in_rounded_minor_units() {
    let store = Arc::new(InMemoryStore::default());
    let gateway = Arc::new(FakeGateway::default());
    let service = support::entitlements(&store, &gateway);

    let user_id = store.seed_user(Role::User);
    let course_id = store.seed_course("Numerical Methods", 499.995);

    let session = service.create_checkout(user_id, course_id).await.unwrap();
    assert_eq!(session.course_id, course_id);
    assert!(!session.url.is_empty());

    let requests = gateway.created_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].unit_amount, 50000);
    assert_eq!(requests[0].currency, "inr");
    assert!(requests[0]
        .success_url
        .contains("session_id={CHECKOUT_SESSION_ID}"));
}

#[tokio::test]
async fn admins_pass_the_access_check_without_a_subscription() {
    let store = Arc::new(InMemoryStore::default());
    let gateway = Arc::new(FakeGateway::default());
    let service = support::entitlements(&store, &gateway);

    let course_id = store.seed_course("Queueing Theory", 499.0);
    let admin_id = store.seed_user(Role::Admin);
    let superadmin_id = store.seed_user(Role::Superadmin);
    let user_id = store.seed_user(Role::User);

    assert_eq!(
        service.check_access(admin_id, course_id).await.unwrap(),
        CourseAccess::Granted
    );
    assert_eq!(
        service.check_access(superadmin_id, course_id).await.unwrap(),
        CourseAccess::Granted
    );
    assert_eq!(
        service.check_access(user_id, course_id).await.unwrap(),
        CourseAccess::NotSubscribed
    );
}
