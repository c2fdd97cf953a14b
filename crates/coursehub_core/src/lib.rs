pub mod admin;
pub mod domain;
pub mod entitlement;
pub mod ports;
pub mod progress;

pub use admin::{AdminOps, PlatformStats};
pub use domain::{Course, Lecture, MediaAsset, Payment, PaymentStatus, Progress, Role,User, UserCredentials, AuthSession};
pub use entitlement::{CheckoutSession, CheckoutUrls, CourseAccess, CourseSummary,
    EntitlementService, PurchaseOutcome};
pub use ports::{ MarketStore, MediaKind, MediaStore, PaymentGateway, PortError, PortResult};
pub use progress::{ProgressReport, ProgressTracker};
