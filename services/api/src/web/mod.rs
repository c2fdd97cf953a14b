pub mod admin;
pub mod auth;
pub mod courses;
pub mod docs;
pub mod middleware;
pub mod progress;
pub mod state;

// Re-export the middleware so the binary that builds the router can layer
// it without reaching into the module tree.
pub use middleware::{require_admin, require_auth};
