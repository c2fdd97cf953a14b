//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use coursehub_core::admin::AdminOps;
use coursehub_core::entitlement::EntitlementService;
use coursehub_core::ports::{MarketStore, MediaStore};
use coursehub_core::progress::ProgressTracker;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MarketStore>,
    pub media: Arc<dyn MediaStore>,
    pub entitlements: Arc<EntitlementService>,
    pub progress: Arc<ProgressTracker>,
    pub admin: Arc<AdminOps>,
    pub config: Arc<Config>,
}
