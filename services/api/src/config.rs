//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub frontend_url: String,
    pub stripe_secret_key: String,
    pub checkout_currency: String,
    pub s3_bucket: String,
    pub s3_endpoint: Option<String>,
    pub s3_public_base_url: String,
    pub superadmin_email: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Checkout Settings ---
        // Redirect targets are built from the frontend origin, so a trailing
        // slash here would produce double slashes in every URL we hand out.
        let frontend_url = std::env::var("FRONTEND_URL")
            .map_err(|_| ConfigError::MissingVar("FRONTEND_URL".to_string()))?
            .trim_end_matches('/')
            .to_string();

        let stripe_secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| ConfigError::MissingVar("STRIPE_SECRET_KEY".to_string()))?;

        let checkout_currency =
            std::env::var("CHECKOUT_CURRENCY").unwrap_or_else(|_| "inr".to_string());

        // --- Load Blob Store Settings ---
        let s3_bucket = std::env::var("S3_BUCKET")
            .map_err(|_| ConfigError::MissingVar("S3_BUCKET".to_string()))?;
        let s3_endpoint = std::env::var("S3_ENDPOINT").ok();
        let s3_public_base_url = std::env::var("S3_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("https://{}.s3.amazonaws.com", s3_bucket));

        // --- Load Role Bootstrap Settings ---
        let superadmin_email = std::env::var("SUPERADMIN_EMAIL").ok();

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            frontend_url,
            stripe_secret_key,
            checkout_currency,
            s3_bucket,
            s3_endpoint,
            s3_public_base_url,
            superadmin_email,
        })
    }
}
