//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{db::PgStore, media::S3MediaStore, payments::StripeGateway},
    config::Config,
    error::ApiError,
    web::{
        admin::{
            add_lecture_handler, create_course_handler, delete_course_handler,
            delete_lecture_handler, list_users_handler, stats_handler, update_role_handler,
        },
        auth::{login_handler, logout_handler, signup_handler},
        courses::{
            checkout_handler, get_course_handler, get_lecture_handler, list_courses_handler,
            list_lectures_handler, my_courses_handler, verify_payment_handler,
        },
        docs::ApiDoc,
        middleware::{require_admin, require_auth},
        progress::{get_progress_handler, mark_progress_handler},
        state::AppState,
    },
};
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_s3::Client as S3Client;
use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use coursehub_core::{
    admin::AdminOps,
    entitlement::{CheckoutUrls, EntitlementService},
    ports::{MarketStore, MediaStore, PaymentGateway},
    progress::ProgressTracker,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use tower_http::cors::CorsLayer;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let pg_store = Arc::new(PgStore::new(db_pool.clone()));
    info!("Running database migrations...");
    pg_store.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let region_provider = RegionProviderChain::default_provider().or_else("us-east-1");
    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(region_provider)
        .load()
        .await;
    let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&aws_config);

    // Allow custom S3-compatible endpoints (e.g., MinIO)
    if let Some(endpoint) = &config.s3_endpoint {
        s3_config_builder = s3_config_builder
            .endpoint_url(endpoint)
            .force_path_style(true);
    }

    let s3_client = S3Client::from_conf(s3_config_builder.build());

    let store: Arc<dyn MarketStore> = pg_store;
    let media: Arc<dyn MediaStore> = Arc::new(S3MediaStore::new(
        s3_client,
        config.s3_bucket.clone(),
        config.s3_public_base_url.clone(),
    ));
    let gateway: Arc<dyn PaymentGateway> =
        Arc::new(StripeGateway::new(config.stripe_secret_key.clone()));

    // --- 4. Build the Core Services and Shared AppState ---
    let checkout_urls = CheckoutUrls {
        success: format!(
            "{}/payment-success?session_id={{CHECKOUT_SESSION_ID}}",
            config.frontend_url
        ),
        cancel: format!("{}/payment/failed", config.frontend_url),
    };
    let entitlements = Arc::new(EntitlementService::new(
        store.clone(),
        gateway.clone(),
        checkout_urls,
        config.checkout_currency.clone(),
    ));
    let progress = Arc::new(ProgressTracker::new(store.clone()));
    let admin = Arc::new(AdminOps::new(store.clone(), media.clone()));

    let app_state = Arc::new(AppState {
        store,
        media,
        entitlements,
        progress,
        admin,
        config: config.clone(),
    });

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .frontend_url
                .parse::<HeaderValue>()
                .map_err(|e| ApiError::Internal(format!("Invalid FRONTEND_URL: {}", e)))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/courses", get(list_courses_handler))
        .route("/courses/{id}", get(get_course_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/courses/{id}/lectures", get(list_lectures_handler))
        .route("/lectures/{id}", get(get_lecture_handler))
        .route("/my/courses", get(my_courses_handler))
        .route("/courses/{id}/checkout", post(checkout_handler))
        .route("/courses/{id}/verify", post(verify_payment_handler))
        .route(
            "/progress",
            get(get_progress_handler).post(mark_progress_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Admin routes (auth + admin role required; layers run bottom-up, so
    // require_auth fires before require_admin)
    let admin_routes = Router::new()
        .route("/admin/courses", post(create_course_handler))
        .route("/admin/courses/{id}/lectures", post(add_lecture_handler))
        .route("/admin/courses/{id}", delete(delete_course_handler))
        .route("/admin/lectures/{id}", delete(delete_lecture_handler))
        .route("/admin/stats", get(stats_handler))
        .route("/admin/users", get(list_users_handler))
        .route("/admin/users/{id}/role", put(update_role_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_admin,
        ))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Combine API routes. The body limit leaves room for lecture videos.
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .layer(DefaultBodyLimit::max(100 * 1024 * 1024))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
