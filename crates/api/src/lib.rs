//! # Lessonbook API
//!
//! The API crate provides the web server for the Lessonbook reservation
//! service. Guardians manage their students and reserve lesson slots;
//! administrators manage slots, waitlists and families.
//!
//! ## Architecture
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Turn requests into calls on the core admission engine and repositories
//! - **Middleware**: Session authentication and error mapping
//! - **Config**: Environment configuration
//!
//! The API uses Axum as the web framework and SQLx for database interactions.

/// Configuration module for API settings
pub mod config;
/// Request handlers
pub mod handlers;
/// Authentication extractors and error handling
pub mod middleware;
/// Route definitions
pub mod routes;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use chrono::Duration;
use chrono_tz::Tz;
use eyre::{Result, WrapErr};
use lessonbook_db::store::PgBookingStore;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

/// Shared application state that is accessible to all request handlers
pub struct ApiState {
    /// PostgreSQL connection pool for database operations
    pub db_pool: PgPool,
    /// Transactional store used by the admission engine
    pub store: PgBookingStore,
    /// Business timezone for calendar grouping and bulk generation
    pub timezone: Tz,
    /// How long a login session stays valid
    pub session_ttl: Duration,
}

impl ApiState {
    pub fn new(db_pool: PgPool, timezone: Tz, session_ttl: Duration) -> Self {
        Self {
            store: PgBookingStore::new(db_pool.clone()),
            db_pool,
            timezone,
            session_ttl,
        }
    }
}

/// Builds the application router with every route and request tracing.
pub fn build_router(state: Arc<ApiState>) -> Router {
    Router::new()
        // Health check endpoints
        .merge(routes::health::routes())
        // Signup and login
        .merge(routes::accounts::routes())
        // Guardian endpoints
        .merge(routes::guardian::routes())
        // Administrator endpoints
        .merge(routes::admin::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Starts the API server with the provided configuration and database connection
pub async fn start_server(config: config::ApiConfig, db_pool: PgPool) -> Result<()> {
    // Initialize tracing for logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let state = Arc::new(ApiState::new(
        db_pool,
        config.timezone,
        Duration::hours(config.session_ttl_hours),
    ));
    let app = build_router(state);

    // Apply CORS configuration if origins are specified
    let app = if let Some(origins) = &config.cors_origins {
        let origins = origins
            .iter()
            .map(|origin| origin.parse::<HeaderValue>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .wrap_err("Invalid API_CORS_ORIGINS value")?;

        let cors = CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                header::ACCEPT,
            ])
            .allow_origin(origins)
            .allow_credentials(true);

        app.layer(cors)
    } else {
        app
    };

    let app = app.layer(TimeoutLayer::new(std::time::Duration::from_secs(
        config.request_timeout,
    )));

    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!(
        "Server listening on http://{} (timezone {})",
        addr,
        config.timezone.name()
    );
    axum::serve(listener, app).await?;

    Ok(())
}
