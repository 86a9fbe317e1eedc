//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

mod media;
mod settings;

use admin::{PgStatsRepository, admin_router, presentation::AdminAppState};
use auth::PgAuthRepository;
use auth::presentation::{
    AuthAppState, admin_users_router, attach_access_token, auth_router, profile_router,
    users_router,
};
use axum::{
    Json, Router,
    extract::State,
    http::{self, Method, StatusCode, header},
    middleware,
    routing::get,
};
use billing::{PgBillingRepository, SimulatedGateway, billing_router, presentation::BillingAppState};
use kernel::clock::{Clock, SystemClock};
use learning::{
    LearningConfig, PgLearningRepository, learning_router, presentation::LearningAppState,
};
use platform::mail::Mailer;
use platform::storage::{FsObjectStore, ObjectStorage};
use serde_json::{Value, json};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api=info,auth=info,learning=info,billing=info,admin=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;

    // Database connection
    let pool = PgPoolOptions::new()
        .max_connections(settings.database_max_connections)
        .connect(&settings.database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Startup cleanup: expired refresh tokens and reset links
    // Errors here should not prevent server startup
    let auth_store_for_cleanup = PgAuthRepository::new(pool.clone());
    match auth_store_for_cleanup.cleanup_expired(clock.now()).await {
        Ok((tokens, resets)) => {
            tracing::info!(
                refresh_tokens_deleted = tokens,
                password_resets_deleted = resets,
                "Auth cleanup completed"
            );
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Auth cleanup failed, continuing anyway"
            );
        }
    }

    // Object storage and mail
    let fs_store = FsObjectStore::new(&settings.media_root);
    fs_store.ensure_root().await?;
    let storage = Arc::new(ObjectStorage::Local(fs_store));

    let mailer = Arc::new(Mailer::from_config(settings.smtp.as_ref())?);
    if settings.smtp.is_none() {
        tracing::info!("SMTP_HOST not set, emails are logged instead of sent");
    }

    // Context states
    let auth_config = Arc::new(settings.auth_config()?);
    let billing_config = Arc::new(settings.billing.clone());

    let auth_state = AuthAppState {
        repo: Arc::new(PgAuthRepository::new(pool.clone())),
        config: auth_config.clone(),
        clock: clock.clone(),
        mailer,
        storage: storage.clone(),
    };
    let learning_state = LearningAppState {
        repo: Arc::new(PgLearningRepository::new(pool.clone())),
        config: Arc::new(LearningConfig::new()),
        clock: clock.clone(),
        storage: storage.clone(),
    };
    let billing_state = BillingAppState {
        repo: Arc::new(PgBillingRepository::new(pool.clone())),
        gateway: Arc::new(SimulatedGateway::new()),
        config: billing_config.clone(),
        clock: clock.clone(),
    };
    let admin_state = AdminAppState {
        repo: Arc::new(PgStatsRepository::new(pool.clone())),
        billing: billing_config,
        clock,
    };

    // CORS configuration
    let allowed_origins: Vec<http::HeaderValue> = settings
        .frontend_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let api = Router::new()
        .route("/health", get(health).with_state(pool))
        .route(
            "/media/{*key}",
            get(media::serve_media).with_state(storage),
        )
        .nest("/auth", auth_router(auth_state.clone()))
        .nest("/profile", profile_router(auth_state.clone()))
        .nest("/users", users_router(auth_state.clone()))
        .nest("/admin/users", admin_users_router(auth_state))
        .merge(learning_router(learning_state))
        .merge(billing_router(billing_state))
        .merge(admin_router(admin_state));

    let app = Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(
            auth_config,
            attach_access_token,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    tracing::info!("Listening on {}", settings.bind_addr);

    let listener = TcpListener::bind(settings.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// GET /api/health
async fn health(State(pool): State<PgPool>) -> (StatusCode, Json<Value>) {
    match sqlx::query("SELECT 1").execute(&pool).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
        }
    }
}
