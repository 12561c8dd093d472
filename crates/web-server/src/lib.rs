//! # Adboard Web Server
//!
//! The JSON API behind the dashboard: synced metrics, analytics charts and
//! summaries, the ad monitor, accounts and per-user settings.
//!
//! Routes under `/api` that carry team data require `Authorization: Bearer`
//! with a session token from `/api/auth/login`. `/api/sync` is guarded by the
//! `SYNC_API_KEY` instead, so it can be driven by a scheduler.

use api_client::ExchangeRateService;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use configuration::{Config, Secrets};
use database::DbRepository;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod account;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod sync_task;

/// The shared application state that all handlers can access.
pub struct AppState {
    pub db_repo: DbRepository,
    pub config: Config,
    pub secrets: Secrets,
    pub exchange_rates: ExchangeRateService,
}

/// Builds the router with every route and middleware layer.
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.server.body_limit;
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/auth/register", post(account::register))
        .route("/api/auth/login", post(account::login))
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route("/api/analytics/teams", get(handlers::get_team_metrics))
        .route("/api/analytics/charts", get(handlers::get_charts))
        .route("/api/analytics/summary", get(handlers::get_summary))
        .route("/api/monitor", get(handlers::get_monitor))
        .route("/api/exchange-rate", get(handlers::get_exchange_rate))
        .route(
            "/api/user/settings",
            get(account::get_user_settings).put(account::update_user_settings),
        )
        .route("/api/user/change-password", post(account::change_password))
        .route("/api/heartbeat", post(account::heartbeat))
        .route("/api/admin/users", get(account::get_admin_overview))
        .route(
            "/api/team-color-settings",
            get(account::get_team_color_settings).post(account::save_team_color_settings),
        )
        .route("/api/sync", get(handlers::trigger_sync))
        .with_state(state)
        .layer(cors)
        // Logs every incoming request and its response status.
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(body_limit))
}

/// The main function to configure and run the web server.
///
/// Tracing is initialised by the caller. `DATABASE_URL` and the secrets must
/// already be in the environment.
pub async fn run_server(config: Config, secrets: Secrets) -> anyhow::Result<()> {
    let db_pool = database::connect(&config.database).await?;
    database::run_migrations(&db_pool).await?;
    let db_repo = DbRepository::new(db_pool);

    let exchange_rates = ExchangeRateService::from_config(
        &config.exchange_rate,
        secrets.exchange_rate_api_key.as_deref(),
    )?;
    if secrets.sync_api_key.is_none() {
        tracing::warn!("SYNC_API_KEY is not set; /api/sync will reject every request.");
    }

    let addr = config.server.addr;
    let app_state = Arc::new(AppState {
        db_repo,
        config,
        secrets,
        exchange_rates,
    });
    let sync_handle = sync_task::spawn_periodic_sync(app_state.clone());
    let app = build_router(app_state);

    tracing::info!("Web server listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = sync_handle {
        handle.abort();
    }
    tracing::info!("Web server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for the shutdown signal.");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received.");
}
