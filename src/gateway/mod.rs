//! HTTP Gateway
//!
//! ```text
//! /api/v1/health                      public
//! /api/v1/webhooks/{payment,kyc}      X-Service-Secret required
//! /api/v1/kyc, /api/v1/wallets/*      X-User-Id required
//! /internal/kyc/manual-review         X-Service-Secret required
//! /internal/mock/faults               mock-api feature only, X-Service-Secret required
//! ```

pub mod handlers;
pub mod middleware;
pub mod state;
pub mod types;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::GatewayConfig;

pub use middleware::{AuthenticatedUser, SERVICE_SECRET_HEADER, USER_ID_HEADER};
pub use state::AppState;

/// Build the complete router
pub fn build_router(state: Arc<AppState>) -> Router {
    // ==========================================================================
    // User Routes - caller identity required
    // ==========================================================================
    let user_routes = Router::new()
        .route(
            "/kyc",
            post(handlers::submit_kyc).get(handlers::get_kyc_status),
        )
        .route(
            "/wallets",
            post(handlers::create_wallet).get(handlers::list_wallets),
        )
        .route("/wallets/topup", post(handlers::top_up))
        .route("/wallets/transfer", post(handlers::create_transfer))
        .route("/wallets/{wallet_id}", get(handlers::get_wallet))
        .route("/wallets/{wallet_id}/balance", get(handlers::get_balance))
        .route(
            "/wallets/{wallet_id}/transactions",
            get(handlers::get_transactions),
        )
        .route("/wallets/{wallet_id}/freeze", post(handlers::freeze_wallet))
        .route(
            "/wallets/{wallet_id}/unfreeze",
            post(handlers::unfreeze_wallet),
        )
        .route("/wallets/{wallet_id}/close", post(handlers::close_wallet))
        .layer(from_fn(middleware::user_identity_middleware));

    // ==========================================================================
    // Provider callbacks - service secret required
    // ==========================================================================
    let webhook_routes = Router::new()
        .route("/payment", post(handlers::payment_webhook))
        .route("/kyc", post(handlers::kyc_webhook))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::service_auth_middleware,
        ));

    let internal_routes =
        Router::new().route("/kyc/manual-review", get(handlers::manual_review_queue));

    // [SECURITY] Mock API routes - only compiled when 'mock-api' feature is enabled.
    // Production builds MUST be compiled with `--no-default-features` to exclude this.
    #[cfg(feature = "mock-api")]
    let internal_routes = internal_routes.nest(
        "/mock",
        Router::new().route("/faults", post(handlers::set_faults)),
    );

    let internal_routes = internal_routes.layer(from_fn_with_state(
        state.clone(),
        middleware::service_auth_middleware,
    ));

    Router::new()
        .route("/api/v1/health", get(handlers::health_check))
        .nest("/api/v1/webhooks", webhook_routes)
        .nest("/api/v1", user_routes)
        .nest("/internal", internal_routes)
        .with_state(state)
}

/// Bind and serve until the listener fails
pub async fn run_server(config: &GatewayConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {} (port already in use?)", addr))?;

    info!(%addr, "Gateway listening");
    info!("User API:  /api/v1/{{kyc,wallets}} (X-User-Id required)");
    info!("Webhooks:  /api/v1/webhooks/{{payment,kyc}} (X-Service-Secret required)");

    axum::serve(listener, build_router(state))
        .await
        .context("Server error")
}
