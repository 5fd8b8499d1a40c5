//! Wallet Ledger service
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌─────────────┐    ┌──────────────┐
//! │ Gateway  │───▶│ KYC Gate │───▶│   Wallet    │◀───│   Transfer   │
//! │  (HTTP)  │    │          │    │  Registry   │    │ Coordinator  │
//! └──────────┘    └──────────┘    └─────────────┘    └──────┬───────┘
//!                                                          │
//!                                        ┌─────────────────▼─────────────┐
//!                                        │ Resilience (breakers/fallback) │
//!                                        └───────────────────────────────┘
//! ```
//!
//! Usage: `wallet_ledger [--env dev|prod] [--port N]`

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use wallet_ledger::config::AppConfig;
use wallet_ledger::external::SimulatedDependencies;
use wallet_ledger::gateway::{self, AppState};
use wallet_ledger::logging::init_logging;
use wallet_ledger::transfer::{PaymentRetryWorker, WorkerConfig};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> anyhow::Result<Option<u16>> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            let port = args[i + 1]
                .parse()
                .with_context(|| format!("Invalid --port value: {}", args[i + 1]))?;
            return Ok(Some(port));
        }
    }
    Ok(None)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut app_config = AppConfig::load(&env)?;
    if let Some(port) = get_port_override()? {
        app_config.gateway.port = port;
    }
    if let Ok(secret) = std::env::var("WALLET_SERVICE_SECRET") {
        app_config.gateway.service_secret = secret;
    }
    let _log_guard = init_logging(&app_config);

    info!(
        env = %env,
        version = env!("GIT_HASH"),
        mock_api = cfg!(feature = "mock-api"),
        "Starting wallet ledger"
    );

    if app_config.gateway.service_secret.is_empty() {
        warn!("No service secret configured; webhook and internal routes will reject every call");
    }
    let state = Arc::new(
        AppState::new(
            &app_config.kyc,
            &app_config.resilience,
            SimulatedDependencies::new(),
        )
        .with_service_secret(app_config.gateway.service_secret.clone()),
    );

    let worker = PaymentRetryWorker::new(
        state.coordinator.clone(),
        WorkerConfig {
            scan_interval: app_config.resilience.retry_scan_interval(),
            ..WorkerConfig::default()
        },
    );
    tokio::spawn(async move {
        worker.run().await;
    });

    gateway::run_server(&app_config.gateway, state).await
}
