//! ForwardsFlow API Server
//!
//! Main entry point for the loan approval and settlement service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use forwardsflow_api::{AppState, create_router};
use forwardsflow_core::ledger::LoanLedger;
use forwardsflow_core::notify::{NotificationDispatcher, Notifier};
use forwardsflow_core::store::MemoryStore;
use forwardsflow_providers::{LogNotifier, MpesaGateway, TwilioNotifier};
use forwardsflow_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forwardsflow=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Payment provider
    let gateway = MpesaGateway::new(config.mpesa.clone()).context("Failed to build M-Pesa client")?;
    info!(
        base_url = %config.mpesa.base_url,
        shortcode = %config.mpesa.shortcode,
        callback_url = %config.mpesa.callback_url,
        "M-Pesa gateway configured"
    );

    // Borrower notifications
    let notifier: Arc<dyn Notifier> = if config.notifier.enabled {
        info!(channel = ?config.notifier.channel, "Twilio notifications enabled");
        Arc::new(
            TwilioNotifier::new(config.notifier.clone(), &config.mpesa.country_code)
                .context("Failed to build Twilio client")?,
        )
    } else {
        info!("Notifications disabled, messages will only be logged");
        Arc::new(LogNotifier)
    };

    // Create application state
    let ledger = LoanLedger::new(
        Arc::new(MemoryStore::new()),
        Arc::new(gateway),
        NotificationDispatcher::new(notifier, config.notifier.channel.into()),
    );
    let state = AppState::new(ledger);

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
