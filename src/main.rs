use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use solar_lead_api::config::Config;
use solar_lead_api::handlers::{self, AppState};

/// Main entry point for the application.
///
/// Initializes logging, loads configuration, wires the chat relay, notifier and leads
/// workbook into shared state, then starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "solar_lead_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    let port = config.port;

    if !config.email_configured() {
        tracing::warn!("EMAIL_USERNAME/EMAIL_PASSWORD not set; lead emails will be skipped");
    }

    let app_state = Arc::new(AppState::new(config)?);
    tracing::info!("Leads workbook: {}", app_state.leads.path().display());

    let app = handlers::router(app_state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
