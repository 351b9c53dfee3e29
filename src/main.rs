use bill_extractor::handlers::{build_router, AppState};
use bill_extractor::{Config, ReceiptExtractor};

use anyhow::Context;
use std::net::SocketAddr;
use std::str::FromStr;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize logging
    init_logging();

    info!(
        "Starting Bill Extractor service v{}",
        env!("CARGO_PKG_VERSION")
    );

    if let Err(e) = run().await {
        error!("{:#}", e);
        std::process::exit(1);
    }

    info!("Bill Extractor service stopped");
}

async fn run() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    info!("Configuration loaded successfully");
    info!("  +------ Project name: {}", config.project_name);
    info!("  +---- Extract route: {}", config.extract_route());
    info!("  +-- OpenRouter base: {}", config.openrouter_base_url);
    info!("  +------------ Model: {}", config.openrouter_model);

    // One client for the whole process
    let extractor =
        ReceiptExtractor::from_config(&config).context("Failed to create model client")?;
    let app = build_router(&config, AppState::new(extractor, &config.project_name));

    let addr = SocketAddr::from_str(&config.server_address())
        .with_context(|| format!("Invalid server address {}", config.server_address()))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    info!("Server bound to {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bill_extractor=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
