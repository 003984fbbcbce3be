//! MetaGuard API Server
//!
//! REST surface for pre-signature transaction risk analysis.
//!
//! Usage:
//!   cargo run --bin metaguard_api
//!
//! Environment:
//!   PORT / GUARD_PORT  - Server port (default: 8080)
//!   GUARD_HOST         - Server host (default: 0.0.0.0)
//!   RUST_LOG           - Log filter (default: info)

use metaguard::api::{create_router, start_cleanup_task, AppState};
use metaguard::models::config::GuardConfig;
use metaguard::utils::constants::{APP_NAME, APP_VERSION};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    print_banner();

    // Load configuration and build shared state
    let config = GuardConfig::default();
    let state = Arc::new(AppState::new(&config));

    // Start background cleanup task for the rate limiter
    start_cleanup_task();

    // Create router
    let app = create_router(state.clone());

    // Get server config from env
    let host = std::env::var("GUARD_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .or_else(|_| std::env::var("GUARD_PORT"))
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("{} API starting on http://{}", APP_NAME, addr);
    info!("");
    info!("Endpoints:");
    info!("  POST /v1/analyze  - Analyze a pending transaction");
    info!("  GET  /v1/stats    - Engine statistics");
    info!("  GET  /v1/health   - Health check");
    info!("");
    info!("Press Ctrl+C for graceful shutdown");

    // Start server with graceful shutdown
    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    // Graceful shutdown sequence
    info!("");
    info!("Shutdown signal received, cleaning up...");
    info!("  Total analyzed:    {}", state.total_analyzed());
    info!("  High-risk reports: {}", state.high_risk_reports());
    info!("{} API shutdown complete", APP_NAME);

    Ok(())
}

fn print_banner() {
    println!("\n{}", "=".repeat(70));
    println!("  {} v{} - Transaction Security Analyzer", APP_NAME, APP_VERSION);
    println!("  Contract verification | Phishing reputation | Risk scoring");
    println!("{}\n", "=".repeat(70));
}
