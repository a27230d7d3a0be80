//! # REST Mock Server CLI
//!
//! Runs the mock server on the given address and port until interrupted.
//! The expectation queue starts empty; a test harness fills it through the
//! control path.

use std::io;
use std::net::SocketAddr;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use rest_mock_rs::http::{build_router, AppState};

mod cli;

use cli::Cli;

#[tokio::main]
async fn main() -> io::Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let app = build_router(AppState::new());

    let addr = SocketAddr::new(cli.address, cli.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("start serving on http://{addr}");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    tracing::info!("stopping");
    Ok(())
}

/// Resolve once Ctrl-C or, on Unix, SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
