//! Parlor Server — multi-tenant real-time chat gateway
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use parlor_core::config::AppConfig;
use parlor_core::error::AppError;

#[tokio::main]
async fn main() {
    let env = std::env::var("PARLOR_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Parlor v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Credential verification ──────────────────────────
    let jwt_decoder = parlor_auth::JwtDecoder::new(&config.auth);

    // ── Step 2: Directory (+ optional seed fixture) ──────────────
    let directory = Arc::new(parlor_store::Directory::new());
    if let Some(path) = &config.directory.seed_file {
        tracing::info!("Seeding directory from '{}'", path);
        let seed = parlor_store::SeedFile::load(path)?;
        seed.apply(&directory)?;
    }

    // ── Step 3: Collaborators behind the core traits ─────────────
    let identity = Arc::new(parlor_store::DirectoryIdentityResolver::new(
        jwt_decoder,
        directory.clone(),
    ));
    let access = Arc::new(parlor_store::DirectoryAccessChecker::new(directory.clone()));
    let store = Arc::new(parlor_store::InMemoryMessageStore::new(directory.clone()));

    // ── Step 4: Real-time engine ─────────────────────────────────
    tracing::info!("Initializing chat engine...");
    let engine = parlor_realtime::ChatEngine::new(config.realtime.clone(), identity, access, store);

    // ── Step 5: Build and start HTTP server ──────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = parlor_gateway::AppState::new(Arc::new(config), engine.clone());
    let app = parlor_gateway::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("Parlor server listening on {addr}");

    // ── Step 6: Graceful shutdown ────────────────────────────────
    let shutdown_engine = engine.clone();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        shutdown_engine.shutdown();
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    tracing::info!("Parlor server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
