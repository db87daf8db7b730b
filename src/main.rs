// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CF-Tracker API Server
//!
//! Mirrors contest and submission history for a roster of Codeforces users
//! and sweeps the roster daily for rating changes and inactivity.

use anyhow::Context;
use cf_tracker::{
    config::{Config, StoreBackend},
    db::{FirestoreDb, MemoryStore, RosterStore},
    services::{scheduler, CodeforcesClient},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(port = config.port, "Starting CF-Tracker API");

    let store: Arc<dyn RosterStore> = match config.store_backend {
        StoreBackend::Firestore => Arc::new(
            FirestoreDb::new(&config.gcp_project_id)
                .await
                .context("Failed to connect to Firestore")?,
        ),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let source = Arc::new(
        CodeforcesClient::new(config.codeforces_api_url.clone(), config.http_timeout)
            .context("Failed to build Codeforces client")?,
    );
    tracing::info!(
        base_url = %config.codeforces_api_url,
        max_attempts = config.fetch_max_attempts,
        retry_delay_ms = config.fetch_retry_delay.as_millis() as u64,
        "Codeforces client initialized"
    );

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), store, source));

    if let Some(seed) = &config.seed_user {
        if let Err(e) = state.roster.ensure_seed_user(seed).await {
            tracing::error!(handle = %seed.handle, error = %e, "Failed to register seed user");
        }
    }

    scheduler::spawn_daily_sweep(state.sweeper.clone(), config.sweep_time);

    // Build router
    let app = cf_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cf_tracker=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
