// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Task routes for triggering sync work outside the daily schedule.

use crate::AppState;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Serialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/tasks/sweep", post(trigger_sweep))
}

#[derive(Serialize)]
pub struct SweepAccepted {
    pub status: String,
}

/// Start a roster sweep in the background and return immediately.
async fn trigger_sweep(State(state): State<Arc<AppState>>) -> (StatusCode, Json<SweepAccepted>) {
    tracing::info!("Roster sweep triggered on demand");

    let sweeper = state.sweeper.clone();
    tokio::spawn(async move {
        match sweeper.sweep().await {
            Ok(report) => tracing::info!(?report, "On-demand sweep complete"),
            Err(e) => tracing::error!(error = %e, "On-demand sweep failed"),
        }
    });

    (
        StatusCode::ACCEPTED,
        Json(SweepAccepted {
            status: "accepted".to_string(),
        }),
    )
}
