// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Background trigger for the daily roster sweep.

use crate::services::sweep::RosterSweeper;
use crate::time_utils::{format_utc_rfc3339, next_daily_run};
use chrono::NaiveTime;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Spawn a task that runs one sweep every day at `at` (UTC).
///
/// The task lives until the process exits. A sweep that overruns the next
/// trigger delays it rather than running concurrently.
pub fn spawn_daily_sweep(sweeper: Arc<RosterSweeper>, at: NaiveTime) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = chrono::Utc::now();
            let next = next_daily_run(now, at);
            let wait = (next - now).to_std().unwrap_or_default();

            tracing::info!(
                next_run = %format_utc_rfc3339(next),
                wait_secs = wait.as_secs(),
                "Next roster sweep scheduled"
            );
            tokio::time::sleep(wait).await;

            if let Err(e) = sweeper.sweep().await {
                tracing::error!(error = %e, "Roster sweep failed");
            }
        }
    })
}
