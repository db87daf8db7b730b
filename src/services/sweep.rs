// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily roster sweep.
//!
//! Walks every user with a handle, one at a time:
//! 1. Refresh current/max rating from `user.info` (single attempt)
//! 2. Optionally reconcile contest and submission history
//! 3. Run the inactivity check for users with reminders enabled
//!
//! A failure for one user is logged and the sweep moves on.

use crate::db::RosterStore;
use crate::error::{AppError, Result};
use crate::models::User;
use crate::services::codeforces::{open_envelope, ApiRequest, CfUserInfo, CodeforcesApi};
use crate::services::inactivity::{InactivityDetector, InactivityOutcome};
use crate::services::sync::SyncOrchestrator;
use std::sync::Arc;

/// Counters describing one sweep pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub users_seen: usize,
    pub skipped_without_handle: usize,
    pub ratings_refreshed: usize,
    pub rating_failures: usize,
    pub history_failures: usize,
    pub reminders_due: usize,
    pub inactivity_failures: usize,
}

pub struct RosterSweeper {
    source: Arc<dyn CodeforcesApi>,
    store: Arc<dyn RosterStore>,
    detector: InactivityDetector,
    sync: SyncOrchestrator,
    refresh_history: bool,
}

impl RosterSweeper {
    pub fn new(
        source: Arc<dyn CodeforcesApi>,
        store: Arc<dyn RosterStore>,
        detector: InactivityDetector,
        sync: SyncOrchestrator,
        refresh_history: bool,
    ) -> Self {
        Self {
            source,
            store,
            detector,
            sync,
            refresh_history,
        }
    }

    /// Run one pass over the whole roster.
    ///
    /// Only failing to list the roster aborts the pass; everything per user
    /// is best-effort.
    pub async fn sweep(&self) -> Result<SweepReport> {
        let users = self.store.list_users().await?;
        let mut report = SweepReport::default();

        tracing::info!(users = users.len(), "Roster sweep started");

        for user in users {
            report.users_seen += 1;
            self.sweep_user(&user, &mut report).await;
        }

        tracing::info!(
            users_seen = report.users_seen,
            ratings_refreshed = report.ratings_refreshed,
            rating_failures = report.rating_failures,
            history_failures = report.history_failures,
            reminders_due = report.reminders_due,
            "Roster sweep finished"
        );

        Ok(report)
    }

    async fn sweep_user(&self, user: &User, report: &mut SweepReport) {
        let Some(handle) = user.sync_handle() else {
            report.skipped_without_handle += 1;
            return;
        };

        match self.refresh_rating(user.id, handle).await {
            Ok(()) => report.ratings_refreshed += 1,
            Err(e) => {
                report.rating_failures += 1;
                tracing::warn!(
                    user_id = user.id,
                    handle,
                    error = %e,
                    "Rating refresh failed, keeping stored ratings"
                );
            }
        }

        if self.refresh_history {
            if let Err(e) = self.sync.refresh_contests(user.id, handle).await {
                report.history_failures += 1;
                tracing::warn!(user_id = user.id, handle, error = %e, "Contest sync failed during sweep");
            }
            if let Err(e) = self.sync.refresh_submissions(user.id, handle).await {
                report.history_failures += 1;
                tracing::warn!(user_id = user.id, handle, error = %e, "Submission sync failed during sweep");
            }
        }

        // Runs whether or not the rating refresh worked.
        if user.reminders_enabled {
            match self.detector.check_and_maybe_flag(user.id).await {
                Ok(InactivityOutcome::ReminderDue { reminders_sent }) => {
                    report.reminders_due += 1;
                    tracing::info!(
                        user_id = user.id,
                        handle,
                        email = ?user.email,
                        reminders_sent,
                        "Reminder would be sent"
                    );
                }
                Ok(InactivityOutcome::Active { .. }) => {}
                Err(e) => {
                    report.inactivity_failures += 1;
                    tracing::warn!(user_id = user.id, handle, error = %e, "Inactivity check failed");
                }
            }
        }
    }

    /// Single `user.info` call; this path does not go through the retrying fetcher.
    async fn refresh_rating(&self, user_id: u64, handle: &str) -> Result<()> {
        let request = ApiRequest::UserInfo {
            handle: handle.to_string(),
        };

        let response = self
            .source
            .call(&request)
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;
        let infos: Vec<CfUserInfo> =
            open_envelope(&response).map_err(|e| AppError::Upstream(e.to_string()))?;
        let info = infos
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Upstream(format!("{} returned no users", request)))?;

        let now = chrono::Utc::now().to_rfc3339();
        self.store
            .update_ratings(
                user_id,
                info.rating.unwrap_or(0),
                info.max_rating.unwrap_or(0),
                &now,
            )
            .await?;

        tracing::debug!(user_id, handle, rating = ?info.rating, "Ratings refreshed");
        Ok(())
    }
}
