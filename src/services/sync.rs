// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! "Refresh, then query" coordination for on-demand reads and the sweep.
//!
//! All reconciliation goes through [`SyncOrchestrator`], which serializes
//! reconcilers per user so two refreshes of the same history never overlap
//! within this process.

use crate::db::RosterStore;
use crate::error::{Result, SyncError};
use crate::models::{ContestResult, SubmissionRecord, User};
use crate::services::contests::ContestReconciler;
use crate::services::submissions::SubmissionReconciler;
use crate::time_utils::window_start;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Per-user sync locks.
pub type UserLocks = Arc<DashMap<u64, Arc<Mutex<()>>>>;

#[derive(Clone)]
pub struct SyncOrchestrator {
    store: Arc<dyn RosterStore>,
    contests: ContestReconciler,
    submissions: SubmissionReconciler,
    locks: UserLocks,
}

impl SyncOrchestrator {
    pub fn new(
        store: Arc<dyn RosterStore>,
        contests: ContestReconciler,
        submissions: SubmissionReconciler,
    ) -> Self {
        Self {
            store,
            contests,
            submissions,
            locks: Arc::new(DashMap::new()),
        }
    }

    fn lock_for(&self, user_id: u64) -> Arc<Mutex<()>> {
        self.locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Reconcile the user's contest history under the user's lock.
    pub async fn refresh_contests(
        &self,
        user_id: u64,
        handle: &str,
    ) -> std::result::Result<usize, SyncError> {
        let lock = self.lock_for(user_id);
        let _guard = lock.lock().await;
        self.contests.reconcile(user_id, handle).await
    }

    /// Reconcile the user's submission history under the user's lock.
    pub async fn refresh_submissions(
        &self,
        user_id: u64,
        handle: &str,
    ) -> std::result::Result<usize, SyncError> {
        let lock = self.lock_for(user_id);
        let _guard = lock.lock().await;
        self.submissions.reconcile(user_id, handle).await
    }

    /// Contests for the user in the last `days` days, refreshed first when possible.
    ///
    /// Unknown users and users without a handle yield an empty list. A failed
    /// refresh is logged and whatever is already stored is returned.
    pub async fn contests_for_user(&self, user_id: u64, days: i64) -> Result<Vec<ContestResult>> {
        let Some((user, handle)) = self.syncable_user(user_id).await? else {
            return Ok(Vec::new());
        };

        if let Err(e) = self.refresh_contests(user.id, &handle).await {
            tracing::warn!(
                user_id,
                handle = %handle,
                error = %e,
                "Contest refresh failed, serving stored history"
            );
        }

        let since = window_start(chrono::Utc::now(), days);
        self.store.contests_since(user.id, since).await
    }

    /// Submissions for the user in the last `days` days, refreshed first when possible.
    pub async fn submissions_for_user(
        &self,
        user_id: u64,
        days: i64,
    ) -> Result<Vec<SubmissionRecord>> {
        let Some((user, handle)) = self.syncable_user(user_id).await? else {
            return Ok(Vec::new());
        };

        if let Err(e) = self.refresh_submissions(user.id, &handle).await {
            tracing::warn!(
                user_id,
                handle = %handle,
                error = %e,
                "Submission refresh failed, serving stored history"
            );
        }

        let since = window_start(chrono::Utc::now(), days);
        self.store.submissions_since(user.id, since).await
    }

    /// Look up a user that has a handle to sync with.
    async fn syncable_user(&self, user_id: u64) -> Result<Option<(User, String)>> {
        let Some(user) = self.store.get_user(user_id).await? else {
            tracing::debug!(user_id, "User not found, nothing to sync");
            return Ok(None);
        };

        match user.sync_handle().map(str::to_string) {
            Some(handle) => Ok(Some((user, handle))),
            None => {
                tracing::debug!(user_id, "User has no handle, nothing to sync");
                Ok(None)
            }
        }
    }
}
