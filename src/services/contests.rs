// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Contest history reconciliation.

use crate::db::RosterStore;
use crate::error::SyncError;
use crate::models::ContestResult;
use crate::services::codeforces::{ApiRequest, RatingChange};
use crate::services::fetcher::{RetryPolicy, RetryingFetcher};
use std::sync::Arc;

/// Replaces a user's stored contest history with the latest rating history.
#[derive(Clone)]
pub struct ContestReconciler {
    fetcher: RetryingFetcher,
    store: Arc<dyn RosterStore>,
    policy: RetryPolicy,
}

impl ContestReconciler {
    pub fn new(fetcher: RetryingFetcher, store: Arc<dyn RosterStore>, policy: RetryPolicy) -> Self {
        Self {
            fetcher,
            store,
            policy,
        }
    }

    /// Fetch the rating history for `handle` and make it the user's stored set.
    ///
    /// The store is only touched once the fetch has succeeded, so an
    /// unreachable API never wipes existing history. Returns the number of
    /// contests stored.
    pub async fn reconcile(&self, user_id: u64, handle: &str) -> Result<usize, SyncError> {
        let request = ApiRequest::RatingHistory {
            handle: handle.to_string(),
        };
        let changes: Vec<RatingChange> = self.fetcher.fetch(&request, self.policy).await?;

        let contests = to_contest_results(user_id, changes);
        let count = contests.len();
        self.store.replace_contests(user_id, contests).await?;

        tracing::info!(user_id, handle, contests = count, "Contest history reconciled");
        Ok(count)
    }
}

/// Copy the snapshot field by field, preserving its order.
fn to_contest_results(user_id: u64, changes: Vec<RatingChange>) -> Vec<ContestResult> {
    changes
        .into_iter()
        .map(|c| ContestResult {
            user_id,
            contest_name: c.contest_name,
            rank: c.rank,
            old_rating: c.old_rating,
            new_rating: c.new_rating,
            timestamp: c.rating_update_time_seconds,
        })
        .collect()
}
