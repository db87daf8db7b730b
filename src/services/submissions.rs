// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Submission history reconciliation.
//!
//! Only the first page of `user.status` is requested, sized by
//! `SUBMISSIONS_PAGE_SIZE`. Submissions older than that page are not
//! mirrored; this bounds the stored history depth per user.

use crate::db::RosterStore;
use crate::error::SyncError;
use crate::models::SubmissionRecord;
use crate::services::codeforces::{ApiRequest, CfSubmission};
use crate::services::fetcher::{RetryPolicy, RetryingFetcher};
use std::sync::Arc;

/// Replaces a user's stored submissions with a filtered snapshot.
#[derive(Clone)]
pub struct SubmissionReconciler {
    fetcher: RetryingFetcher,
    store: Arc<dyn RosterStore>,
    policy: RetryPolicy,
    page_size: u32,
}

impl SubmissionReconciler {
    pub fn new(
        fetcher: RetryingFetcher,
        store: Arc<dyn RosterStore>,
        policy: RetryPolicy,
        page_size: u32,
    ) -> Self {
        Self {
            fetcher,
            store,
            policy,
            page_size,
        }
    }

    /// Fetch the latest submissions page for `handle` and store the complete ones.
    ///
    /// Same failure rule as contests: nothing is deleted unless the fetch
    /// succeeded. Returns the number of submissions kept.
    pub async fn reconcile(&self, user_id: u64, handle: &str) -> Result<usize, SyncError> {
        let request = ApiRequest::SubmissionHistory {
            handle: handle.to_string(),
            from: 1,
            count: self.page_size,
        };
        let raw: Vec<CfSubmission> = self.fetcher.fetch(&request, self.policy).await?;
        let fetched = raw.len();

        let submissions = keep_complete(user_id, raw);
        let kept = submissions.len();
        self.store.replace_submissions(user_id, submissions).await?;

        tracing::info!(
            user_id,
            handle,
            fetched,
            kept,
            "Submission history reconciled"
        );
        Ok(kept)
    }
}

/// Project the snapshot onto stored records, dropping incomplete submissions.
///
/// A submission is kept only with a named problem, a verdict and a creation time.
fn keep_complete(user_id: u64, raw: Vec<CfSubmission>) -> Vec<SubmissionRecord> {
    raw.into_iter()
        .filter_map(|s| {
            let problem = s.problem?;
            let problem_name = problem.name.filter(|n| !n.is_empty())?;
            let verdict = s.verdict.filter(|v| !v.is_empty())?;
            let timestamp = s.creation_time_seconds.filter(|&t| t > 0)?;

            Some(SubmissionRecord {
                user_id,
                problem_name,
                rating: problem.rating,
                verdict,
                timestamp,
            })
        })
        .collect()
}
