// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Read routes over a user's mirrored history.
//!
//! Each request first tries to refresh the history from Codeforces, then
//! answers from the local store. Upstream outages never surface as errors
//! here; the stored (possibly stale) rows are returned instead.

use crate::error::{AppError, Result};
use crate::models::{ContestResult, SubmissionRecord};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

const MAX_WINDOW_DAYS: i64 = 3650;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users/{id}/contests", get(get_contests))
        .route("/api/users/{id}/submissions", get(get_submissions))
}

#[derive(Deserialize)]
struct WindowQuery {
    /// Look back this many days from now
    days: Option<i64>,
}

fn resolve_days(days: Option<i64>, default: i64) -> Result<i64> {
    let days = days.unwrap_or(default);
    if !(1..=MAX_WINDOW_DAYS).contains(&days) {
        return Err(AppError::BadRequest(format!(
            "'days' must be between 1 and {}",
            MAX_WINDOW_DAYS
        )));
    }
    Ok(days)
}

/// Contests for a user within the window, oldest first.
async fn get_contests(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<u64>,
    Query(params): Query<WindowQuery>,
) -> Result<Json<Vec<ContestResult>>> {
    let days = resolve_days(params.days, state.config.default_contest_window_days)?;
    tracing::debug!(user_id, days, "Fetching contests");

    let contests = state.sync.contests_for_user(user_id, days).await?;
    Ok(Json(contests))
}

/// Submissions for a user within the window, in Codeforces order (newest first).
async fn get_submissions(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<u64>,
    Query(params): Query<WindowQuery>,
) -> Result<Json<Vec<SubmissionRecord>>> {
    let days = resolve_days(params.days, state.config.default_submission_window_days)?;
    tracing::debug!(user_id, days, "Fetching submissions");

    let submissions = state.sync.submissions_for_user(user_id, days).await?;
    Ok(Json(submissions))
}
