// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - sync engine.

pub mod codeforces;
pub mod contests;
pub mod fetcher;
pub mod inactivity;
pub mod roster;
pub mod scheduler;
pub mod submissions;
pub mod sweep;
pub mod sync;

pub use codeforces::{ApiRequest, CodeforcesApi, CodeforcesClient, RawResponse};
pub use contests::ContestReconciler;
pub use fetcher::{RetryPolicy, RetryingFetcher};
pub use inactivity::{InactivityDetector, InactivityOutcome};
pub use roster::Roster;
pub use submissions::SubmissionReconciler;
pub use sweep::{RosterSweeper, SweepReport};
pub use sync::SyncOrchestrator;
