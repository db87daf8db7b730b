// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! CF-Tracker: keep a roster's Codeforces history mirrored locally
//!
//! This crate provides the sync engine (retrying fetches, contest and
//! submission reconciliation, the daily roster sweep and inactivity
//! detection) and the small HTTP surface that triggers it.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::RosterStore;
use services::{
    CodeforcesApi, ContestReconciler, InactivityDetector, RetryPolicy, RetryingFetcher, Roster,
    RosterSweeper, SubmissionReconciler, SyncOrchestrator,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn RosterStore>,
    pub sync: SyncOrchestrator,
    pub roster: Roster,
    pub sweeper: Arc<RosterSweeper>,
}

impl AppState {
    /// Wire the sync engine around a store and a Codeforces source.
    pub fn new(config: Config, store: Arc<dyn RosterStore>, source: Arc<dyn CodeforcesApi>) -> Self {
        let policy = RetryPolicy::new(config.fetch_max_attempts, config.fetch_retry_delay);
        let fetcher = RetryingFetcher::new(source.clone());

        let contests = ContestReconciler::new(fetcher.clone(), store.clone(), policy);
        let submissions = SubmissionReconciler::new(
            fetcher,
            store.clone(),
            policy,
            config.submissions_page_size,
        );
        let sync = SyncOrchestrator::new(store.clone(), contests, submissions);

        let roster = Roster::new(store.clone(), sync.clone());

        let detector = InactivityDetector::new(store.clone(), config.inactivity_days);
        let sweeper = Arc::new(RosterSweeper::new(
            source,
            store.clone(),
            detector,
            sync.clone(),
            config.sweep_refresh_history,
        ));

        Self {
            config,
            store,
            sync,
            roster,
            sweeper,
        }
    }
}
