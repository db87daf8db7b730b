// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use cf_tracker::config::Config;
use cf_tracker::db::{FirestoreDb, MemoryStore};
use cf_tracker::error::FetchError;
use cf_tracker::models::User;
use cf_tracker::routes::create_router;
use cf_tracker::services::{ApiRequest, CodeforcesApi, RawResponse};
use cf_tracker::AppState;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

#[allow(dead_code)]
type Reply = Result<RawResponse, FetchError>;

/// Scripted stand-in for the Codeforces API.
///
/// Each API method has a queue of one-shot replies and an optional
/// fallback used once the queue is empty. Unscripted calls fail with a
/// transport error.
#[allow(dead_code)]
#[derive(Default)]
pub struct FakeCodeforces {
    queued: Mutex<HashMap<&'static str, VecDeque<Reply>>>,
    fallback: Mutex<HashMap<&'static str, Reply>>,
    calls: Mutex<Vec<ApiRequest>>,
}

#[allow(dead_code)]
impl FakeCodeforces {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Reply to every call of `method` with `reply` (after queued replies).
    pub fn always(&self, method: &'static str, reply: Reply) {
        self.fallback.lock().unwrap().insert(method, reply);
    }

    /// Queue a single reply for the next call of `method`.
    pub fn then(&self, method: &'static str, reply: Reply) {
        self.queued
            .lock()
            .unwrap()
            .entry(method)
            .or_default()
            .push_back(reply);
    }

    /// Number of calls made for `method`.
    pub fn calls(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method() == method)
            .count()
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CodeforcesApi for FakeCodeforces {
    async fn call(&self, request: &ApiRequest) -> Result<RawResponse, FetchError> {
        self.calls.lock().unwrap().push(request.clone());
        let method = request.method();

        if let Some(reply) = self
            .queued
            .lock()
            .unwrap()
            .get_mut(method)
            .and_then(VecDeque::pop_front)
        {
            return reply;
        }

        self.fallback
            .lock()
            .unwrap()
            .get(method)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::Transport(format!("no reply for {}", request))))
    }
}

// ─── Reply Builders ──────────────────────────────────────────────────────────

#[allow(dead_code)]
pub fn ok(result: Value) -> Reply {
    Ok(RawResponse::new(
        200,
        json!({ "status": "OK", "result": result }).to_string(),
    ))
}

#[allow(dead_code)]
pub fn failed(comment: &str) -> Reply {
    Ok(RawResponse::new(
        400,
        json!({ "status": "FAILED", "comment": comment }).to_string(),
    ))
}

#[allow(dead_code)]
pub fn connection_refused() -> Reply {
    Err(FetchError::Transport("connection refused".to_string()))
}

#[allow(dead_code)]
pub fn rating_change(contest: &str, rank: u32, old: i32, new: i32, time: i64) -> Value {
    json!({
        "contestId": 1,
        "contestName": contest,
        "handle": "tourist",
        "rank": rank,
        "ratingUpdateTimeSeconds": time,
        "oldRating": old,
        "newRating": new,
    })
}

#[allow(dead_code)]
pub fn submission(problem: &str, rating: Option<i32>, verdict: Option<&str>, time: i64) -> Value {
    let mut problem_json = json!({ "contestId": 1, "index": "A", "name": problem });
    if let Some(rating) = rating {
        problem_json["rating"] = json!(rating);
    }

    let mut value = json!({
        "id": time,
        "creationTimeSeconds": time,
        "problem": problem_json,
    });
    if let Some(verdict) = verdict {
        value["verdict"] = json!(verdict);
    }
    value
}

#[allow(dead_code)]
pub fn user_info(handle: &str, rating: Option<i32>, max_rating: Option<i32>) -> Value {
    let mut value = json!({ "handle": handle });
    if let Some(rating) = rating {
        value["rating"] = json!(rating);
    }
    if let Some(max_rating) = max_rating {
        value["maxRating"] = json!(max_rating);
    }
    value
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

/// Seconds since epoch, `days` days ago.
#[allow(dead_code)]
pub fn days_ago(days: i64) -> i64 {
    chrono::Utc::now().timestamp() - days * 86_400
}

/// Helper to create a basic roster user.
#[allow(dead_code)]
pub fn test_user(id: u64, handle: Option<&str>) -> User {
    User {
        id,
        name: format!("User {}", id),
        email: Some(format!("user{}@example.com", id)),
        phone: None,
        handle: handle.map(str::to_string),
        current_rating: None,
        max_rating: None,
        last_synced_at: None,
        reminders_sent: 0,
        reminders_enabled: true,
        created_at: "2024-01-15T10:00:00Z".to_string(),
    }
}

/// Build application state over a memory store and a fake source.
#[allow(dead_code)]
pub fn test_state(
    config: Config,
    store: Arc<MemoryStore>,
    source: Arc<FakeCodeforces>,
) -> Arc<AppState> {
    Arc::new(AppState::new(config, store, source))
}

/// Create a test app with offline dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app(
    store: Arc<MemoryStore>,
    source: Arc<FakeCodeforces>,
) -> (axum::Router, Arc<AppState>) {
    let state = test_state(Config::test_default(), store, source);
    (create_router(state.clone()), state)
}
