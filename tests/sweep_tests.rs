// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily roster sweep: rating refresh, optional history sync and inactivity.

use cf_tracker::config::Config;
use cf_tracker::db::{MemoryStore, RosterStore};
use cf_tracker::models::{ProfileUpdate, SubmissionRecord};
use cf_tracker::services::SweepReport;
use serde_json::json;
use std::sync::Arc;

mod common;
use common::{
    connection_refused, days_ago, failed, ok, rating_change, submission, test_state, test_user,
    user_info, FakeCodeforces,
};

fn recent_submission(user_id: u64) -> SubmissionRecord {
    SubmissionRecord {
        user_id,
        problem_name: "Way Too Long Words".to_string(),
        rating: Some(800),
        verdict: "OK".to_string(),
        timestamp: days_ago(1),
    }
}

#[tokio::test]
async fn test_sweep_updates_ratings() {
    let store = Arc::new(MemoryStore::new());
    store.insert_user(test_user(1, Some("tourist"))).await;
    store
        .replace_submissions(1, vec![recent_submission(1)])
        .await
        .unwrap();
    let source = FakeCodeforces::new();
    source.always("user.info", ok(json!([user_info("tourist", Some(3700), Some(4009))])));
    let state = test_state(Config::test_default(), store.clone(), source.clone());

    let report = state.sweeper.sweep().await.unwrap();

    assert_eq!(
        report,
        SweepReport {
            users_seen: 1,
            ratings_refreshed: 1,
            ..Default::default()
        }
    );
    let user = store.get_user(1).await.unwrap().unwrap();
    assert_eq!(user.current_rating, Some(3700));
    assert_eq!(user.max_rating, Some(4009));
    assert!(user.last_synced_at.is_some());
    assert_eq!(user.reminders_sent, 0);
}

#[tokio::test]
async fn test_unrated_user_gets_zero_ratings() {
    let store = Arc::new(MemoryStore::new());
    store.insert_user(test_user(1, Some("newbie"))).await;
    let source = FakeCodeforces::new();
    source.always("user.info", ok(json!([user_info("newbie", None, None)])));
    let state = test_state(Config::test_default(), store.clone(), source);

    state.sweeper.sweep().await.unwrap();

    let user = store.get_user(1).await.unwrap().unwrap();
    assert_eq!(user.current_rating, Some(0));
    assert_eq!(user.max_rating, Some(0));
}

#[tokio::test]
async fn test_one_failing_user_does_not_stop_sweep() {
    let store = Arc::new(MemoryStore::new());
    store.insert_user(test_user(1, Some("ghost"))).await;
    store.insert_user(test_user(2, Some("petr"))).await;
    store
        .replace_submissions(1, vec![recent_submission(1)])
        .await
        .unwrap();
    store
        .replace_submissions(2, vec![recent_submission(2)])
        .await
        .unwrap();

    let source = FakeCodeforces::new();
    source.then("user.info", failed("handles: User with handle ghost not found"));
    source.then("user.info", ok(json!([user_info("petr", Some(3300), Some(3500))])));
    let state = test_state(Config::test_default(), store.clone(), source.clone());

    let report = state.sweeper.sweep().await.unwrap();

    assert_eq!(report.users_seen, 2);
    assert_eq!(report.rating_failures, 1);
    assert_eq!(report.ratings_refreshed, 1);

    let ghost = store.get_user(1).await.unwrap().unwrap();
    assert_eq!(ghost.current_rating, None);
    assert_eq!(ghost.last_synced_at, None);

    let petr = store.get_user(2).await.unwrap().unwrap();
    assert_eq!(petr.current_rating, Some(3300));
}

#[tokio::test]
async fn test_rating_refresh_is_single_attempt() {
    let store = Arc::new(MemoryStore::new());
    store.insert_user(test_user(1, Some("tourist"))).await;
    let source = FakeCodeforces::new();
    source.always("user.info", connection_refused());
    let state = test_state(Config::test_default(), store, source.clone());

    state.sweeper.sweep().await.unwrap();

    assert_eq!(source.calls("user.info"), 1);
}

#[tokio::test]
async fn test_inactivity_checked_even_when_rating_fails() {
    let store = Arc::new(MemoryStore::new());
    store.insert_user(test_user(1, Some("tourist"))).await;
    let source = FakeCodeforces::new();
    source.always("user.info", connection_refused());
    let state = test_state(Config::test_default(), store.clone(), source);

    let report = state.sweeper.sweep().await.unwrap();

    assert_eq!(report.rating_failures, 1);
    assert_eq!(report.reminders_due, 1);
    let user = store.get_user(1).await.unwrap().unwrap();
    assert_eq!(user.reminders_sent, 1);
}

#[tokio::test]
async fn test_empty_user_info_result_is_a_failure() {
    let store = Arc::new(MemoryStore::new());
    store.insert_user(test_user(1, Some("tourist"))).await;
    let source = FakeCodeforces::new();
    source.always("user.info", ok(json!([])));
    let state = test_state(Config::test_default(), store.clone(), source);

    let report = state.sweeper.sweep().await.unwrap();

    assert_eq!(report.rating_failures, 1);
    let user = store.get_user(1).await.unwrap().unwrap();
    assert_eq!(user.last_synced_at, None);
}

#[tokio::test]
async fn test_users_without_handle_are_skipped() {
    let store = Arc::new(MemoryStore::new());
    store.insert_user(test_user(1, None)).await;
    store.insert_user(test_user(2, Some("   "))).await;
    let source = FakeCodeforces::new();
    let state = test_state(Config::test_default(), store.clone(), source.clone());

    let report = state.sweeper.sweep().await.unwrap();

    assert_eq!(report.users_seen, 2);
    assert_eq!(report.skipped_without_handle, 2);
    assert!(source.requests().is_empty());
    let user = store.get_user(1).await.unwrap().unwrap();
    assert_eq!(user.reminders_sent, 0);
}

#[tokio::test]
async fn test_reminders_disabled_user_not_flagged() {
    let store = Arc::new(MemoryStore::new());
    let mut user = test_user(1, Some("tourist"));
    user.reminders_enabled = false;
    store.insert_user(user).await;
    let source = FakeCodeforces::new();
    source.always("user.info", ok(json!([user_info("tourist", Some(3700), Some(4009))])));
    let state = test_state(Config::test_default(), store.clone(), source);

    let report = state.sweeper.sweep().await.unwrap();

    assert_eq!(report.reminders_due, 0);
    let user = store.get_user(1).await.unwrap().unwrap();
    assert_eq!(user.reminders_sent, 0);
    assert_eq!(user.current_rating, Some(3700));
}

#[tokio::test]
async fn test_opt_out_through_roster_edit_skips_reminder() {
    let store = Arc::new(MemoryStore::new());
    store.insert_user(test_user(1, Some("tourist"))).await;
    let source = FakeCodeforces::new();
    source.always("user.info", ok(json!([user_info("tourist", Some(3700), Some(4009))])));
    let state = test_state(Config::test_default(), store.clone(), source);

    // Inactive and opted in: flagged.
    let report = state.sweeper.sweep().await.unwrap();
    assert_eq!(report.reminders_due, 1);

    state
        .roster
        .update(
            1,
            ProfileUpdate {
                reminders_enabled: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let report = state.sweeper.sweep().await.unwrap();
    assert_eq!(report.reminders_due, 0);
    assert_eq!(store.get_user(1).await.unwrap().unwrap().reminders_sent, 1);
}

#[tokio::test]
async fn test_history_untouched_unless_enabled() {
    let store = Arc::new(MemoryStore::new());
    store.insert_user(test_user(1, Some("tourist"))).await;
    let source = FakeCodeforces::new();
    source.always("user.info", ok(json!([user_info("tourist", Some(3700), Some(4009))])));
    let state = test_state(Config::test_default(), store.clone(), source.clone());

    state.sweeper.sweep().await.unwrap();

    assert_eq!(source.calls("user.rating"), 0);
    assert_eq!(source.calls("user.status"), 0);
    assert_eq!(store.history_writes(1).await, 0);
}

#[tokio::test]
async fn test_history_refresh_feeds_inactivity_check() {
    let store = Arc::new(MemoryStore::new());
    store.insert_user(test_user(1, Some("tourist"))).await;
    let source = FakeCodeforces::new();
    source.always("user.info", ok(json!([user_info("tourist", Some(3700), Some(4009))])));
    source.always(
        "user.rating",
        ok(json!([rating_change("Round 1", 1, 3600, 3700, days_ago(3))])),
    );
    source.always(
        "user.status",
        ok(json!([submission("Two Buttons", Some(1400), Some("OK"), days_ago(1))])),
    );
    let config = Config {
        sweep_refresh_history: true,
        ..Config::test_default()
    };
    let state = test_state(config, store.clone(), source);

    let report = state.sweeper.sweep().await.unwrap();

    assert_eq!(report.history_failures, 0);
    assert_eq!(report.reminders_due, 0);
    assert_eq!(store.all_contests(1).await.len(), 1);
    assert_eq!(store.all_submissions(1).await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_history_failure_counted_and_sweep_continues() {
    let store = Arc::new(MemoryStore::new());
    store.insert_user(test_user(1, Some("tourist"))).await;
    let source = FakeCodeforces::new();
    source.always("user.info", ok(json!([user_info("tourist", Some(3700), Some(4009))])));
    source.always("user.rating", connection_refused());
    source.always("user.status", ok(json!([])));
    let config = Config {
        sweep_refresh_history: true,
        ..Config::test_default()
    };
    let state = test_state(config, store.clone(), source.clone());

    let report = state.sweeper.sweep().await.unwrap();

    assert_eq!(report.ratings_refreshed, 1);
    assert_eq!(report.history_failures, 1);
    assert_eq!(source.calls("user.rating"), 3);
    assert_eq!(report.reminders_due, 1);
}
