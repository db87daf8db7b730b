// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process [`RosterStore`] used by tests and `STORE_BACKEND=memory` runs.

use crate::db::RosterStore;
use crate::error::AppError;
use crate::models::{ContestResult, NewUser, ProfileUpdate, SubmissionRecord, User};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    next_id: u64,
    users: BTreeMap<u64, User>,
    contests: HashMap<u64, Vec<ContestResult>>,
    submissions: HashMap<u64, Vec<SubmissionRecord>>,
    history_writes: HashMap<u64, usize>,
}

/// Roster store held entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully-formed user, keeping ID allocation ahead of it.
    pub async fn insert_user(&self, user: User) {
        let mut inner = self.inner.write().await;
        inner.next_id = inner.next_id.max(user.id);
        inner.users.insert(user.id, user);
    }

    /// Number of history replacements (contest or submission) done for a user.
    pub async fn history_writes(&self, user_id: u64) -> usize {
        self.inner
            .read()
            .await
            .history_writes
            .get(&user_id)
            .copied()
            .unwrap_or(0)
    }

    /// Full stored contest history for a user, in stored order.
    pub async fn all_contests(&self, user_id: u64) -> Vec<ContestResult> {
        self.inner
            .read()
            .await
            .contests
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Full stored submission history for a user, in stored order.
    pub async fn all_submissions(&self, user_id: u64) -> Vec<SubmissionRecord> {
        self.inner
            .read()
            .await
            .submissions
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl RosterStore for MemoryStore {
    async fn get_user(&self, user_id: u64) -> Result<Option<User>, AppError> {
        Ok(self.inner.read().await.users.get(&user_id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.inner.read().await.users.values().cloned().collect())
    }

    async fn find_user_by_handle(&self, handle: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .inner
            .read()
            .await
            .users
            .values()
            .find(|u| u.handle.as_deref() == Some(handle))
            .cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let user = User::register(inner.next_id, new_user, chrono::Utc::now().to_rfc3339());
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, user_id: u64, update: ProfileUpdate) -> Result<User, AppError> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))?;
        update.apply(user);
        Ok(user.clone())
    }

    async fn update_ratings(
        &self,
        user_id: u64,
        current_rating: i32,
        max_rating: i32,
        synced_at: &str,
    ) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))?;
        user.current_rating = Some(current_rating);
        user.max_rating = Some(max_rating);
        user.last_synced_at = Some(synced_at.to_string());
        Ok(())
    }

    async fn increment_reminders(&self, user_id: u64) -> Result<u32, AppError> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))?;
        user.reminders_sent += 1;
        Ok(user.reminders_sent)
    }

    async fn delete_user(&self, user_id: u64) -> Result<bool, AppError> {
        let mut inner = self.inner.write().await;
        inner.contests.remove(&user_id);
        inner.submissions.remove(&user_id);
        inner.history_writes.remove(&user_id);
        Ok(inner.users.remove(&user_id).is_some())
    }

    async fn replace_contests(
        &self,
        user_id: u64,
        contests: Vec<ContestResult>,
    ) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        inner.contests.insert(user_id, contests);
        *inner.history_writes.entry(user_id).or_default() += 1;
        Ok(())
    }

    async fn replace_submissions(
        &self,
        user_id: u64,
        submissions: Vec<SubmissionRecord>,
    ) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        inner.submissions.insert(user_id, submissions);
        *inner.history_writes.entry(user_id).or_default() += 1;
        Ok(())
    }

    async fn contests_since(
        &self,
        user_id: u64,
        since: i64,
    ) -> Result<Vec<ContestResult>, AppError> {
        let inner = self.inner.read().await;
        let mut contests: Vec<ContestResult> = inner
            .contests
            .get(&user_id)
            .map(|c| c.iter().filter(|c| c.timestamp >= since).cloned().collect())
            .unwrap_or_default();
        // Stable sort keeps snapshot order for equal timestamps.
        contests.sort_by_key(|c| c.timestamp);
        Ok(contests)
    }

    async fn submissions_since(
        &self,
        user_id: u64,
        since: i64,
    ) -> Result<Vec<SubmissionRecord>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .submissions
            .get(&user_id)
            .map(|s| s.iter().filter(|s| s.timestamp >= since).cloned().collect())
            .unwrap_or_default())
    }

    async fn count_submissions_since(&self, user_id: u64, since: i64) -> Result<usize, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .submissions
            .get(&user_id)
            .map(|s| s.iter().filter(|s| s.timestamp >= since).count())
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(handle: &str) -> NewUser {
        NewUser {
            name: handle.to_string(),
            email: None,
            phone: None,
            handle: Some(handle.to_string()),
        }
    }

    fn contest(user_id: u64, name: &str, timestamp: i64) -> ContestResult {
        ContestResult {
            user_id,
            contest_name: name.to_string(),
            rank: 1,
            old_rating: 1500,
            new_rating: 1520,
            timestamp,
        }
    }

    #[tokio::test]
    async fn test_create_user_allocates_increasing_ids() {
        let store = MemoryStore::new();
        let a = store.create_user(new_user("a")).await.unwrap();
        let b = store.create_user(new_user("b")).await.unwrap();

        assert!(b.id > a.id);
        assert!(a.reminders_enabled);
        assert_eq!(a.reminders_sent, 0);
        assert_eq!(
            store.find_user_by_handle("b").await.unwrap().map(|u| u.id),
            Some(b.id)
        );
    }

    #[tokio::test]
    async fn test_contests_since_filters_and_orders() {
        let store = MemoryStore::new();
        store
            .replace_contests(
                1,
                vec![contest(1, "late", 300), contest(1, "old", 100), contest(1, "mid", 200)],
            )
            .await
            .unwrap();

        let names: Vec<String> = store
            .contests_since(1, 200)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.contest_name)
            .collect();
        assert_eq!(names, vec!["mid", "late"]);
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("gone")).await.unwrap();
        store
            .replace_contests(user.id, vec![contest(user.id, "c", 1)])
            .await
            .unwrap();

        assert!(store.delete_user(user.id).await.unwrap());
        assert!(store.get_user(user.id).await.unwrap().is_none());
        assert!(store.all_contests(user.id).await.is_empty());
        assert!(!store.delete_user(user.id).await.unwrap());
    }
}
