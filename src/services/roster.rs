// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Roster management: registration, profile edits and removal.
//!
//! Ratings and the reminder counter are owned by the sweep; everything a
//! person edits about a user goes through [`Roster`].

use crate::config::SeedUser;
use crate::db::RosterStore;
use crate::error::{AppError, Result};
use crate::models::{NewUser, ProfileUpdate, User};
use crate::services::sync::SyncOrchestrator;
use std::sync::Arc;

#[derive(Clone)]
pub struct Roster {
    store: Arc<dyn RosterStore>,
    sync: SyncOrchestrator,
}

impl Roster {
    pub fn new(store: Arc<dyn RosterStore>, sync: SyncOrchestrator) -> Self {
        Self { store, sync }
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        self.store.list_users().await
    }

    /// Register a user and pull its history if it has a handle.
    ///
    /// A handle already on the roster is rejected. History sync failures are
    /// logged; the user stays registered.
    pub async fn register(&self, mut new_user: NewUser) -> Result<User> {
        new_user.handle = new_user
            .handle
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty());

        if let Some(handle) = &new_user.handle {
            self.ensure_handle_free(handle, None).await?;
        }

        let user = self.store.create_user(new_user).await?;
        self.sync_history(&user).await;
        Ok(user)
    }

    /// Apply a profile edit. A changed handle triggers a fresh history sync.
    pub async fn update(&self, user_id: u64, update: ProfileUpdate) -> Result<User> {
        let before = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))?;

        let new_handle = update
            .handle
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty());
        if let Some(handle) = new_handle {
            self.ensure_handle_free(handle, Some(user_id)).await?;
        }

        let user = self.store.update_user(user_id, update).await?;
        tracing::info!(
            user_id,
            handle = ?user.handle,
            reminders_enabled = user.reminders_enabled,
            "User profile updated"
        );

        if user.sync_handle() != before.sync_handle() {
            self.sync_history(&user).await;
        }
        Ok(user)
    }

    /// Remove a user and both of its histories. Returns false if absent.
    pub async fn remove(&self, user_id: u64) -> Result<bool> {
        let removed = self.store.delete_user(user_id).await?;
        if removed {
            tracing::info!(user_id, "User removed from roster");
        }
        Ok(removed)
    }

    /// Register the seed user if its handle is not tracked yet.
    ///
    /// Returns the newly created user, or `None` if the handle was already on
    /// the roster.
    pub async fn ensure_seed_user(&self, seed: &SeedUser) -> Result<Option<User>> {
        if self.store.find_user_by_handle(&seed.handle).await?.is_some() {
            tracing::debug!(handle = %seed.handle, "Seed user already registered");
            return Ok(None);
        }

        let user = self
            .register(NewUser {
                name: seed.name.clone(),
                email: seed.email.clone(),
                phone: None,
                handle: Some(seed.handle.clone()),
            })
            .await?;
        Ok(Some(user))
    }

    async fn ensure_handle_free(&self, handle: &str, owner: Option<u64>) -> Result<()> {
        match self.store.find_user_by_handle(handle).await? {
            Some(existing) if Some(existing.id) != owner => Err(AppError::BadRequest(format!(
                "Handle '{}' is already tracked by user {}",
                handle, existing.id
            ))),
            _ => Ok(()),
        }
    }

    /// Best-effort contest then submission sync for a freshly set handle.
    async fn sync_history(&self, user: &User) {
        let Some(handle) = user.sync_handle() else {
            return;
        };

        let contests = self.sync.refresh_contests(user.id, handle).await;
        let submissions = self.sync.refresh_submissions(user.id, handle).await;

        match (contests, submissions) {
            (Ok(contests), Ok(submissions)) => tracing::info!(
                user_id = user.id,
                handle,
                contests,
                submissions,
                "User history synced"
            ),
            (contests, submissions) => tracing::error!(
                user_id = user.id,
                handle,
                contest_error = ?contests.err(),
                submission_error = ?submissions.err(),
                "History sync failed"
            ),
        }
    }
}
