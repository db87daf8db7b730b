//! Roster user model for storage and API.

use serde::{Deserialize, Serialize};

/// Tracked user stored in the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Roster ID (also used as document ID)
    pub id: u64,
    pub name: String,
    /// Email address reminders would go to
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Codeforces handle; users without one are never synced
    pub handle: Option<String>,
    /// Last known rating (None until the first successful sweep)
    pub current_rating: Option<i32>,
    pub max_rating: Option<i32>,
    /// When ratings were last refreshed (RFC3339)
    pub last_synced_at: Option<String>,
    /// Number of inactivity reminders flagged so far
    pub reminders_sent: u32,
    /// Whether the user opted in to inactivity reminders
    pub reminders_enabled: bool,
    /// When the user was registered (RFC3339)
    pub created_at: String,
}

/// Fields supplied when registering a user.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub handle: Option<String>,
}

/// Profile edit. `None` leaves a field unchanged.
///
/// A blank `email`, `phone` or `handle` clears the field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub handle: Option<String>,
    pub reminders_enabled: Option<bool>,
}

impl ProfileUpdate {
    /// Apply the edit to `user` in place.
    pub fn apply(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(email) = self.email {
            user.email = non_blank(email);
        }
        if let Some(phone) = self.phone {
            user.phone = non_blank(phone);
        }
        if let Some(handle) = self.handle {
            user.handle = non_blank(handle);
        }
        if let Some(enabled) = self.reminders_enabled {
            user.reminders_enabled = enabled;
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl User {
    /// Build the stored record for a freshly registered user.
    pub fn register(id: u64, new_user: NewUser, created_at: String) -> Self {
        Self {
            id,
            name: new_user.name,
            email: new_user.email,
            phone: new_user.phone,
            handle: new_user.handle,
            current_rating: None,
            max_rating: None,
            last_synced_at: None,
            reminders_sent: 0,
            reminders_enabled: true,
            created_at,
        }
    }

    /// Handle to sync with, if the user has a non-blank one.
    pub fn sync_handle(&self) -> Option<&str> {
        self.handle
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
    }
}
