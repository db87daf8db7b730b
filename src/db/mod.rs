//! Database layer.
//!
//! Every component talks to storage through [`RosterStore`], so the
//! Firestore backend can be swapped for [`MemoryStore`] in tests and local runs.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{ContestResult, NewUser, ProfileUpdate, SubmissionRecord, User};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Counter documents used to allocate roster IDs
    pub const COUNTERS: &str = "counters";
    /// Current-generation manifest per user, one per history kind
    pub const CONTEST_MANIFESTS: &str = "contest_history";
    pub const SUBMISSION_MANIFESTS: &str = "submission_history";
    /// Snapshot chunks referenced by the manifests
    pub const CONTEST_CHUNKS: &str = "contest_chunks";
    pub const SUBMISSION_CHUNKS: &str = "submission_chunks";
}

/// Storage port shared by the sync engine and the HTTP layer.
///
/// `replace_*` must be atomic: readers observe either the previous snapshot
/// or the new one, never a mix or an empty gap.
#[async_trait]
pub trait RosterStore: Send + Sync {
    async fn get_user(&self, user_id: u64) -> Result<Option<User>, AppError>;

    async fn list_users(&self) -> Result<Vec<User>, AppError>;

    async fn find_user_by_handle(&self, handle: &str) -> Result<Option<User>, AppError>;

    /// Register a user and return the stored record with its new ID.
    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError>;

    /// Apply a profile edit and return the updated user.
    async fn update_user(&self, user_id: u64, update: ProfileUpdate) -> Result<User, AppError>;

    /// Record refreshed ratings and the sync timestamp.
    async fn update_ratings(
        &self,
        user_id: u64,
        current_rating: i32,
        max_rating: i32,
        synced_at: &str,
    ) -> Result<(), AppError>;

    /// Bump the reminder counter, returning the new value.
    async fn increment_reminders(&self, user_id: u64) -> Result<u32, AppError>;

    /// Delete the user together with both histories. Returns false if absent.
    async fn delete_user(&self, user_id: u64) -> Result<bool, AppError>;

    /// Replace the user's whole contest history with `contests`, keeping order.
    async fn replace_contests(
        &self,
        user_id: u64,
        contests: Vec<ContestResult>,
    ) -> Result<(), AppError>;

    /// Replace the user's whole submission history with `submissions`, keeping order.
    async fn replace_submissions(
        &self,
        user_id: u64,
        submissions: Vec<SubmissionRecord>,
    ) -> Result<(), AppError>;

    /// Contests at or after `since` (epoch seconds), oldest first.
    async fn contests_since(
        &self,
        user_id: u64,
        since: i64,
    ) -> Result<Vec<ContestResult>, AppError>;

    /// Submissions at or after `since` (epoch seconds), in snapshot order.
    async fn submissions_since(
        &self,
        user_id: u64,
        since: i64,
    ) -> Result<Vec<SubmissionRecord>, AppError>;

    async fn count_submissions_since(&self, user_id: u64, since: i64) -> Result<usize, AppError>;
}
