// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Contest history model for storage and API.

use serde::{Deserialize, Serialize};

/// One rated contest participation, copied from the rating history snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestResult {
    /// Roster ID of the owning user
    pub user_id: u64,
    pub contest_name: String,
    pub rank: u32,
    pub old_rating: i32,
    pub new_rating: i32,
    /// Rating update time (seconds since epoch)
    pub timestamp: i64,
}
