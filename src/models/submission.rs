// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Submission history model for storage and API.

use serde::{Deserialize, Serialize};

/// One judged submission kept from the submission history snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    /// Roster ID of the owning user
    pub user_id: u64,
    pub problem_name: String,
    /// Problem difficulty, when Codeforces has assigned one
    pub rating: Option<i32>,
    pub verdict: String,
    /// Creation time (seconds since epoch)
    pub timestamp: i64,
}
