// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Inactivity detection over the locally mirrored submissions.
//!
//! The check reads only what the last successful submission sync stored;
//! it never calls Codeforces.

use crate::db::RosterStore;
use crate::error::Result;
use crate::time_utils::window_start;
use std::sync::Arc;

/// Result of one inactivity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InactivityOutcome {
    /// No submissions in the window; the reminder counter was bumped.
    ReminderDue { reminders_sent: u32 },
    /// The user submitted within the window.
    Active { recent_submissions: usize },
}

/// Flags users with no recent submissions as due for a reminder.
#[derive(Clone)]
pub struct InactivityDetector {
    store: Arc<dyn RosterStore>,
    lookback_days: i64,
}

impl InactivityDetector {
    pub fn new(store: Arc<dyn RosterStore>, lookback_days: i64) -> Self {
        Self {
            store,
            lookback_days,
        }
    }

    /// Count stored submissions in the lookback window ending now and, if
    /// there are none, increment the user's reminder counter.
    ///
    /// Every call with an empty window increments again; there is no
    /// once-per-day deduplication.
    pub async fn check_and_maybe_flag(&self, user_id: u64) -> Result<InactivityOutcome> {
        let since = window_start(chrono::Utc::now(), self.lookback_days);
        let recent = self.store.count_submissions_since(user_id, since).await?;

        if recent > 0 {
            tracing::debug!(user_id, recent, "User active within lookback window");
            return Ok(InactivityOutcome::Active {
                recent_submissions: recent,
            });
        }

        let reminders_sent = self.store.increment_reminders(user_id).await?;
        tracing::info!(
            event = "reminder_due",
            user_id,
            lookback_days = self.lookback_days,
            reminders_sent,
            "Reminder due for inactive user"
        );

        Ok(InactivityOutcome::ReminderDue { reminders_sent })
    }
}
