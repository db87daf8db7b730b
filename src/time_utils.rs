// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time math.

use chrono::{DateTime, Duration, NaiveTime, SecondsFormat, Utc};

const SECONDS_PER_DAY: i64 = 86_400;

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Start (epoch seconds, inclusive) of the `[now - days, now]` window.
pub fn window_start(now: DateTime<Utc>, days: i64) -> i64 {
    now.timestamp() - days.saturating_mul(SECONDS_PER_DAY)
}

/// Next occurrence of `at` (UTC) strictly after `now`.
pub fn next_daily_run(now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}
