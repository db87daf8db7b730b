// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod contest;
pub mod submission;
pub mod user;

pub use contest::ContestResult;
pub use submission::SubmissionRecord;
pub use user::{NewUser, ProfileUpdate, User};
