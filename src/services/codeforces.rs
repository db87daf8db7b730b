// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Codeforces API client.
//!
//! Handles:
//! - The three read-only endpoints keyed by handle (rating history,
//!   submission history, user info)
//! - Unwrapping the `{status, comment, result}` envelope every endpoint uses

use crate::error::FetchError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// One logical request against the Codeforces API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiRequest {
    /// `user.rating`: every rated contest of a handle.
    RatingHistory { handle: String },
    /// `user.status`: one page of submissions, newest first.
    SubmissionHistory {
        handle: String,
        from: u32,
        count: u32,
    },
    /// `user.info`: current profile of a handle.
    UserInfo { handle: String },
}

impl ApiRequest {
    /// API method name appended to the base URL.
    pub fn method(&self) -> &'static str {
        match self {
            ApiRequest::RatingHistory { .. } => "user.rating",
            ApiRequest::SubmissionHistory { .. } => "user.status",
            ApiRequest::UserInfo { .. } => "user.info",
        }
    }

    pub fn handle(&self) -> &str {
        match self {
            ApiRequest::RatingHistory { handle }
            | ApiRequest::SubmissionHistory { handle, .. }
            | ApiRequest::UserInfo { handle } => handle,
        }
    }

    /// Query parameters for the request.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            ApiRequest::RatingHistory { handle } => vec![("handle", handle.clone())],
            ApiRequest::SubmissionHistory {
                handle,
                from,
                count,
            } => vec![
                ("handle", handle.clone()),
                ("from", from.to_string()),
                ("count", count.to_string()),
            ],
            ApiRequest::UserInfo { handle } => vec![("handles", handle.clone())],
        }
    }
}

impl fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.method(), self.handle())
    }
}

/// Raw HTTP outcome of one call: status code and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Source of Codeforces data.
///
/// Implementations perform exactly one call per invocation and only fail
/// with [`FetchError::Transport`]; judging the response is left to
/// [`open_envelope`] so every caller applies the same rule.
#[async_trait]
pub trait CodeforcesApi: Send + Sync {
    async fn call(&self, request: &ApiRequest) -> Result<RawResponse, FetchError>;
}

/// Codeforces API client over HTTP.
#[derive(Clone)]
pub struct CodeforcesClient {
    http: reqwest::Client,
    base_url: String,
}

impl CodeforcesClient {
    /// Create a client for `base_url` (e.g. `https://codeforces.com/api`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl CodeforcesApi for CodeforcesClient {
    async fn call(&self, request: &ApiRequest) -> Result<RawResponse, FetchError> {
        let url = format!("{}/{}", self.base_url, request.method());

        let response = self
            .http
            .get(&url)
            .query(&request.query())
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(format!("Failed to read body: {}", e)))?;

        Ok(RawResponse { status, body })
    }
}

/// Response envelope shared by all Codeforces endpoints.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: String,
    comment: Option<String>,
    result: Option<T>,
}

/// Decide whether a response is a success and extract its `result`.
///
/// Success requires a 2xx transport status, an envelope `status` of `"OK"`
/// and a `result` that deserialises as `T`. Anything else is an
/// [`FetchError::UpstreamStatus`].
pub fn open_envelope<T: DeserializeOwned>(response: &RawResponse) -> Result<T, FetchError> {
    let envelope: Result<Envelope<T>, _> = serde_json::from_str(&response.body);
    let transport_ok = (200..300).contains(&response.status);

    match envelope {
        Ok(Envelope {
            status,
            result: Some(result),
            ..
        }) if transport_ok && status == "OK" => Ok(result),
        Ok(Envelope {
            status, comment, ..
        }) => Err(FetchError::UpstreamStatus(format!(
            "HTTP {}, status {}: {}",
            response.status,
            status,
            comment.unwrap_or_else(|| "no result".to_string())
        ))),
        Err(e) if transport_ok => Err(FetchError::UpstreamStatus(format!(
            "Malformed envelope: {}",
            e
        ))),
        Err(_) => Err(FetchError::UpstreamStatus(format!(
            "HTTP {}",
            response.status
        ))),
    }
}

// ─── Wire Types ──────────────────────────────────────────────────────────────

/// Element of the `user.rating` result.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingChange {
    pub contest_name: String,
    pub rank: u32,
    pub old_rating: i32,
    pub new_rating: i32,
    pub rating_update_time_seconds: i64,
}

/// Element of the `user.status` result.
///
/// Every field the sync depends on is optional so one odd submission
/// cannot fail the whole page.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CfSubmission {
    pub problem: Option<CfProblem>,
    pub verdict: Option<String>,
    pub creation_time_seconds: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CfProblem {
    pub name: Option<String>,
    pub rating: Option<i32>,
}

/// Element of the `user.info` result.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CfUserInfo {
    pub handle: String,
    pub rating: Option<i32>,
    pub max_rating: Option<i32>,
}
