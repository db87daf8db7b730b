// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Retrying wrapper around [`CodeforcesApi`].

use crate::error::{FetchError, FetchExhausted};
use crate::services::codeforces::{open_envelope, ApiRequest, CodeforcesApi};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// How many times to try a request and how long to wait in between.
///
/// The delay is fixed; it does not grow between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(2000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Attempts actually made; a zero budget still makes one call.
    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Performs one logical request with bounded, strictly sequential retries.
#[derive(Clone)]
pub struct RetryingFetcher {
    source: Arc<dyn CodeforcesApi>,
}

impl RetryingFetcher {
    pub fn new(source: Arc<dyn CodeforcesApi>) -> Self {
        Self { source }
    }

    /// Fetch `request`, retrying every kind of failure until the policy is spent.
    ///
    /// Returns the envelope's `result` on the first successful attempt, or
    /// [`FetchExhausted`] carrying the last attempt's error.
    pub async fn fetch<T: DeserializeOwned + Send>(
        &self,
        request: &ApiRequest,
        policy: RetryPolicy,
    ) -> Result<T, FetchExhausted> {
        let max_attempts = policy.attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;

            let error = match self.attempt::<T>(request).await {
                Ok(result) => {
                    if attempt > 1 {
                        tracing::info!(request = %request, attempt, "Request succeeded after retry");
                    }
                    return Ok(result);
                }
                Err(e) => e,
            };

            if attempt >= max_attempts {
                tracing::warn!(
                    request = %request,
                    attempt,
                    max_attempts,
                    delay_ms = 0u64,
                    error = %error,
                    "Request attempt failed, giving up"
                );
                return Err(FetchExhausted {
                    request: request.to_string(),
                    attempts: attempt,
                    last: error,
                });
            }

            tracing::warn!(
                request = %request,
                attempt,
                max_attempts,
                delay_ms = policy.delay.as_millis() as u64,
                error = %error,
                "Request attempt failed, retrying"
            );
            tokio::time::sleep(policy.delay).await;
        }
    }

    async fn attempt<T: DeserializeOwned + Send>(
        &self,
        request: &ApiRequest,
    ) -> Result<T, FetchError> {
        let response = self.source.call(request).await?;
        open_envelope(&response)
    }
}
