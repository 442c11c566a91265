// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Snapshot cache boundary.
//!
//! Bulk device data is fetched through a shared cache service that
//! deduplicates and rate-limits calls against the vendor API across
//! clients. This module defines that boundary as a trait; the cache's
//! eviction and rate-limiting policy stays on the other side of it.
//!
//! [`DirectCache`] is a passthrough implementation for embedding the
//! bridge without a cache service: every fetch goes straight to the
//! vendor.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::Value;

use crate::error::{ProtocolError, Result};

/// A request for the most recent cached response of an upstream URL.
#[derive(Debug, Clone)]
pub struct CacheRequest {
    /// Upstream URL to serve data for.
    pub url: String,
    /// Request headers, including the bearer authorization.
    pub headers: Vec<(String, String)>,
    /// Query parameters.
    pub params: Vec<(String, String)>,
    /// Target refresh interval the cache should honor.
    pub refresh_interval: Duration,
    /// When true, ask the cache to skip its stored copy and re-query the
    /// vendor. The cache may still decline under rate pressure.
    pub force_refresh: bool,
}

/// A cached upstream response with its fetch timestamp.
#[derive(Debug, Clone)]
pub struct CachedData {
    /// The upstream response body.
    pub payload: Value,
    /// When the cache fetched it.
    pub fetched_at: DateTime<Utc>,
}

/// Shared cache service boundary.
///
/// `Ok(None)` means the cache holds no data yet for this request — a
/// recoverable condition, not a failure. Errors are remote failures
/// (including the vendor rejecting the forwarded credentials) and feed
/// the interface's escalation logic.
#[allow(async_fn_in_trait)]
pub trait SnapshotCache {
    /// Fetches the most recent response for the described upstream
    /// request.
    ///
    /// # Errors
    ///
    /// Returns an error when the cache or the vendor behind it fails.
    async fn fetch(&self, request: &CacheRequest) -> Result<Option<CachedData>>;
}

/// Passthrough [`SnapshotCache`] that queries the vendor directly.
///
/// Useful for embedding without a shared cache service. It performs one
/// upstream request per fetch and ignores the refresh interval, so it
/// offers none of the rate protection a real cache service provides.
#[derive(Debug, Clone)]
pub struct DirectCache {
    client: Client,
    timeout_ms: u64,
}

impl DirectCache {
    /// Creates a passthrough cache with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new(timeout: Duration) -> std::result::Result<Self, ProtocolError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ProtocolError::Http)?;
        Ok(Self {
            client,
            timeout_ms: timeout.as_millis().try_into().unwrap_or(u64::MAX),
        })
    }
}

impl SnapshotCache for DirectCache {
    async fn fetch(&self, request: &CacheRequest) -> Result<Option<CachedData>> {
        tracing::debug!(url = %request.url, force = request.force_refresh, "Fetching upstream data");

        let mut builder = self.client.get(&request.url).query(&request.params);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ProtocolError::Timeout(self.timeout_ms)
            } else if e.is_connect() {
                ProtocolError::ConnectionFailed(e.to_string())
            } else {
                ProtocolError::Http(e)
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProtocolError::TokenRejected.into());
        }
        if !status.is_success() {
            return Err(ProtocolError::RequestFailed {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            }
            .into());
        }

        let payload: Value = response.json().await.map_err(ProtocolError::Http)?;
        Ok(Some(CachedData {
            payload,
            fetched_at: Utc::now(),
        }))
    }
}
