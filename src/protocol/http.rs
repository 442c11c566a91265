// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP client for the Ecobee cloud API.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::config::ApiEndpoints;
use crate::error::{ProtocolError, Result};

use super::{PinResponse, SummaryResponse, TokenResponse};

/// Selection body for the live equipment-status summary query.
const SUMMARY_SELECTION: &str =
    r#"{"selection":{"selectionType":"registered","selectionMatch":"","includeEquipmentStatus":true}}"#;

/// Client for the vendor HTTP API.
///
/// Endpoints and the API key are fixed at construction; every request
/// uses one bounded timeout. The client itself is credential-agnostic:
/// bearer tokens are passed per call by the authorization owner.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use ecobridge::{ApiEndpoints, VendorClient};
///
/// # fn example() -> ecobridge::Result<()> {
/// let client = VendorClient::new(
///     ApiEndpoints::default(),
///     "my-api-key",
///     Duration::from_secs(30),
/// )?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct VendorClient {
    client: Client,
    endpoints: ApiEndpoints,
    api_key: String,
    timeout_ms: u64,
}

impl VendorClient {
    /// Creates a new vendor client.
    ///
    /// # Errors
    ///
    /// Returns error if the underlying HTTP client cannot be created.
    pub fn new(
        endpoints: ApiEndpoints,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> std::result::Result<Self, ProtocolError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ProtocolError::Http)?;
        Ok(Self {
            client,
            endpoints,
            api_key: api_key.into(),
            timeout_ms: timeout.as_millis().try_into().unwrap_or(u64::MAX),
        })
    }

    /// Returns the configured endpoints.
    #[must_use]
    pub fn endpoints(&self) -> &ApiEndpoints {
        &self.endpoints
    }

    /// Starts the PIN-grant flow, requesting an authorization code and an
    /// operator-facing PIN.
    ///
    /// # Errors
    ///
    /// Returns error on connectivity failure or a non-success status.
    pub async fn authorize(&self) -> Result<PinResponse> {
        let url = self.endpoints.authorize_url();
        tracing::debug!(url, "Requesting PIN-grant authorization");

        let response = self
            .client
            .get(url)
            .query(&[
                ("response_type", "ecobeePin"),
                ("client_id", self.api_key.as_str()),
                ("scope", "smartWrite"),
            ])
            .send()
            .await
            .map_err(classify_with(self.timeout_ms))?;
        let response = check_status(response)?;
        Ok(response.json().await.map_err(classify_with(self.timeout_ms))?)
    }

    /// Exchanges the PIN-grant authorization code for a token pair.
    ///
    /// # Errors
    ///
    /// Returns error on connectivity failure or a non-success status.
    pub async fn request_tokens(&self, code: &str) -> Result<TokenResponse> {
        self.token_request(&[
            ("grant_type", "ecobeePin"),
            ("code", code),
            ("client_id", self.api_key.as_str()),
        ])
        .await
    }

    /// Exchanges the refresh token for a new token pair.
    ///
    /// # Errors
    ///
    /// Returns error on connectivity failure or a non-success status.
    pub async fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenResponse> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.api_key.as_str()),
        ])
        .await
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let url = self.endpoints.token_url();
        tracing::debug!(url, grant_type = form[0].1, "Requesting tokens");

        let response = self
            .client
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(classify_with(self.timeout_ms))?;
        let response = check_status(response)?;
        Ok(response.json().await.map_err(classify_with(self.timeout_ms))?)
    }

    /// Posts a thermostat write body (settings, holds, vacations or
    /// programs) to the bulk thermostat endpoint.
    ///
    /// # Errors
    ///
    /// Returns error on connectivity failure, token rejection, or any
    /// other non-success status.
    pub async fn post_thermostat(&self, access_token: &str, body: &Value) -> Result<()> {
        let url = self.endpoints.thermostat_url();
        tracing::debug!(url, %body, "Posting thermostat write");

        let response = self
            .client
            .post(url)
            .query(&[("format", "json")])
            .bearer_auth(access_token)
            .header("Content-Type", "application/json;charset=UTF-8")
            .json(body)
            .send()
            .await
            .map_err(classify_with(self.timeout_ms))?;
        check_status(response)?;
        Ok(())
    }

    /// Queries the live thermostat summary for equipment-running status.
    ///
    /// # Errors
    ///
    /// Returns error on connectivity failure, token rejection, or an
    /// empty response body.
    pub async fn thermostat_summary(&self, access_token: &str) -> Result<SummaryResponse> {
        let url = self.endpoints.summary_url();
        tracing::debug!(url, "Querying thermostat summary");

        let response = self
            .client
            .get(url)
            .query(&[("json", SUMMARY_SELECTION)])
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(classify_with(self.timeout_ms))?;
        let response = check_status(response)?;

        let body = response.text().await.map_err(classify_with(self.timeout_ms))?;
        if body.trim().is_empty() {
            return Err(ProtocolError::EmptyResponse("thermostatSummary".to_string()).into());
        }
        let summary = serde_json::from_str(&body).map_err(ProtocolError::MalformedResponse)?;
        Ok(summary)
    }
}

/// Maps transport-level reqwest failures onto the protocol taxonomy.
fn classify_with(timeout_ms: u64) -> impl Fn(reqwest::Error) -> ProtocolError {
    move |err| {
        if err.is_timeout() {
            ProtocolError::Timeout(timeout_ms)
        } else if err.is_connect() {
            ProtocolError::ConnectionFailed(err.to_string())
        } else {
            ProtocolError::Http(err)
        }
    }
}

/// Maps HTTP statuses onto the protocol taxonomy; 401 is the explicit
/// stale-credential signal.
fn check_status(response: reqwest::Response) -> std::result::Result<reqwest::Response, ProtocolError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(ProtocolError::TokenRejected);
    }
    if !status.is_success() {
        return Err(ProtocolError::RequestFailed {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        });
    }
    Ok(response)
}
