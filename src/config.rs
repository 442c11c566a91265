// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device configuration for the Ecobee bridge.
//!
//! All vendor URLs and identifiers are injected values fixed at
//! construction time, so multiple device instances can coexist in one
//! process without interference.

use std::time::Duration;

use crate::error::ConfigError;

/// Vendor API endpoints used by the bridge.
///
/// Defaults point at the production Ecobee cloud; tests and alternative
/// deployments can rebase every endpoint onto another host with
/// [`ApiEndpoints::with_base`].
///
/// # Examples
///
/// ```
/// use ecobridge::ApiEndpoints;
///
/// let endpoints = ApiEndpoints::default();
/// assert_eq!(endpoints.authorize_url(), "https://api.ecobee.com/authorize");
///
/// let local = ApiEndpoints::with_base("http://127.0.0.1:8080");
/// assert_eq!(local.token_url(), "http://127.0.0.1:8080/token");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    authorize_url: String,
    token_url: String,
    thermostat_url: String,
    summary_url: String,
}

impl ApiEndpoints {
    /// Builds endpoints rooted at the given base URL.
    ///
    /// The base must carry a scheme and host; a trailing slash is ignored.
    #[must_use]
    pub fn with_base(base: impl AsRef<str>) -> Self {
        let base = base.as_ref().trim_end_matches('/');
        Self {
            authorize_url: format!("{base}/authorize"),
            token_url: format!("{base}/token"),
            thermostat_url: format!("{base}/1/thermostat"),
            summary_url: format!("{base}/1/thermostatSummary"),
        }
    }

    /// PIN-grant authorization endpoint.
    #[must_use]
    pub fn authorize_url(&self) -> &str {
        &self.authorize_url
    }

    /// Token exchange endpoint.
    #[must_use]
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Bulk thermostat data and write endpoint.
    #[must_use]
    pub fn thermostat_url(&self) -> &str {
        &self.thermostat_url
    }

    /// Live equipment-status summary endpoint.
    #[must_use]
    pub fn summary_url(&self) -> &str {
        &self.summary_url
    }
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self::with_base("https://api.ecobee.com")
    }
}

/// Configuration for one bridged thermostat.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use ecobridge::DeviceConfig;
///
/// let config = DeviceConfig::new("my-api-key", 8675309)
///     .with_group_id("building-7")
///     .with_refresh_interval(Duration::from_secs(300));
///
/// assert_eq!(config.auth_store_path(), "drivers/auth/ecobee_building-7");
/// ```
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    api_key: String,
    thermostat_id: u32,
    group_id: String,
    endpoints: ApiEndpoints,
    refresh_interval: Duration,
    pin_grace: Duration,
    http_timeout: Duration,
}

impl DeviceConfig {
    /// Default interval between snapshot refreshes.
    pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(180);
    /// Default pause after surfacing the PIN, giving the operator time to
    /// approve it before the first token request.
    pub const DEFAULT_PIN_GRACE: Duration = Duration::from_secs(60);
    /// Default timeout for vendor HTTP calls.
    pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

    /// Creates a configuration for the given API key and thermostat.
    #[must_use]
    pub fn new(api_key: impl Into<String>, thermostat_id: u32) -> Self {
        Self {
            api_key: api_key.into(),
            thermostat_id,
            group_id: "default".to_string(),
            endpoints: ApiEndpoints::default(),
            refresh_interval: Self::DEFAULT_REFRESH_INTERVAL,
            pin_grace: Self::DEFAULT_PIN_GRACE,
            http_timeout: Self::DEFAULT_HTTP_TIMEOUT,
        }
    }

    /// Sets the group identifier used to namespace persisted credentials.
    #[must_use]
    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = group_id.into();
        self
    }

    /// Overrides the vendor endpoints.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: ApiEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Sets the snapshot refresh interval.
    #[must_use]
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Sets the pause between surfacing the PIN and the first token request.
    #[must_use]
    pub fn with_pin_grace(mut self, grace: Duration) -> Self {
        self.pin_grace = grace;
        self
    }

    /// Sets the vendor HTTP call timeout.
    #[must_use]
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Returns the vendor API key.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Returns the thermostat identifier.
    #[must_use]
    pub fn thermostat_id(&self) -> u32 {
        self.thermostat_id
    }

    /// Returns the credential group identifier.
    #[must_use]
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Returns the configured endpoints.
    #[must_use]
    pub fn endpoints(&self) -> &ApiEndpoints {
        &self.endpoints
    }

    /// Returns the snapshot refresh interval.
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// Returns the PIN approval grace interval.
    #[must_use]
    pub fn pin_grace(&self) -> Duration {
        self.pin_grace
    }

    /// Returns the vendor HTTP call timeout.
    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        self.http_timeout
    }

    /// Returns the config-store path for this device's credential record,
    /// derived from the group identifier.
    #[must_use]
    pub fn auth_store_path(&self) -> String {
        format!("drivers/auth/ecobee_{}", self.group_id)
    }
}

/// Parses a thermostat identifier that platform configuration may deliver
/// as either an integer or a numeric string.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidThermostatId`] when the value is not an
/// unsigned integer.
pub fn parse_thermostat_id(value: &serde_json::Value) -> Result<u32, ConfigError> {
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| ConfigError::InvalidThermostatId(value.to_string())),
        serde_json::Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidThermostatId(s.clone())),
        other => Err(ConfigError::InvalidThermostatId(other.to_string())),
    }
}
