// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `ecobridge` library.
//!
//! This module provides a layered error hierarchy for handling failures
//! across the library: vendor protocol communication, authorization,
//! point reads and writes, and configuration parsing.
//!
//! The split matters for recovery: [`ProtocolError`] values can qualify
//! for the credential-refresh retry path, [`ReadError`] values are
//! recoverable conditions that a batch scrape downgrades to omissions,
//! while [`WriteError`] and [`ConfigError`] are reported immediately and
//! never retried.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred while talking to the vendor API.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred in the authorization flow.
    #[error("authorization error: {0}")]
    Auth(#[from] AuthError),

    /// Error occurred while reading a point.
    #[error("read error: {0}")]
    Read(#[from] ReadError),

    /// Error occurred while validating or performing a point write.
    #[error("write error: {0}")]
    Write(#[from] WriteError),

    /// Error occurred while parsing configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The named point is not configured on this interface.
    #[error("no point configured with name {0}")]
    PointNotFound(String),

    /// The interface holds no valid access token.
    #[error("device is not authorized")]
    NotAuthorized,

    /// The snapshot cache reported that no data is available yet.
    #[error("no device data available from the snapshot cache")]
    DataUnavailable,

    /// The external configuration store failed.
    #[error("config store error: {0}")]
    Store(String),
}

impl Error {
    /// Returns true if this error indicates a stale or rejected credential
    /// (or a connection failure with the same symptoms), making a write
    /// eligible for the refresh-and-replay path.
    #[must_use]
    pub fn is_credential_failure(&self) -> bool {
        matches!(self, Self::Protocol(p) if p.is_credential_failure())
    }
}

/// Errors related to vendor HTTP communication.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Connection to the vendor failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// The vendor rejected the bearer token.
    #[error("vendor rejected the access token")]
    TokenRejected,

    /// The vendor returned a non-success status.
    #[error("vendor request failed: HTTP {status} - {reason}")]
    RequestFailed {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase, if known.
        reason: String,
    },

    /// The vendor returned an empty or unusable response body.
    #[error("empty response from {0}")]
    EmptyResponse(String),

    /// The vendor returned a body that could not be decoded.
    #[error("malformed response: {0}")]
    MalformedResponse(#[from] serde_json::Error),
}

impl ProtocolError {
    /// Returns true for the stale-credential symptom class: an outright
    /// token rejection, a non-success status, or a connectivity failure
    /// that cannot be distinguished from one.
    #[must_use]
    pub fn is_credential_failure(&self) -> bool {
        match self {
            Self::TokenRejected
            | Self::RequestFailed { .. }
            | Self::ConnectionFailed(_)
            | Self::Timeout(_) => true,
            Self::Http(e) => e.is_connect() || e.is_timeout(),
            Self::EmptyResponse(_) | Self::MalformedResponse(_) => false,
        }
    }
}

/// Errors in the PIN-grant authorization flow.
///
/// A missing field in a token exchange is unrecoverable without restarting
/// the PIN flow, so these always propagate to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The vendor's authorization or token response omitted a required field.
    #[error("authorization response was missing required field {0}")]
    MissingResponseField(&'static str),

    /// A token exchange was attempted without the credential it consumes.
    #[error("no {0} available for token exchange")]
    MissingCredential(&'static str),
}

/// Recoverable errors when reading a point from the device snapshot.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// The register is configured write-only.
    #[error("requested read of write-only point {0}")]
    NotReadable(String),

    /// No snapshot has been fetched yet.
    #[error("no device data available from cache")]
    NoData,

    /// The thermostat or point could not be located in the snapshot.
    #[error("point {0} not available in device data")]
    NotFound(String),

    /// The point is served by the live summary query, never the snapshot.
    #[error("point {0} is read through the live summary query")]
    LiveOnly(String),
}

/// Validation errors raised before any write reaches the network.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WriteError {
    /// The register is configured read-only.
    #[error("attempted write of read-only point {0}")]
    ReadOnly(String),

    /// The write value must be a JSON object for this register.
    #[error("point {0} requires an object value for writes")]
    ExpectedObject(String),

    /// A required key is missing from the write value.
    #[error("write value for point {point} is missing required key {key}")]
    MissingKey {
        /// The point being written.
        point: String,
        /// The missing key.
        key: String,
    },

    /// A date field does not match the required `YYYY-mm-dd` format.
    #[error("invalid date in field {0}, expected YYYY-mm-dd")]
    InvalidDate(String),

    /// A time field does not match the required `HH:MM:SS` format.
    #[error("invalid time in field {0}, expected HH:MM:SS")]
    InvalidTime(String),

    /// A vacation delete needs a name string or an object with a name.
    #[error("deleting a vacation requires a name string or an object with a \"name\" field")]
    MissingVacationName,
}

/// Hard errors in registry or device configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A registry entry carried no usable point name.
    #[error("registry entry {0} has no point name")]
    MissingPointName(usize),

    /// A registry entry declared an unsupported register type.
    #[error("unsupported register type {kind} in registry entry {index}")]
    UnsupportedRegisterType {
        /// Position of the entry in the registry.
        index: usize,
        /// The declared type string.
        kind: String,
    },

    /// The thermostat identifier is not an integer.
    #[error("thermostat identifier must be an integer, got: {0}")]
    InvalidThermostatId(String),

    /// Two registry entries resolved to the same point name.
    #[error("duplicate point name {0} in registry")]
    DuplicatePointName(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
