// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vendor protocol implementation for the Ecobee cloud API.
//!
//! All vendor traffic goes through [`VendorClient`]: the PIN-grant
//! authorization calls, token exchanges, thermostat writes and the live
//! equipment-status summary. Responses are deserialized leniently; field
//! presence is validated by the callers that own the corresponding error
//! class.

mod http;

pub use http::VendorClient;

use serde::Deserialize;

/// Response to the PIN-grant authorization request.
#[derive(Debug, Clone, Deserialize)]
pub struct PinResponse {
    /// Authorization code to exchange for tokens after PIN approval.
    #[serde(default)]
    pub code: Option<String>,

    /// The PIN the operator must approve on the vendor portal.
    #[serde(rename = "ecobeePin", default)]
    pub pin: Option<String>,
}

/// Response to a token request or refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Bearer access token.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Refresh token for the next renewal.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Response from the thermostat summary endpoint.
///
/// Each status line has the shape `"<thermostat id>:<eq1>,<eq2>,..."`,
/// listing the equipment currently running for that thermostat.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryResponse {
    /// Per-thermostat status lines.
    #[serde(rename = "statusList", default)]
    pub status_list: Vec<String>,
}
