// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The OAuth2 PIN-grant authorization state machine.
//!
//! The controller drives a device from no credentials to a valid
//! access/refresh token pair and keeps that pair valid across vendor-side
//! expiry. It cycles indefinitely over the device's lifetime; there is no
//! terminal stage. Every transition that reaches [`AuthStage::Authorized`]
//! persists the credential triple to the external store before the stage
//! is considered stable.

use std::time::Duration;

use crate::error::{AuthError, Error, Result};
use crate::protocol::{TokenResponse, VendorClient};
use crate::store::{AuthRecord, TokenStore};

/// Stages of the PIN-grant authorization lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthStage {
    /// No credentials; a PIN must be requested and approved.
    #[default]
    Unauthorized,
    /// A PIN-grant code is held and awaits exchange for tokens.
    RequestTokens,
    /// A valid token pair is held.
    Authorized,
    /// The access token is presumed stale; the pair must be refreshed.
    RefreshTokens,
}

/// Owns the authorization stage, the credential triple, and the persisted
/// configuration round trip.
///
/// The controller holds no I/O resources of its own: the vendor client
/// and the token store are passed per call by the orchestrator, which
/// keeps all mutation on its single control thread.
#[derive(Debug)]
pub struct AuthController {
    stage: AuthStage,
    code: Option<String>,
    access_token: Option<String>,
    refresh_token: Option<String>,
    store_path: String,
    pin_grace: Duration,
}

impl AuthController {
    /// Creates an unauthorized controller persisting to `store_path`.
    #[must_use]
    pub fn new(store_path: impl Into<String>, pin_grace: Duration) -> Self {
        Self {
            stage: AuthStage::Unauthorized,
            code: None,
            access_token: None,
            refresh_token: None,
            store_path: store_path.into(),
            pin_grace,
        }
    }

    /// Returns the current stage.
    #[must_use]
    pub fn stage(&self) -> AuthStage {
        self.stage
    }

    /// Forces the stage, used by the orchestrator to request a refresh or
    /// a full re-authorization on the next dispatcher run.
    pub fn set_stage(&mut self, stage: AuthStage) {
        self.stage = stage;
    }

    /// Drops all held credentials and returns to
    /// [`AuthStage::Unauthorized`], so the next
    /// [`update_authorization`](Self::update_authorization) call starts
    /// a fresh PIN grant.
    pub fn reset(&mut self) {
        self.code = None;
        self.access_token = None;
        self.refresh_token = None;
        self.stage = AuthStage::Unauthorized;
    }

    /// Returns the current access token, if any.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Returns the credential triple as a persistable record.
    #[must_use]
    pub fn record(&self) -> AuthRecord {
        AuthRecord {
            code: self.code.clone(),
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
        }
    }

    /// Seeds the controller from the persisted credential record.
    ///
    /// A stored PIN-grant code advances the stage to
    /// [`AuthStage::RequestTokens`]. Returns true when a full token pair
    /// was also restored, in which case the caller may optimistically
    /// treat the device as authorized until a live fetch proves
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn seed_from_store<S: TokenStore>(&mut self, store: &S) -> Result<bool> {
        self.stage = AuthStage::Unauthorized;
        let Some(record) = store.get(&self.store_path).await? else {
            tracing::warn!(path = %self.store_path, "No stored authorization record found");
            return Ok(false);
        };

        let has_pair = record.has_token_pair();
        let Some(code) = record.code else {
            return Ok(false);
        };
        self.code = Some(code);
        self.stage = AuthStage::RequestTokens;

        if has_pair {
            self.access_token = record.access_token;
            self.refresh_token = record.refresh_token;
            tracing::debug!("Restored stored token pair");
            return Ok(true);
        }
        Ok(false)
    }

    /// Re-enters the state machine from the current stage and runs every
    /// pending step in order until [`AuthStage::Authorized`] or a step
    /// fails; a completed run persists the credential record.
    ///
    /// # Errors
    ///
    /// Propagates step failures (which skip the persist) and persist
    /// failures.
    pub async fn update_authorization<S: TokenStore>(
        &mut self,
        client: &VendorClient,
        store: &S,
    ) -> Result<()> {
        if self.stage == AuthStage::Unauthorized {
            self.authorize_application(client).await?;
        }
        if self.stage == AuthStage::RequestTokens {
            self.request_tokens(client).await?;
        }
        if self.stage == AuthStage::RefreshTokens {
            self.refresh_tokens(client).await?;
        }
        self.persist(store).await
    }

    /// Requests a PIN-grant code and operator-facing PIN from the vendor.
    ///
    /// On success the PIN is surfaced through the log and the stage
    /// advances to [`AuthStage::RequestTokens`]; the flow then pauses for
    /// the configured grace interval so a human can approve the PIN
    /// before the first token request. A connectivity failure leaves the
    /// stage unchanged and returns `Ok` — the operator must retry
    /// configuration later.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingResponseField`] when the vendor's
    /// response omits the code or PIN; this cannot be recovered without
    /// a new authorization attempt.
    pub async fn authorize_application(&mut self, client: &VendorClient) -> Result<()> {
        let response = match client.authorize().await {
            Ok(response) => response,
            Err(Error::Protocol(e)) => {
                tracing::error!(error = %e, "PIN request failed");
                tracing::warn!(
                    "Could not reach the vendor to request a PIN; possible connectivity \
                     outage. Authorization stage unchanged, retry configuration later."
                );
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let code = response
            .code
            .ok_or(AuthError::MissingResponseField("code"))?;
        let pin = response
            .pin
            .ok_or(AuthError::MissingResponseField("ecobeePin"))?;
        self.code = Some(code);
        self.stage = AuthStage::RequestTokens;

        tracing::warn!("***********************************************************");
        tracing::warn!(
            %pin,
            "Authorize this application with the PIN above: open the vendor consumer \
             portal, choose My Apps, Add Application, enter the PIN and click Authorize."
        );
        tracing::warn!("***********************************************************");

        // Give the operator time to approve before the token exchange
        // starts hammering the endpoint.
        tokio::time::sleep(self.pin_grace).await;
        Ok(())
    }

    /// Exchanges the PIN-grant code for an access/refresh token pair.
    ///
    /// # Errors
    ///
    /// Fails hard when no code is held or the response omits either
    /// token; both require restarting the PIN flow.
    pub async fn request_tokens(&mut self, client: &VendorClient) -> Result<()> {
        tracing::debug!("Requesting new auth tokens");
        let code = self
            .code
            .as_deref()
            .ok_or(AuthError::MissingCredential("authorization code"))?;
        let response = client.request_tokens(code).await?;
        self.apply_token_response(response)?;
        self.stage = AuthStage::Authorized;
        tracing::info!("Authorization complete, token pair obtained");
        Ok(())
    }

    /// Exchanges the refresh token for a new token pair.
    ///
    /// # Errors
    ///
    /// Fails hard when no refresh token is held or the response omits
    /// either token.
    pub async fn refresh_tokens(&mut self, client: &VendorClient) -> Result<()> {
        tracing::info!("Refreshing auth tokens");
        let refresh_token = self
            .refresh_token
            .as_deref()
            .ok_or(AuthError::MissingCredential("refresh token"))?;
        let response = client.refresh_tokens(refresh_token).await?;
        self.apply_token_response(response)?;
        self.stage = AuthStage::Authorized;
        Ok(())
    }

    fn apply_token_response(&mut self, response: TokenResponse) -> Result<()> {
        let access_token = response
            .access_token
            .ok_or(AuthError::MissingResponseField("access_token"))?;
        let refresh_token = response
            .refresh_token
            .ok_or(AuthError::MissingResponseField("refresh_token"))?;
        self.access_token = Some(access_token);
        self.refresh_token = Some(refresh_token);
        Ok(())
    }

    async fn persist<S: TokenStore>(&self, store: &S) -> Result<()> {
        tracing::debug!(path = %self.store_path, "Persisting authorization record");
        store.set(&self.store_path, &self.record()).await
    }
}
