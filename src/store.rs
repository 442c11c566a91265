// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Persistence boundary for authorization credentials.
//!
//! The credential triple is the only durable state in the bridge. It is
//! stored as a flat record keyed by a path derived from the device's
//! group identifier, matching the platform config-store layout.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::Result;

/// The persisted credential triple.
///
/// Field names match the record the platform config store holds for each
/// credential group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRecord {
    /// PIN-grant authorization code.
    #[serde(rename = "AUTH_CODE", default)]
    pub code: Option<String>,

    /// Bearer access token.
    #[serde(rename = "ACCESS_TOKEN", default)]
    pub access_token: Option<String>,

    /// Refresh token.
    #[serde(rename = "REFRESH_TOKEN", default)]
    pub refresh_token: Option<String>,
}

impl AuthRecord {
    /// Returns true when both halves of the token pair are present.
    #[must_use]
    pub fn has_token_pair(&self) -> bool {
        self.access_token.is_some() && self.refresh_token.is_some()
    }
}

/// External key-value store for credential records.
///
/// A missing record is `Some`-less, not an error; errors are reserved for
/// the store itself failing. Implementations are expected to bound their
/// own call time.
#[allow(async_fn_in_trait)]
pub trait TokenStore {
    /// Fetches the record stored at `path`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    async fn get(&self, path: &str) -> Result<Option<AuthRecord>>;

    /// Stores `record` at `path`, replacing any previous record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be persisted.
    async fn set(&self, path: &str, record: &AuthRecord) -> Result<()>;
}

impl<T: TokenStore> TokenStore for std::sync::Arc<T> {
    async fn get(&self, path: &str) -> Result<Option<AuthRecord>> {
        T::get(self, path).await
    }

    async fn set(&self, path: &str, record: &AuthRecord) -> Result<()> {
        T::set(self, path, record).await
    }
}

/// In-memory [`TokenStore`] for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    records: RwLock<HashMap<String, AuthRecord>>,
}

impl MemoryTokenStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with one record.
    #[must_use]
    pub fn seeded(path: impl Into<String>, record: AuthRecord) -> Self {
        let store = Self::new();
        store
            .records
            .try_write()
            .map(|mut records| records.insert(path.into(), record))
            .ok();
        store
    }
}

impl TokenStore for MemoryTokenStore {
    async fn get(&self, path: &str) -> Result<Option<AuthRecord>> {
        Ok(self.records.read().await.get(path).cloned())
    }

    async fn set(&self, path: &str, record: &AuthRecord) -> Result<()> {
        self.records
            .write()
            .await
            .insert(path.to_string(), record.clone());
        Ok(())
    }
}
