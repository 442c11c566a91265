// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The device interface: the single entry point tying authorization,
//! registers, the snapshot cache and the write path together.
//!
//! The interface owns all mutable state and is driven from one control
//! context; concurrent callers wrap it in a lock. Reads are served from
//! the in-memory snapshot (live for the status point), writes go straight
//! to the vendor with a single re-authentication replay on credential
//! failure.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;

use crate::auth::{AuthController, AuthStage};
use crate::cache::{CacheRequest, SnapshotCache};
use crate::config::DeviceConfig;
use crate::error::{ConfigError, Error, Result, WriteError};
use crate::protocol::VendorClient;
use crate::registers::{
    HoldRegister, PointRegister, ProgramRegister, SettingRegister, StatusRegister,
    VacationRegister, WriteOptions,
};
use crate::registry::{RegisterKind, RegistryEntry};
use crate::snapshot::DeviceSnapshot;
use crate::store::TokenStore;

/// Selection body for the bulk thermostat data query.
const THERMOSTAT_SELECTION: &str = r#"{"selection":{"selectionType":"registered","selectionMatch":"","includeSensors":true,"includeRuntime":true,"includeEvents":true,"includeEquipmentStatus":true,"includeSettings":true}}"#;

/// A bridged thermostat exposing its points behind one read/write
/// contract.
///
/// Built with [`DeviceInterface::configure`] from a device configuration
/// and a registry of point definitions. The three singleton points
/// (`Status`, `Vacations`, `Programs`) are always present in addition to
/// the configured setting and hold points.
///
/// # Examples
///
/// ```no_run
/// use ecobridge::{
///     DeviceConfig, DeviceInterface, DirectCache, MemoryTokenStore, RegistryEntry,
/// };
///
/// # async fn example() -> ecobridge::Result<()> {
/// let config = DeviceConfig::new("my-api-key", 8675309);
/// let cache = DirectCache::new(config.http_timeout())?;
/// let registry: Vec<RegistryEntry> = serde_json::from_str(
///     r#"[{"Point Name": "hvacMode", "Type": "setting", "Readable": "true"}]"#,
/// )
/// .unwrap();
///
/// let device =
///     DeviceInterface::configure(config, &registry, cache, MemoryTokenStore::new()).await?;
/// let mode = device.get_point("hvacMode").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DeviceInterface<C, S> {
    config: DeviceConfig,
    client: VendorClient,
    auth: AuthController,
    cache: C,
    store: S,
    registers: Vec<PointRegister>,
    defaults: HashMap<String, Value>,
    snapshot: Option<DeviceSnapshot>,
}

impl<C: SnapshotCache, S: TokenStore> DeviceInterface<C, S> {
    /// Builds the interface, establishes authorization and fetches the
    /// first snapshot.
    ///
    /// Stored credentials are restored first: a persisted token pair is
    /// tried as-is, and when it cannot produce a snapshot even after
    /// token refresh and re-exchange, the credentials are dropped and a
    /// fresh PIN grant is started. A persisted authorization code
    /// short-circuits the PIN flow. When the PIN
    /// request itself cannot reach the vendor, the interface comes up
    /// unauthorized without an initial snapshot, and configuration must
    /// be retried later.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an invalid registry, an auth error
    /// when a token exchange fails, or a protocol error when the initial
    /// snapshot cannot be fetched.
    pub async fn configure(
        config: DeviceConfig,
        registry: &[RegistryEntry],
        cache: C,
        store: S,
    ) -> Result<Self> {
        let client = VendorClient::new(
            config.endpoints().clone(),
            config.api_key(),
            config.http_timeout(),
        )?;
        let (registers, defaults) = build_registers(&config, registry)?;
        let auth = AuthController::new(config.auth_store_path(), config.pin_grace());

        let mut interface = Self {
            config,
            client,
            auth,
            cache,
            store,
            registers,
            defaults,
            snapshot: None,
        };

        if interface.auth.seed_from_store(&interface.store).await? {
            // Try the stored pair as-is; a stale token surfaces on the
            // first fetch and escalates from there.
            interface.auth.set_stage(AuthStage::Authorized);
            match interface.refresh_data(false).await {
                Ok(()) => return Ok(interface),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Stored credentials could not fetch device data, restarting the PIN grant"
                    );
                    interface.auth.reset();
                }
            }
        }
        interface
            .auth
            .update_authorization(&interface.client, &interface.store)
            .await?;

        if interface.auth.access_token().is_some() {
            interface.refresh_data(false).await?;
        } else {
            tracing::warn!("Device configured without authorization, no data fetched");
        }
        Ok(interface)
    }

    /// Returns the device configuration.
    #[must_use]
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Returns the current authorization stage.
    #[must_use]
    pub fn auth_stage(&self) -> AuthStage {
        self.auth.stage()
    }

    /// Returns the names of all exposed points, in registry order with
    /// the singletons last.
    #[must_use]
    pub fn point_names(&self) -> Vec<&str> {
        self.registers.iter().map(PointRegister::point_name).collect()
    }

    /// Returns the configured default value for a point, if any.
    #[must_use]
    pub fn point_default(&self, point_name: &str) -> Option<&Value> {
        self.defaults.get(point_name)
    }

    /// Returns the current snapshot, if one has been fetched.
    #[must_use]
    pub fn snapshot(&self) -> Option<&DeviceSnapshot> {
        self.snapshot.as_ref()
    }

    /// Reads one point.
    ///
    /// Setting, hold, vacation and program points are served from the
    /// in-memory snapshot; the status point always performs a live
    /// summary query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PointNotFound`] for an unknown name, a
    /// [`ReadError`](crate::ReadError) for unreadable or absent points,
    /// and a protocol error when the live status query fails.
    pub async fn get_point(&self, point_name: &str) -> Result<Value> {
        match self.register(point_name)? {
            PointRegister::Status(register) => self.live_status(register).await,
            register => Ok(register.get_state(self.snapshot.as_ref())?),
        }
    }

    /// Reads every readable point, best-effort.
    ///
    /// Points that fail to read are logged and omitted; the result is an
    /// object keyed by point name regardless of how many reads succeed.
    /// When no snapshot is held a refetch is attempted first, but a
    /// failing refetch only costs the snapshot-backed points; live
    /// points are still served.
    ///
    /// # Errors
    ///
    /// Building the result is best-effort and currently cannot fail; the
    /// fallible signature matches the rest of the point API.
    pub async fn scrape_all(&mut self) -> Result<Value> {
        if self.snapshot.is_none() {
            if let Err(e) = self.refresh_data(false).await {
                tracing::warn!(error = %e, "Could not fetch device data, scraping live points only");
            }
        }

        let mut result = serde_json::Map::new();
        for register in &self.registers {
            if !register.readable() {
                continue;
            }
            let value = match register {
                PointRegister::Status(status) => self.live_status(status).await,
                register => register.get_state(self.snapshot.as_ref()).map_err(Error::from),
            };
            match value {
                Ok(value) => {
                    result.insert(register.point_name().to_string(), value);
                }
                Err(e) => {
                    tracing::warn!(point = register.point_name(), error = %e, "Skipping point in scrape");
                }
            }
        }
        Ok(Value::Object(result))
    }

    /// Writes one point.
    ///
    /// The value is validated and marshaled before any network effect.
    /// If the vendor rejects the request for credential reasons, the
    /// token pair is refreshed and the identical request is replayed
    /// exactly once. On success the point's current value is read back
    /// (after a forced snapshot refresh when `options.refresh` is set);
    /// writes to unreadable points return `Null`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PointNotFound`] for an unknown name,
    /// [`WriteError::ReadOnly`] before any request is sent, a validation
    /// [`WriteError`] for a malformed value, and a protocol error when
    /// the write (or its single replay) fails.
    pub async fn set_point(
        &mut self,
        point_name: &str,
        value: &Value,
        options: WriteOptions,
    ) -> Result<Value> {
        let register = self.register(point_name)?.clone();
        if register.read_only() {
            return Err(WriteError::ReadOnly(point_name.to_string()).into());
        }
        let request = register.write_request(value, options)?;

        let token = self.require_access_token()?.to_string();
        match self.client.post_thermostat(&token, &request.body).await {
            Ok(()) => {}
            Err(e) if e.is_credential_failure() => {
                tracing::info!(point = point_name, error = %e, "Write rejected, refreshing tokens and replaying");
                self.auth.set_stage(AuthStage::RefreshTokens);
                self.auth
                    .update_authorization(&self.client, &self.store)
                    .await?;
                let token = self.require_access_token()?.to_string();
                self.client.post_thermostat(&token, &request.body).await?;
            }
            Err(e) => return Err(e),
        }

        if options.refresh {
            self.refresh_data(true).await?;
        }
        if register.readable() {
            self.get_point(point_name).await
        } else {
            Ok(Value::Null)
        }
    }

    /// Replaces the snapshot with fresh device data, escalating through
    /// re-authentication as needed.
    ///
    /// Three tiers: a plain fetch; on failure a token refresh and retry;
    /// on failure again a token request from the held authorization code
    /// and a final retry, whose failure propagates. Any success marks the
    /// device authorized. The previous snapshot is dropped up front, so a
    /// failed refresh leaves no stale data behind.
    ///
    /// # Errors
    ///
    /// Returns the final tier's error when all three attempts fail.
    pub async fn refresh_data(&mut self, force: bool) -> Result<()> {
        match self.fetch_snapshot(force).await {
            Ok(()) => {
                self.auth.set_stage(AuthStage::Authorized);
                return Ok(());
            }
            Err(e) => {
                tracing::warn!(error = %e, "Device data fetch failed, refreshing tokens");
            }
        }

        self.auth.set_stage(AuthStage::RefreshTokens);
        match self.reauthorize_and_fetch(force).await {
            Ok(()) => {
                self.auth.set_stage(AuthStage::Authorized);
                return Ok(());
            }
            Err(e) => {
                tracing::warn!(error = %e, "Fetch after token refresh failed, requesting new tokens");
            }
        }

        self.auth.set_stage(AuthStage::RequestTokens);
        self.reauthorize_and_fetch(force).await?;
        self.auth.set_stage(AuthStage::Authorized);
        Ok(())
    }

    /// Runs the periodic snapshot refresh until the interface is dropped.
    ///
    /// Ticks at the configured refresh interval with delayed catch-up, so
    /// a slow refresh never causes overlapping or bursty fetches. The
    /// first refresh happens one full interval after the call, as
    /// [`DeviceInterface::configure`] has already fetched an initial
    /// snapshot. Refresh failures are logged and the loop keeps going.
    ///
    /// Spawn it on the runtime alongside the callers sharing the lock:
    ///
    /// ```no_run
    /// # use std::sync::Arc;
    /// # use tokio::sync::Mutex;
    /// # use ecobridge::{DeviceInterface, DirectCache, MemoryTokenStore};
    /// # fn example(device: DeviceInterface<DirectCache, MemoryTokenStore>) {
    /// let device = Arc::new(Mutex::new(device));
    /// tokio::spawn(DeviceInterface::run_refresh_loop(device.clone()));
    /// # }
    /// ```
    pub async fn run_refresh_loop(interface: Arc<Mutex<Self>>) {
        let period = interface.lock().await.config.refresh_interval();
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await;

        loop {
            interval.tick().await;
            let mut interface = interface.lock().await;
            if let Err(e) = interface.refresh_data(true).await {
                tracing::error!(error = %e, "Periodic device data refresh failed");
            }
        }
    }

    fn register(&self, point_name: &str) -> Result<&PointRegister> {
        self.registers
            .iter()
            .find(|register| register.point_name() == point_name)
            .ok_or_else(|| Error::PointNotFound(point_name.to_string()))
    }

    fn require_access_token(&self) -> Result<&str> {
        self.auth.access_token().ok_or(Error::NotAuthorized)
    }

    async fn live_status(&self, register: &StatusRegister) -> Result<Value> {
        let token = self.require_access_token()?;
        let summary = self.client.thermostat_summary(token).await?;
        Ok(register.parse_summary(&summary)?)
    }

    async fn reauthorize_and_fetch(&mut self, force: bool) -> Result<()> {
        self.auth
            .update_authorization(&self.client, &self.store)
            .await?;
        self.fetch_snapshot(force).await
    }

    async fn fetch_snapshot(&mut self, force: bool) -> Result<()> {
        self.snapshot = None;
        let token = self.require_access_token()?;

        let request = CacheRequest {
            url: self.config.endpoints().thermostat_url().to_string(),
            headers: vec![
                ("Authorization".to_string(), format!("Bearer {token}")),
                (
                    "Content-Type".to_string(),
                    "application/json;charset=UTF-8".to_string(),
                ),
            ],
            params: vec![("json".to_string(), THERMOSTAT_SELECTION.to_string())],
            refresh_interval: self.config.refresh_interval(),
            force_refresh: force,
        };

        let data = self
            .cache
            .fetch(&request)
            .await?
            .ok_or(Error::DataUnavailable)?;
        tracing::debug!(fetched_at = %data.fetched_at, "Snapshot replaced");
        self.snapshot = Some(DeviceSnapshot::new(data.payload));
        Ok(())
    }
}

/// Builds the register list from the registry, appending the three
/// singletons, plus the map of configured default values.
///
/// Point names must be unique across the whole interface, including the
/// singleton names.
fn build_registers(
    config: &DeviceConfig,
    registry: &[RegistryEntry],
) -> std::result::Result<(Vec<PointRegister>, HashMap<String, Value>), ConfigError> {
    let thermostat_id = config.thermostat_id();
    let mut registers = Vec::with_capacity(registry.len() + 3);
    let mut defaults = HashMap::new();
    let mut seen: std::collections::HashSet<&str> = [
        StatusRegister::POINT_NAME,
        VacationRegister::POINT_NAME,
        ProgramRegister::POINT_NAME,
    ]
    .into();

    for (index, entry) in registry.iter().enumerate() {
        let name = entry
            .effective_name()
            .ok_or(ConfigError::MissingPointName(index))?;
        if !seen.insert(name) {
            return Err(ConfigError::DuplicatePointName(name.to_string()));
        }

        let register = match entry.register_kind(index)? {
            RegisterKind::Setting => PointRegister::Setting(SettingRegister::new(
                thermostat_id,
                entry.read_only(),
                entry.readable(),
                name,
                entry.units.clone(),
                entry.notes.clone(),
            )),
            RegisterKind::Hold => PointRegister::Hold(HoldRegister::new(
                thermostat_id,
                entry.read_only(),
                entry.readable(),
                name,
                entry.units.clone(),
                entry.notes.clone(),
            )),
        };
        registers.push(register);

        if let Some(default) = entry.default_value() {
            // Defaults arrive as strings; take them as JSON when they
            // parse, else as the literal string.
            let value = serde_json::from_str(default)
                .unwrap_or_else(|_| Value::String(default.to_string()));
            defaults.insert(name.to_string(), value);
        }
    }

    registers.push(PointRegister::Status(StatusRegister::new(thermostat_id)));
    registers.push(PointRegister::Vacation(VacationRegister::new(thermostat_id)));
    registers.push(PointRegister::Program(ProgramRegister::new(thermostat_id)));
    Ok((registers, defaults))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(point_name: &str, kind: &str) -> RegistryEntry {
        RegistryEntry {
            point_name: point_name.to_string(),
            kind: kind.to_string(),
            readable: "true".to_string(),
            ..RegistryEntry::default()
        }
    }

    #[test]
    fn registers_follow_registry_order_with_singletons_last() {
        let config = DeviceConfig::new("key", 1);
        let registry = vec![entry("hvacMode", "setting"), entry("desiredHeat", "hold")];

        let (registers, _) = build_registers(&config, &registry).unwrap();
        let names: Vec<&str> = registers.iter().map(PointRegister::point_name).collect();
        assert_eq!(
            names,
            vec!["hvacMode", "desiredHeat", "Status", "Vacations", "Programs"]
        );
    }

    #[test]
    fn empty_registry_still_exposes_singletons() {
        let config = DeviceConfig::new("key", 1);
        let (registers, defaults) = build_registers(&config, &[]).unwrap();
        assert_eq!(registers.len(), 3);
        assert!(defaults.is_empty());
    }

    #[test]
    fn duplicate_point_name_is_rejected() {
        let config = DeviceConfig::new("key", 1);
        let registry = vec![entry("hvacMode", "setting"), entry("hvacMode", "hold")];

        let err = build_registers(&config, &registry).unwrap_err();
        assert_eq!(err, ConfigError::DuplicatePointName("hvacMode".to_string()));
    }

    #[test]
    fn singleton_name_collision_is_rejected() {
        let config = DeviceConfig::new("key", 1);
        let registry = vec![entry("Status", "setting")];

        let err = build_registers(&config, &registry).unwrap_err();
        assert_eq!(err, ConfigError::DuplicatePointName("Status".to_string()));
    }

    #[test]
    fn nameless_entry_is_rejected_by_index() {
        let config = DeviceConfig::new("key", 1);
        let registry = vec![entry("hvacMode", "setting"), RegistryEntry::default()];

        let err = build_registers(&config, &registry).unwrap_err();
        assert_eq!(err, ConfigError::MissingPointName(1));
    }

    #[test]
    fn alias_overrides_point_name() {
        let config = DeviceConfig::new("key", 1);
        let mut aliased = entry("desiredHeat", "hold");
        aliased.volttron_point_name = "heat_setpoint".to_string();

        let (registers, _) = build_registers(&config, &[aliased]).unwrap();
        assert_eq!(registers[0].point_name(), "heat_setpoint");
    }

    #[test]
    fn defaults_parse_as_json_with_string_fallback() {
        let config = DeviceConfig::new("key", 1);
        let mut with_number = entry("desiredHeat", "hold");
        with_number.default_value = "700".to_string();
        let mut with_text = entry("hvacMode", "setting");
        with_text.default_value = "auto".to_string();

        let (_, defaults) = build_registers(&config, &[with_number, with_text]).unwrap();
        assert_eq!(defaults["desiredHeat"], Value::from(700));
        assert_eq!(defaults["hvacMode"], Value::from("auto"));
    }

    #[test]
    fn unsupported_register_type_is_rejected() {
        let config = DeviceConfig::new("key", 1);
        let registry = vec![entry("dial", "dial")];

        assert!(matches!(
            build_registers(&config, &registry).unwrap_err(),
            ConfigError::UnsupportedRegisterType { index: 0, .. }
        ));
    }
}
