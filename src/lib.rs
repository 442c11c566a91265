// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ecobridge - A Rust bridge for Ecobee cloud thermostats.
//!
//! This library exposes a cloud-hosted Ecobee thermostat's settings,
//! holds, schedules and live status as uniform named points behind one
//! async read/write interface.
//!
//! # Supported Features
//!
//! - **Point access**: Read and write named setting and hold points
//! - **Schedule control**: Create and delete vacations, install and
//!   resume programs
//! - **Live status**: Equipment-running status via the summary endpoint
//! - **Authorization**: OAuth2 PIN-grant flow with persistent tokens,
//!   automatic refresh, and re-authentication recovery
//! - **Snapshot caching**: Bulk device data fetched through a pluggable
//!   cache boundary with periodic refresh
//!
//! # Quick Start
//!
//! ```no_run
//! use ecobridge::{
//!     DeviceConfig, DeviceInterface, DirectCache, MemoryTokenStore, RegistryEntry,
//!     parse_thermostat_id,
//! };
//!
//! #[tokio::main]
//! async fn main() -> ecobridge::Result<()> {
//!     // Host platforms often deliver the identifier as a JSON string.
//!     let id = parse_thermostat_id(&serde_json::json!("8675309"))?;
//!     let config = DeviceConfig::new("my-api-key", id);
//!     let cache = DirectCache::new(config.http_timeout())?;
//!
//!     let registry: Vec<RegistryEntry> = serde_json::from_str(
//!         r#"[
//!             {"Point Name": "hvacMode", "Type": "setting",
//!              "Readable": "true", "Writable": "true"},
//!             {"Point Name": "desiredHeat", "Type": "hold",
//!              "Readable": "true", "Writable": "true", "Units": "degF"}
//!         ]"#,
//!     )
//!     .unwrap();
//!
//!     // On first run this surfaces a PIN in the log for the operator to
//!     // approve on the Ecobee portal; later runs reuse stored tokens.
//!     let mut device =
//!         DeviceInterface::configure(config, &registry, cache, MemoryTokenStore::new()).await?;
//!
//!     let mode = device.get_point("hvacMode").await?;
//!     println!("hvacMode = {mode}");
//!
//!     device
//!         .set_point("hvacMode", &serde_json::json!("heat"), Default::default())
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! # Writing Holds, Vacations and Programs
//!
//! ```no_run
//! use ecobridge::{DeviceInterface, DirectCache, MemoryTokenStore, WriteOptions};
//! use serde_json::json;
//!
//! # async fn example(
//! #     device: &mut DeviceInterface<DirectCache, MemoryTokenStore>,
//! # ) -> ecobridge::Result<()> {
//! // Hold values are objects carrying the hold type and the point value.
//! device
//!     .set_point(
//!         "desiredHeat",
//!         &json!({"holdType": "nextTransition", "desiredHeat": 700}),
//!         WriteOptions::default(),
//!     )
//!     .await?;
//!
//! // Deleting a vacation by name.
//! let options = WriteOptions { delete: true, ..WriteOptions::default() };
//! device.set_point("Vacations", &json!("Trip"), options).await?;
//!
//! // Resuming the scheduled program.
//! device
//!     .set_point("Programs", &serde_json::Value::Null, WriteOptions::default())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod cache;
mod config;
pub mod error;
mod interface;
pub mod protocol;
mod registers;
mod registry;
mod snapshot;
mod store;

pub use auth::{AuthController, AuthStage};
pub use cache::{CacheRequest, CachedData, DirectCache, SnapshotCache};
pub use config::{ApiEndpoints, DeviceConfig, parse_thermostat_id};
pub use error::{
    AuthError, ConfigError, Error, ProtocolError, ReadError, Result, WriteError,
};
pub use interface::DeviceInterface;
pub use protocol::{PinResponse, SummaryResponse, TokenResponse, VendorClient};
pub use registers::{
    HoldRegister, PointRegister, ProgramRegister, SettingRegister, StatusRegister,
    VacationRegister, WriteOptions, WriteRequest,
};
pub use registry::{RegisterKind, RegistryEntry};
pub use snapshot::DeviceSnapshot;
pub use store::{AuthRecord, MemoryTokenStore, TokenStore};
