// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Register for points in the thermostat's `settings` object.

use serde_json::{Value, json};

use crate::error::{ReadError, WriteError};
use crate::snapshot::DeviceSnapshot;

use super::{WriteRequest, selection_body};

/// A point backed by one field of the thermostat's settings.
///
/// Reads come from the cached snapshot; writes post the new value under
/// the point's name in a `thermostat.settings` body.
#[derive(Debug, Clone)]
pub struct SettingRegister {
    thermostat_id: u32,
    point_name: String,
    read_only: bool,
    readable: bool,
    units: Option<String>,
    description: String,
}

impl SettingRegister {
    /// Creates a setting register for the given thermostat and point.
    #[must_use]
    pub fn new(
        thermostat_id: u32,
        read_only: bool,
        readable: bool,
        point_name: impl Into<String>,
        units: Option<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            thermostat_id,
            point_name: point_name.into(),
            read_only,
            readable,
            units,
            description: description.into(),
        }
    }

    /// Returns the point name.
    #[must_use]
    pub fn point_name(&self) -> &str {
        &self.point_name
    }

    /// Returns true when writes are disallowed.
    #[must_use]
    pub fn read_only(&self) -> bool {
        self.read_only
    }

    /// Returns true when reads are allowed.
    #[must_use]
    pub fn readable(&self) -> bool {
        self.readable
    }

    /// Returns the configured engineering units, if any.
    #[must_use]
    pub fn units(&self) -> Option<&str> {
        self.units.as_deref()
    }

    /// Returns the configured description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Extracts the setting value from the snapshot.
    ///
    /// # Errors
    ///
    /// See [`PointRegister::get_state`](super::PointRegister::get_state).
    pub fn get_state(&self, snapshot: Option<&DeviceSnapshot>) -> Result<Value, ReadError> {
        if !self.readable {
            return Err(ReadError::NotReadable(self.point_name.clone()));
        }
        let snapshot = snapshot.ok_or(ReadError::NoData)?;
        let thermostat = snapshot
            .thermostat(self.thermostat_id)
            .ok_or_else(|| ReadError::NotFound(self.point_name.clone()))?;
        thermostat
            .get("settings")
            .and_then(|settings| settings.get(&self.point_name))
            .cloned()
            .ok_or_else(|| ReadError::NotFound(self.point_name.clone()))
    }

    /// Builds the settings write body for `value`.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::ReadOnly`] when the register disallows
    /// writes. The value itself is arbitrary; the vendor validates it.
    pub fn write_request(&self, value: &Value) -> Result<WriteRequest, WriteError> {
        if self.read_only {
            return Err(WriteError::ReadOnly(self.point_name.clone()));
        }
        let body = selection_body(
            "thermostats",
            json!(self.thermostat_id),
            json!({
                "thermostat": {
                    "settings": {
                        self.point_name.as_str(): value,
                    }
                }
            }),
        );
        Ok(WriteRequest { body })
    }
}
