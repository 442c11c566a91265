// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Register for points in the thermostat's `runtime` object, written as
//! holds.

use serde_json::{Value, json};

use crate::error::{ReadError, WriteError};
use crate::snapshot::DeviceSnapshot;

use super::{WriteRequest, selection_body};

/// A point backed by the thermostat's runtime data.
///
/// Reads come from the snapshot's `runtime` object. Writes use the
/// vendor's `setHold` function and require a structured value: a JSON
/// object carrying a `holdType` tag plus the target field named after
/// this point.
#[derive(Debug, Clone)]
pub struct HoldRegister {
    thermostat_id: u32,
    point_name: String,
    read_only: bool,
    readable: bool,
    units: Option<String>,
    description: String,
}

impl HoldRegister {
    /// Key every hold write value must carry.
    pub const HOLD_TYPE_KEY: &'static str = "holdType";

    /// Creates a hold register for the given thermostat and point.
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

    /// Extracts the runtime value from the snapshot.
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
            .get("runtime")
            .and_then(|runtime| runtime.get(&self.point_name))
            .cloned()
            .ok_or_else(|| ReadError::NotFound(self.point_name.clone()))
    }

    /// Validates the hold value and builds the `setHold` function body.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::ReadOnly`] when the register disallows
    /// writes, [`WriteError::ExpectedObject`] when `value` is not a JSON
    /// object, and [`WriteError::MissingKey`] when the `holdType` tag or
    /// the target field named after this point is absent.
    pub fn write_request(&self, value: &Value) -> Result<WriteRequest, WriteError> {
        if self.read_only {
            return Err(WriteError::ReadOnly(self.point_name.clone()));
        }
        let Some(params) = value.as_object() else {
            return Err(WriteError::ExpectedObject(self.point_name.clone()));
        };
        for key in [Self::HOLD_TYPE_KEY, self.point_name.as_str()] {
            if !params.contains_key(key) {
                return Err(WriteError::MissingKey {
                    point: self.point_name.clone(),
                    key: key.to_string(),
                });
            }
        }

        let body = selection_body(
            "thermostats",
            json!(self.thermostat_id),
            json!({
                "functions": [
                    {
                        "type": "setHold",
                        "params": value,
                    }
                ]
            }),
        );
        Ok(WriteRequest { body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> DeviceSnapshot {
        DeviceSnapshot::new(json!({
            "thermostatList": [
                {"identifier": "111", "runtime": {"desiredHeat": 700}}
            ]
        }))
    }

    fn register() -> HoldRegister {
        HoldRegister::new(111, false, true, "desiredHeat", Some("degF".to_string()), "")
    }

    #[test]
    fn reads_value_from_runtime() {
        let value = register().get_state(Some(&snapshot())).unwrap();
        assert_eq!(value, json!(700));
    }

    #[test]
    fn missing_runtime_field_is_not_found() {
        let register = HoldRegister::new(111, false, true, "desiredCool", None, "");
        assert_eq!(
            register.get_state(Some(&snapshot())),
            Err(ReadError::NotFound("desiredCool".to_string()))
        );
    }

    #[test]
    fn write_requires_object_value() {
        assert_eq!(
            register().write_request(&json!(700)),
            Err(WriteError::ExpectedObject("desiredHeat".to_string()))
        );
    }

    #[test]
    fn write_requires_hold_type_tag() {
        assert_eq!(
            register().write_request(&json!({"desiredHeat": 720})),
            Err(WriteError::MissingKey {
                point: "desiredHeat".to_string(),
                key: "holdType".to_string(),
            })
        );
    }

    #[test]
    fn write_requires_target_field() {
        assert_eq!(
            register().write_request(&json!({"holdType": "nextTransition"})),
            Err(WriteError::MissingKey {
                point: "desiredHeat".to_string(),
                key: "desiredHeat".to_string(),
            })
        );
    }

    #[test]
    fn valid_write_builds_set_hold_function() {
        let value = json!({"holdType": "nextTransition", "desiredHeat": 720});
        let request = register().write_request(&value).unwrap();

        assert_eq!(request.body["functions"][0]["type"], "setHold");
        assert_eq!(request.body["functions"][0]["params"], value);
        assert_eq!(request.body["selection"]["selectionMatch"], 111);
    }
}
