// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Point registers: the typed points exposed for one thermostat.
//!
//! Five register variants wrap the vendor's incompatible wire shapes
//! behind one read/write contract: [`SettingRegister`] and
//! [`HoldRegister`] are 1:1 with registry entries, while
//! [`StatusRegister`], [`VacationRegister`] and [`ProgramRegister`] are
//! per-device singletons. All marshaling logic lives in the variant;
//! the orchestrator dispatches only through [`PointRegister`] and never
//! inspects wire shapes (its single concession is Status, whose reads
//! come from a live query instead of the snapshot).

mod hold;
mod program;
mod setting;
mod status;
mod vacation;

pub use hold::HoldRegister;
pub use program::ProgramRegister;
pub use setting::SettingRegister;
pub use status::StatusRegister;
pub use vacation::VacationRegister;

use serde_json::{Value, json};

use crate::error::{ReadError, WriteError};
use crate::snapshot::DeviceSnapshot;

/// Options accompanying a point write.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Force a snapshot refresh after a successful write before reading
    /// back the point value.
    pub refresh: bool,
    /// For the Vacations register: delete the named vacation instead of
    /// creating one.
    pub delete: bool,
    /// For the Programs register: when resuming (no program given),
    /// resume the whole stored program stack instead of the next event.
    pub resume_all: bool,
}

/// A validated outbound write, ready to post to the thermostat endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRequest {
    /// The selection-scoped request body.
    pub body: Value,
}

/// A named, typed point of one thermostat.
///
/// The closed set of variants shares a two-method contract: extract the
/// point value from a device snapshot, and build a vendor write request
/// for a new value. Identity, readability and writability are fixed at
/// construction.
#[derive(Debug, Clone)]
pub enum PointRegister {
    /// Point in the snapshot's `settings` object.
    Setting(SettingRegister),
    /// Point in the snapshot's `runtime` object, written as a hold.
    Hold(HoldRegister),
    /// Live equipment-running status (singleton, read-only).
    Status(StatusRegister),
    /// Vacation events (singleton).
    Vacation(VacationRegister),
    /// Non-vacation program events (singleton).
    Program(ProgramRegister),
}

impl PointRegister {
    /// Returns the point name this register answers to.
    #[must_use]
    pub fn point_name(&self) -> &str {
        match self {
            Self::Setting(r) => r.point_name(),
            Self::Hold(r) => r.point_name(),
            Self::Status(_) => StatusRegister::POINT_NAME,
            Self::Vacation(_) => VacationRegister::POINT_NAME,
            Self::Program(_) => ProgramRegister::POINT_NAME,
        }
    }

    /// Returns true when writes to this register are disallowed.
    #[must_use]
    pub fn read_only(&self) -> bool {
        match self {
            Self::Setting(r) => r.read_only(),
            Self::Hold(r) => r.read_only(),
            Self::Status(_) => true,
            Self::Vacation(_) | Self::Program(_) => false,
        }
    }

    /// Returns true when this register can be read.
    #[must_use]
    pub fn readable(&self) -> bool {
        match self {
            Self::Setting(r) => r.readable(),
            Self::Hold(r) => r.readable(),
            Self::Status(_) | Self::Vacation(_) | Self::Program(_) => true,
        }
    }

    /// Extracts this register's value from the device snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::NotReadable`] for write-only registers,
    /// [`ReadError::NoData`] when no snapshot has been fetched,
    /// [`ReadError::NotFound`] when the thermostat or point is absent
    /// from the snapshot, and [`ReadError::LiveOnly`] for the Status
    /// register, which is never served from the snapshot.
    pub fn get_state(&self, snapshot: Option<&DeviceSnapshot>) -> Result<Value, ReadError> {
        match self {
            Self::Setting(r) => r.get_state(snapshot),
            Self::Hold(r) => r.get_state(snapshot),
            Self::Status(_) => Err(ReadError::LiveOnly(StatusRegister::POINT_NAME.to_string())),
            Self::Vacation(r) => r.get_state(snapshot),
            Self::Program(r) => r.get_state(snapshot),
        }
    }

    /// Validates `value` and builds the vendor write request for it.
    ///
    /// Validation happens entirely before any network effect; a
    /// structurally valid call maps to exactly one outbound request.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::ReadOnly`] when the register disallows
    /// writes, or a validation error describing the malformed input.
    pub fn write_request(
        &self,
        value: &Value,
        options: WriteOptions,
    ) -> Result<WriteRequest, WriteError> {
        match self {
            Self::Setting(r) => r.write_request(value),
            Self::Hold(r) => r.write_request(value),
            Self::Status(_) => Err(WriteError::ReadOnly(StatusRegister::POINT_NAME.to_string())),
            Self::Vacation(r) => r.write_request(value, options.delete),
            Self::Program(r) => r.write_request(value, options.resume_all),
        }
    }
}

/// Builds a selection-scoped request body: the vendor's `selection`
/// envelope merged with the variant-specific payload.
pub(crate) fn selection_body(
    selection_type: &str,
    selection_match: Value,
    payload: Value,
) -> Value {
    let mut body = serde_json::Map::new();
    body.insert(
        "selection".to_string(),
        json!({
            "selectionType": selection_type,
            "selectionMatch": selection_match,
        }),
    );
    if let Value::Object(map) = payload {
        body.extend(map);
    }
    Value::Object(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_body_merges_payload() {
        let body = selection_body(
            "thermostats",
            json!(8_675_309),
            json!({"thermostat": {"settings": {"hvacMode": "off"}}}),
        );

        assert_eq!(body["selection"]["selectionType"], "thermostats");
        assert_eq!(body["selection"]["selectionMatch"], 8_675_309);
        assert_eq!(body["thermostat"]["settings"]["hvacMode"], "off");
    }

    #[test]
    fn status_register_reads_are_live_only() {
        let register = PointRegister::Status(StatusRegister::new(1));
        assert!(matches!(
            register.get_state(None),
            Err(ReadError::LiveOnly(_))
        ));
    }

    #[test]
    fn status_register_rejects_writes() {
        let register = PointRegister::Status(StatusRegister::new(1));
        let err = register
            .write_request(&json!("anything"), WriteOptions::default())
            .unwrap_err();
        assert_eq!(err, WriteError::ReadOnly("Status".to_string()));
    }

    #[test]
    fn singleton_point_names() {
        assert_eq!(
            PointRegister::Status(StatusRegister::new(1)).point_name(),
            "Status"
        );
        assert_eq!(
            PointRegister::Vacation(VacationRegister::new(1)).point_name(),
            "Vacations"
        );
        assert_eq!(
            PointRegister::Program(ProgramRegister::new(1)).point_name(),
            "Programs"
        );
    }
}
