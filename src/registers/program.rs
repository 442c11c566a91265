// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The singleton program-management register.

use serde_json::{Value, json};

use crate::error::ReadError;
use crate::snapshot::DeviceSnapshot;

use super::{WriteRequest, selection_body};

/// Lists and updates the thermostat's non-vacation programs.
///
/// Reads return every snapshot event that is not vacation-typed, the
/// complement of the Vacations register. Writes either install a new
/// program object or, when no program is given, resume the next event
/// on the thermostat's program stack (or the whole stack).
#[derive(Debug, Clone)]
pub struct ProgramRegister {
    thermostat_id: u32,
}

impl ProgramRegister {
    /// The fixed point name of the program singleton.
    pub const POINT_NAME: &'static str = "Programs";

    /// Creates the program register for the given thermostat.
    #[must_use]
    pub fn new(thermostat_id: u32) -> Self {
        Self { thermostat_id }
    }

    /// Lists the non-vacation events in the snapshot.
    ///
    /// # Errors
    ///
    /// See [`PointRegister::get_state`](super::PointRegister::get_state).
    pub fn get_state(&self, snapshot: Option<&DeviceSnapshot>) -> Result<Value, ReadError> {
        let snapshot = snapshot.ok_or(ReadError::NoData)?;
        let events = snapshot
            .events(self.thermostat_id)
            .ok_or_else(|| ReadError::NotFound(Self::POINT_NAME.to_string()))?;
        let programs: Vec<Value> = events
            .iter()
            .filter(|event| event.get("type").and_then(Value::as_str) != Some("vacation"))
            .cloned()
            .collect();
        Ok(Value::Array(programs))
    }

    /// Builds a program write: install `program`, or resume when
    /// `program` is null.
    ///
    /// Program objects are passed through as-is; the vendor validates
    /// their shape. A null program resumes the next stacked event, or
    /// every stored program when `resume_all` is set.
    ///
    /// # Errors
    ///
    /// This register accepts any program value, so building currently
    /// cannot fail; the fallible signature matches the shared write
    /// contract.
    pub fn write_request(
        &self,
        program: &Value,
        resume_all: bool,
    ) -> Result<WriteRequest, crate::error::WriteError> {
        let body = if program.is_null() {
            tracing::debug!(resume_all, "Building program resume request");
            selection_body(
                "thermostats",
                json!(self.thermostat_id),
                json!({
                    "functions": [
                        {
                            "type": "resumeProgram",
                            "params": {"resumeAll": resume_all},
                        }
                    ]
                }),
            )
        } else {
            selection_body(
                "registered",
                json!(self.thermostat_id),
                json!({
                    "thermostat": {
                        "program": program,
                    }
                }),
            )
        };
        Ok(WriteRequest { body })
    }
}
