// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The singleton live equipment-status register.

use serde_json::Value;

use crate::error::ReadError;
use crate::protocol::SummaryResponse;

/// Reports the HVAC equipment currently running for the thermostat.
///
/// The vendor does not include live equipment state in the bulk snapshot,
/// so this register is never served from it: every read issues a live
/// query against the summary endpoint, performed by the orchestrator.
/// This register only parses the result. It is unconditionally read-only.
#[derive(Debug, Clone)]
pub struct StatusRegister {
    thermostat_id: u32,
}

impl StatusRegister {
    /// The fixed point name of the status singleton.
    pub const POINT_NAME: &'static str = "Status";

    /// Creates the status register for the given thermostat.
    #[must_use]
    pub fn new(thermostat_id: u32) -> Self {
        Self { thermostat_id }
    }

    /// Extracts this thermostat's running-equipment list from a summary
    /// response.
    ///
    /// Status lines have the shape `"<id>:<eq1>,<eq2>"`; an idle
    /// thermostat reports an empty equipment segment, which parses to a
    /// single empty entry, mirroring the vendor's own convention.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::NotFound`] when no line matches this
    /// thermostat's identifier.
    pub fn parse_summary(&self, summary: &SummaryResponse) -> Result<Value, ReadError> {
        for line in &summary.status_list {
            let Some((thermostat, equipment)) = line.split_once(':') else {
                continue;
            };
            if thermostat.trim().parse::<u32>() == Ok(self.thermostat_id) {
                let running: Vec<Value> = equipment
                    .split(',')
                    .map(|item| Value::String(item.to_string()))
                    .collect();
                return Ok(Value::Array(running));
            }
        }
        Err(ReadError::NotFound(Self::POINT_NAME.to_string()))
    }
}
