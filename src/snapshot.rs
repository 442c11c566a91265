// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The in-memory device data snapshot.
//!
//! A snapshot is the most recent bulk-status response for all registered
//! thermostats, treated as one atomic unit of staleness: it is replaced
//! wholesale on every refresh and never partially updated.

use serde_json::Value;

/// The most recent bulk device data fetched through the snapshot cache.
///
/// # Examples
///
/// ```
/// use ecobridge::DeviceSnapshot;
///
/// let snapshot = DeviceSnapshot::new(serde_json::json!({
///     "thermostatList": [
///         {"identifier": "8675309", "settings": {"hvacMode": "heat"}}
///     ]
/// }));
///
/// let thermostat = snapshot.thermostat(8_675_309).unwrap();
/// assert_eq!(thermostat["settings"]["hvacMode"], "heat");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSnapshot {
    data: Value,
}

impl DeviceSnapshot {
    /// Wraps a bulk-status response body.
    #[must_use]
    pub fn new(data: Value) -> Self {
        Self { data }
    }

    /// Returns the raw snapshot body.
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Looks up the thermostat entry with the given identifier.
    ///
    /// The vendor serializes identifiers inconsistently — sometimes as a
    /// string, sometimes as a number — so both spellings match.
    #[must_use]
    pub fn thermostat(&self, thermostat_id: u32) -> Option<&Value> {
        self.data
            .get("thermostatList")?
            .as_array()?
            .iter()
            .find(|thermostat| identifier_matches(thermostat.get("identifier"), thermostat_id))
    }

    /// Returns the event list for the given thermostat, if present.
    #[must_use]
    pub fn events(&self, thermostat_id: u32) -> Option<&Vec<Value>> {
        self.thermostat(thermostat_id)?.get("events")?.as_array()
    }
}

fn identifier_matches(identifier: Option<&Value>, thermostat_id: u32) -> bool {
    match identifier {
        Some(Value::String(s)) => s.trim().parse::<u32>() == Ok(thermostat_id),
        Some(Value::Number(n)) => n.as_u64() == Some(u64::from(thermostat_id)),
        _ => false,
    }
}
