// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The singleton vacation-management register.

use chrono::{NaiveDate, NaiveTime};
use serde_json::{Value, json};

use crate::error::{ReadError, WriteError};
use crate::snapshot::DeviceSnapshot;

use super::{WriteRequest, selection_body};

const DATE_FIELDS: [&str; 2] = ["startDate", "endDate"];
const TIME_FIELDS: [&str; 2] = ["startTime", "endTime"];

/// Manages all vacation events of the thermostat.
///
/// Vacations are transient, so a single register covers creating,
/// deleting and listing them. Reads filter the snapshot's event list
/// down to vacation-typed events; the Programs register keeps the rest,
/// so no event is ever double-counted between the two.
#[derive(Debug, Clone)]
pub struct VacationRegister {
    thermostat_id: u32,
}

impl VacationRegister {
    /// The fixed point name of the vacation singleton.
    pub const POINT_NAME: &'static str = "Vacations";

    /// Fields a vacation create value must carry.
    pub const REQUIRED_FIELDS: [&'static str; 7] = [
        "name",
        "coolHoldTemp",
        "heatHoldTemp",
        "startDate",
        "startTime",
        "endDate",
        "endTime",
    ];

    /// Creates the vacation register for the given thermostat.
    #[must_use]
    pub fn new(thermostat_id: u32) -> Self {
        Self { thermostat_id }
    }

    /// Lists the vacation events in the snapshot.
    ///
    /// # Errors
    ///
    /// See [`PointRegister::get_state`](super::PointRegister::get_state).
    pub fn get_state(&self, snapshot: Option<&DeviceSnapshot>) -> Result<Value, ReadError> {
        let snapshot = snapshot.ok_or(ReadError::NoData)?;
        let events = snapshot
            .events(self.thermostat_id)
            .ok_or_else(|| ReadError::NotFound(Self::POINT_NAME.to_string()))?;
        let vacations: Vec<Value> = events
            .iter()
            .filter(|event| event.get("type").and_then(Value::as_str) == Some("vacation"))
            .cloned()
            .collect();
        Ok(Value::Array(vacations))
    }

    /// Validates the vacation value and builds a `createVacation` or
    /// `deleteVacation` function body.
    ///
    /// For a create, `value` must be an object carrying all of
    /// [`REQUIRED_FIELDS`](Self::REQUIRED_FIELDS), with dates formatted
    /// `YYYY-mm-dd` and times `HH:MM:SS`. For a delete, `value` is the
    /// vacation name string or an object with a `name` field.
    ///
    /// # Errors
    ///
    /// Returns a [`WriteError`] describing the malformed input.
    pub fn write_request(&self, value: &Value, delete: bool) -> Result<WriteRequest, WriteError> {
        if delete {
            self.delete_request(value)
        } else {
            self.create_request(value)
        }
    }

    fn delete_request(&self, value: &Value) -> Result<WriteRequest, WriteError> {
        let name = match value {
            Value::String(name) if !name.is_empty() => name.as_str(),
            Value::Object(map) => map
                .get("name")
                .and_then(Value::as_str)
                .filter(|name| !name.is_empty())
                .ok_or(WriteError::MissingVacationName)?,
            _ => return Err(WriteError::MissingVacationName),
        };

        tracing::debug!(name, "Building vacation deletion request");
        let body = selection_body(
            "registered",
            json!(""),
            json!({
                "functions": [
                    {
                        "type": "deleteVacation",
                        "params": {"name": name},
                    }
                ]
            }),
        );
        Ok(WriteRequest { body })
    }

    fn create_request(&self, value: &Value) -> Result<WriteRequest, WriteError> {
        let Some(vacation) = value.as_object() else {
            return Err(WriteError::ExpectedObject(Self::POINT_NAME.to_string()));
        };
        for field in Self::REQUIRED_FIELDS {
            if !vacation.contains_key(field) {
                return Err(WriteError::MissingKey {
                    point: Self::POINT_NAME.to_string(),
                    key: field.to_string(),
                });
            }
        }
        for field in DATE_FIELDS {
            let date = vacation.get(field).and_then(Value::as_str);
            if !date.is_some_and(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").is_ok()) {
                return Err(WriteError::InvalidDate(field.to_string()));
            }
        }
        for field in TIME_FIELDS {
            let time = vacation.get(field).and_then(Value::as_str);
            if !time.is_some_and(|t| NaiveTime::parse_from_str(t, "%H:%M:%S").is_ok()) {
                return Err(WriteError::InvalidTime(field.to_string()));
            }
        }

        let body = selection_body(
            "registered",
            json!(self.thermostat_id),
            json!({
                "functions": [
                    {
                        "type": "createVacation",
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
                {
                    "identifier": "111",
                    "events": [
                        {"type": "vacation", "name": "Trip"},
                        {"type": "hold", "name": "Evening"},
                        {"type": "vacation", "name": "Holidays"}
                    ]
                }
            ]
        }))
    }

    fn valid_vacation() -> Value {
        json!({
            "name": "Trip",
            "coolHoldTemp": 780,
            "heatHoldTemp": 660,
            "startDate": "2026-09-01",
            "startTime": "08:00:00",
            "endDate": "2026-09-07",
            "endTime": "18:30:00",
        })
    }

    #[test]
    fn reads_only_vacation_events() {
        let register = VacationRegister::new(111);
        let value = register.get_state(Some(&snapshot())).unwrap();
        let names: Vec<&str> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|event| event["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Trip", "Holidays"]);
    }

    #[test]
    fn missing_snapshot_is_no_data() {
        let register = VacationRegister::new(111);
        assert_eq!(register.get_state(None), Err(ReadError::NoData));
    }

    #[test]
    fn create_requires_all_seven_fields() {
        let register = VacationRegister::new(111);
        let mut vacation = valid_vacation();
        vacation.as_object_mut().unwrap().remove("endTime");

        assert_eq!(
            register.write_request(&vacation, false),
            Err(WriteError::MissingKey {
                point: "Vacations".to_string(),
                key: "endTime".to_string(),
            })
        );
    }

    #[test]
    fn create_rejects_non_object() {
        let register = VacationRegister::new(111);
        assert_eq!(
            register.write_request(&json!("Trip"), false),
            Err(WriteError::ExpectedObject("Vacations".to_string()))
        );
    }

    #[test]
    fn create_validates_date_format() {
        let register = VacationRegister::new(111);
        let mut vacation = valid_vacation();
        vacation["startDate"] = json!("09/01/2026");

        assert_eq!(
            register.write_request(&vacation, false),
            Err(WriteError::InvalidDate("startDate".to_string()))
        );
    }

    #[test]
    fn create_validates_time_format() {
        let register = VacationRegister::new(111);
        let mut vacation = valid_vacation();
        vacation["startTime"] = json!("8am");

        assert_eq!(
            register.write_request(&vacation, false),
            Err(WriteError::InvalidTime("startTime".to_string()))
        );
    }

    #[test]
    fn valid_create_builds_create_vacation_function() {
        let register = VacationRegister::new(111);
        let vacation = valid_vacation();
        let request = register.write_request(&vacation, false).unwrap();

        assert_eq!(request.body["functions"][0]["type"], "createVacation");
        assert_eq!(request.body["functions"][0]["params"], vacation);
        assert_eq!(request.body["selection"]["selectionType"], "registered");
        assert_eq!(request.body["selection"]["selectionMatch"], 111);
    }

    #[test]
    fn delete_accepts_name_string() {
        let register = VacationRegister::new(111);
        let request = register.write_request(&json!("Trip"), true).unwrap();

        assert_eq!(request.body["functions"][0]["type"], "deleteVacation");
        assert_eq!(request.body["functions"][0]["params"]["name"], "Trip");
        assert_eq!(request.body["selection"]["selectionMatch"], "");
    }

    #[test]
    fn delete_accepts_object_with_name() {
        let register = VacationRegister::new(111);
        let request = register
            .write_request(&json!({"name": "Trip"}), true)
            .unwrap();
        assert_eq!(request.body["functions"][0]["params"]["name"], "Trip");
    }

    #[test]
    fn delete_without_name_is_rejected() {
        let register = VacationRegister::new(111);
        assert_eq!(
            register.write_request(&json!({}), true),
            Err(WriteError::MissingVacationName)
        );
        assert_eq!(
            register.write_request(&json!(""), true),
            Err(WriteError::MissingVacationName)
        );
    }
}
