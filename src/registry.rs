// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry configuration records describing the configured points.
//!
//! The platform delivers the registry as an ordered list of flat records
//! with human-facing column headers. Field semantics follow the platform
//! conventions: `Writable` and `Readable` are the string `"true"`
//! (case-insensitive, anything else is false), `Volttron Point Name`
//! aliases `Point Name`, and an empty `Default Value` means no default.

use serde::Deserialize;

use crate::error::ConfigError;

/// Register kinds a registry entry can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterKind {
    /// Point backed by the snapshot's `settings` object.
    Setting,
    /// Point backed by the snapshot's `runtime` object, written as a hold.
    Hold,
}

/// One record of the registry configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryEntry {
    /// Vendor-side point name.
    #[serde(rename = "Point Name", default)]
    pub point_name: String,

    /// Optional platform-facing alias; takes precedence over `Point Name`.
    #[serde(rename = "Volttron Point Name", default)]
    pub volttron_point_name: String,

    /// Whether writes are allowed ("true", case-insensitive).
    #[serde(rename = "Writable", default)]
    pub writable: String,

    /// Whether reads are allowed ("true", case-insensitive).
    #[serde(rename = "Readable", default)]
    pub readable: String,

    /// Free-form description.
    #[serde(rename = "Notes", default)]
    pub notes: String,

    /// Engineering units, if any.
    #[serde(rename = "Units", default)]
    pub units: Option<String>,

    /// Default value; whitespace-only means none.
    #[serde(rename = "Default Value", default)]
    pub default_value: String,

    /// Declared register type (`setting` prefix match, or `hold`).
    #[serde(rename = "Type", default)]
    pub kind: String,
}

impl RegistryEntry {
    /// Resolves the effective point name: the platform alias when present,
    /// else the vendor point name.
    #[must_use]
    pub fn effective_name(&self) -> Option<&str> {
        let alias = self.volttron_point_name.trim();
        if !alias.is_empty() {
            return Some(alias);
        }
        let name = self.point_name.trim();
        (!name.is_empty()).then_some(name)
    }

    /// Returns true when the entry does not allow writes.
    #[must_use]
    pub fn read_only(&self) -> bool {
        !self.writable.trim().eq_ignore_ascii_case("true")
    }

    /// Returns true when the entry allows reads.
    #[must_use]
    pub fn readable(&self) -> bool {
        self.readable.trim().eq_ignore_ascii_case("true")
    }

    /// Returns the default value, with empty strings truncated to `None`.
    #[must_use]
    pub fn default_value(&self) -> Option<&str> {
        let value = self.default_value.trim();
        (!value.is_empty()).then_some(value)
    }

    /// Resolves the declared register kind.
    ///
    /// `setting` matches by case-insensitive prefix so variants like
    /// `settings` pass; `hold` matches exactly, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedRegisterType`] for anything else.
    pub fn register_kind(&self, index: usize) -> Result<RegisterKind, ConfigError> {
        let kind = self.kind.trim();
        if kind.to_ascii_lowercase().starts_with("setting") {
            Ok(RegisterKind::Setting)
        } else if kind.eq_ignore_ascii_case("hold") {
            Ok(RegisterKind::Hold)
        } else {
            Err(ConfigError::UnsupportedRegisterType {
                index,
                kind: kind.to_string(),
            })
        }
    }
}
