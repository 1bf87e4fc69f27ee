// Copyright 2024 Emupad Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::convert::Infallible;
use std::fmt::{self, Display};
use std::str::FromStr;

/// Identifies one physical device.
///
/// String form is `source/id/name`, for example `evdev/0/Xbox Wireless Controller`. `id`
/// distinguishes devices that share source and name, and is left empty when unknown. Name may
/// contain `/`. Empty qualifier is rendered as empty string.
///
/// Parsing never fails. Strings that do not follow the format produce qualifier that does not
/// match any device.
///
/// ```
/// use emupad::DeviceQualifier;
///
/// let q: DeviceQualifier = "evdev/1/Pad / Adapter".parse().unwrap();
/// assert_eq!(q.source, "evdev");
/// assert_eq!(q.id, Some(1));
/// assert_eq!(q.name, "Pad / Adapter");
/// assert_eq!(q.to_string(), "evdev/1/Pad / Adapter");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceQualifier {
    /// Backend that created the device.
    pub source: String,
    /// Disambiguating index among devices with the same source and name.
    pub id: Option<u32>,
    /// Device name as reported by the backend.
    pub name: String,
}

impl DeviceQualifier {
    pub fn new<S: Into<String>, N: Into<String>>(source: S, id: u32, name: N) -> Self {
        DeviceQualifier {
            source: source.into(),
            id: Some(id),
            name: name.into(),
        }
    }

    /// Returns `true` if all fields are unset.
    pub fn is_empty(&self) -> bool {
        self.source.is_empty() && self.id.is_none() && self.name.is_empty()
    }

    pub fn clear(&mut self) {
        *self = DeviceQualifier::default();
    }

    /// Replaces content with parsed `s`.
    pub fn set_from_str(&mut self, s: &str) {
        *self = DeviceQualifier::parse(s);
    }

    fn parse(s: &str) -> Self {
        let mut parts = s.splitn(3, '/');
        let source = parts.next().unwrap_or("");
        let id = parts.next().and_then(|id| id.trim().parse().ok());
        let name = parts.next().unwrap_or("");

        DeviceQualifier {
            source: source.to_owned(),
            id,
            name: name.to_owned(),
        }
    }
}

impl FromStr for DeviceQualifier {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(DeviceQualifier::parse(s))
    }
}

impl Display for DeviceQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }

        match self.id {
            Some(id) => write!(f, "{}/{}/{}", self.source, id, self.name),
            None => write!(f, "{}//{}", self.source, self.name),
        }
    }
}
