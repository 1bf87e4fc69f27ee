// Copyright 2024 Emupad Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::device::{DeviceQualifier, DeviceRegistry};
use crate::group::{Control, ControlGroup};
use crate::ini::IniSection;
use crate::reference::CombineMode;
use crate::utils;

/// Key of default device. Older versions wrote it as `" Device"`, which reads back as the same
/// key because ini keys are trimmed.
pub const DEVICE_KEY: &str = "Device";

const FULL_RANGE: i64 = 100;

/// One virtual controller: ordered groups of controls and the device they use by default.
///
/// Persistence format uses one `IniSection` per controller. Every key is prefixed with group
/// name, for example `Main Stick/Dead Zone`, `Buttons/A`, `Buttons/A/Device`, `Buttons/A/Range`
/// and `Buttons/A/Mode`. Values equal to their defaults are not written.
#[derive(Clone, Debug)]
pub struct ControllerEmu {
    name: String,
    groups: Vec<ControlGroup>,
    /// Device used by controls that were not pointed at a different one.
    pub default_device: DeviceQualifier,
    // Value of `default_device` at last synchronization
    synced_device: DeviceQualifier,
}

impl ControllerEmu {
    pub fn new<S: Into<String>>(name: S) -> Self {
        ControllerEmu {
            name: name.into(),
            groups: Vec::new(),
            default_device: DeviceQualifier::default(),
            synced_device: DeviceQualifier::default(),
        }
    }

    /// Appends group. Groups are persisted and iterated in the order they were added.
    pub fn add_group(&mut self, group: ControlGroup) {
        self.groups.push(group);
    }

    pub fn with_group(mut self, group: ControlGroup) -> Self {
        self.add_group(group);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn groups(&self) -> &[ControlGroup] {
        &self.groups
    }

    pub fn groups_mut(&mut self) -> &mut [ControlGroup] {
        &mut self.groups
    }

    pub fn group(&self, name: &str) -> Option<&ControlGroup> {
        self.groups.iter().find(|g| g.name() == name)
    }

    pub fn group_mut(&mut self, name: &str) -> Option<&mut ControlGroup> {
        self.groups.iter_mut().find(|g| g.name() == name)
    }

    pub fn control(&self, group: &str, control: &str) -> Option<&Control> {
        self.group(group).and_then(|g| g.control(control))
    }

    pub fn control_mut(&mut self, group: &str, control: &str) -> Option<&mut Control> {
        self.group_mut(group).and_then(|g| g.control_mut(control))
    }

    /// Replaces whole configuration with content of `section`. Missing keys reset values to
    /// their defaults, malformed values are ignored.
    pub fn load_config(&mut self, section: &IniSection) {
        self.default_device.set_from_str(section.get(DEVICE_KEY, ""));
        let default_dev = self.default_device.to_string();

        for group in &mut self.groups {
            let prefix = format!("{}/", group.name());

            for setting in group.settings_mut() {
                let key = format!("{}{}", prefix, setting.name());
                setting.value = section
                    .lookup(&key)
                    .and_then(utils::from_percent)
                    .unwrap_or_else(|| setting.default_value());
            }

            for control in group.controls_mut() {
                let key = format!("{}{}", prefix, control.name());
                let reference = &mut control.reference;

                reference.set_expression(section.get(&key, "").parse().unwrap_or_default());
                reference
                    .device
                    .set_from_str(section.get(&format!("{}/Device", key), &default_dev));
                reference.range = section
                    .lookup(&format!("{}/Range", key))
                    .and_then(utils::from_percent)
                    .unwrap_or(1.0);
                if reference.is_input() {
                    let mode = section.get_value(&format!("{}/Mode", key), 0i64);
                    reference.set_mode(CombineMode::from_i64(mode));
                }
            }
        }

        self.synced_device = self.default_device.clone();
        debug!("Loaded configuration of {}", self.name);
    }

    /// Writes configuration to `section`, removing keys whose values equal defaults.
    pub fn save_config(&self, section: &mut IniSection) {
        let default_dev = self.default_device.to_string();
        section.set(DEVICE_KEY, default_dev.as_str(), "");

        for group in &self.groups {
            let prefix = format!("{}/", group.name());

            for setting in group.settings() {
                section.set_value(
                    &format!("{}{}", prefix, setting.name()),
                    utils::to_percent(setting.value),
                    utils::to_percent(setting.default_value()),
                );
            }

            for control in group.controls() {
                let key = format!("{}{}", prefix, control.name());
                let reference = &control.reference;

                section.set(&key, reference.expression().to_string(), "");
                section.set(
                    &format!("{}/Device", key),
                    reference.device.to_string(),
                    &default_dev,
                );
                section.set_value(
                    &format!("{}/Range", key),
                    utils::to_percent(reference.range),
                    FULL_RANGE,
                );
                if let Some(mode) = reference.mode() {
                    section.set_value(&format!("{}/Mode", key), mode.as_i64(), 0);
                }
            }
        }
    }

    /// Resolves every control against `registry`. Controls whose device is missing become
    /// unresolved and read as neutral.
    pub fn update_references(&mut self, registry: &DeviceRegistry) {
        for group in &mut self.groups {
            for control in group.controls_mut() {
                control.reference.update_reference(registry);
            }
        }
    }

    /// Points every control that still uses the previous default device at the current
    /// `default_device`. Controls explicitly bound to other devices are left alone.
    pub fn update_default_device(&mut self) {
        if self.synced_device == self.default_device {
            return;
        }

        for group in &mut self.groups {
            for control in group.controls_mut() {
                if control.reference.device == self.synced_device {
                    control.reference.device = self.default_device.clone();
                }
            }
        }
        self.synced_device = self.default_device.clone();
    }

    /// Assigns `default_device` and propagates it with `update_default_device()`.
    pub fn set_default_device(&mut self, device: DeviceQualifier) {
        self.default_device = device;
        self.update_default_device();
    }

    /// Unbinds every control, resets settings and default device.
    pub fn clear_all(&mut self) {
        self.load_config(&IniSection::new());
    }
}
