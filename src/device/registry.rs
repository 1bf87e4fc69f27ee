// Copyright 2024 Emupad Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use super::{Device, DeviceQualifier};

use parking_lot::{Mutex, RwLock};

use std::sync::Arc;

#[derive(Debug)]
struct Entry {
    qualifier: DeviceQualifier,
    device: Arc<dyn Device>,
}

/// List of live devices.
///
/// Every method takes the registry lock, so device list can not be torn while UI thread
/// enumerates devices and backend handles hotplug. References to devices are handed out as
/// `Arc`; `ControlReference` keeps only `Weak` links, so removing a device from the registry
/// invalidates all bindings to it.
///
/// Input polling goes through `update_input()` or `update_device_input()`, which are serialized,
/// so a device is never polled by two threads at once.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: RwLock<Vec<Entry>>,
    poll: Mutex<()>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        DeviceRegistry {
            devices: RwLock::new(Vec::new()),
            poll: Mutex::new(()),
        }
    }

    /// Adds device and returns its qualifier. Devices with the same source and name get the
    /// lowest free id, so a device that reconnects gets its old id back.
    pub fn add_device(&self, device: Arc<dyn Device>) -> DeviceQualifier {
        let mut devices = self.devices.write();

        let id = (0..)
            .find(|&id| {
                !devices.iter().any(|e| {
                    e.qualifier.id == Some(id)
                        && e.qualifier.source == device.source()
                        && e.qualifier.name == device.name()
                })
            })
            .unwrap_or(0);
        let qualifier = DeviceQualifier::new(device.source(), id, device.name());

        info!("Device connected: {}", qualifier);
        devices.push(Entry {
            qualifier: qualifier.clone(),
            device,
        });

        qualifier
    }

    /// Removes device matching `qualifier`.
    pub fn remove_device(&self, qualifier: &DeviceQualifier) -> Option<Arc<dyn Device>> {
        let mut devices = self.devices.write();
        let idx = devices.iter().position(|e| e.qualifier == *qualifier)?;
        info!("Device disconnected: {}", qualifier);

        Some(devices.remove(idx).device)
    }

    /// Removes all devices.
    pub fn clear(&self) {
        let mut devices = self.devices.write();
        if !devices.is_empty() {
            info!("Removing {} devices", devices.len());
        }
        devices.clear();
    }

    /// Returns device matching `qualifier`. Empty qualifier never matches.
    pub fn find_device(&self, qualifier: &DeviceQualifier) -> Option<Arc<dyn Device>> {
        self.devices
            .read()
            .iter()
            .find(|e| e.qualifier == *qualifier)
            .map(|e| e.device.clone())
    }

    /// Snapshot of all devices in registration order.
    pub fn devices(&self) -> Vec<(DeviceQualifier, Arc<dyn Device>)> {
        self.devices
            .read()
            .iter()
            .map(|e| (e.qualifier.clone(), e.device.clone()))
            .collect()
    }

    /// Qualifiers of all devices in registration order.
    pub fn qualifiers(&self) -> Vec<DeviceQualifier> {
        self.devices
            .read()
            .iter()
            .map(|e| e.qualifier.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }

    /// Polls all devices. Holds the registry lock for the whole pass.
    pub fn update_input(&self) {
        let _poll = self.poll.lock();
        for e in self.devices.read().iter() {
            if !e.device.update_input() {
                debug!("Failed to update input of {}", e.qualifier);
            }
        }
    }

    /// Polls single device. Returns `false` if there is no such device or it failed to update.
    pub fn update_device_input(&self, qualifier: &DeviceQualifier) -> bool {
        let _poll = self.poll.lock();
        match self.find_device(qualifier) {
            Some(device) => device.update_input(),
            None => false,
        }
    }

    /// Flushes outputs of all devices.
    pub fn update_output(&self) {
        for e in self.devices.read().iter() {
            if !e.device.update_output() {
                debug!("Failed to update output of {}", e.qualifier);
            }
        }
    }
}
