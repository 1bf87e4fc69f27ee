// Copyright 2024 Emupad Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use super::{ControlState, Device};

use fnv::FnvHashMap;
use parking_lot::Mutex;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug)]
struct VirtualControl {
    name: String,
    // f64 bits
    state: AtomicU64,
}

impl VirtualControl {
    fn new(name: String) -> Self {
        VirtualControl {
            name,
            state: AtomicU64::new(0f64.to_bits()),
        }
    }

    fn get(&self) -> ControlState {
        f64::from_bits(self.state.load(Ordering::Relaxed))
    }

    fn set(&self, val: ControlState) {
        self.state.store(val.to_bits(), Ordering::Relaxed);
    }
}

/// Device that lives only in memory.
///
/// Inputs can be changed immediately with `set_input()` or queued with `queue_input()`. Queued
/// changes are applied one per `update_input()` call, which makes it possible to script what
/// detection loop will see.
///
/// ```
/// use emupad::{Device, VirtualDevice};
///
/// let pad = VirtualDevice::new("virtual", "Pad")
///     .with_input("Button A")
///     .with_output("Motor");
///
/// pad.set_input("Button A", 1.0);
/// assert_eq!(pad.input_state(0), 1.0);
///
/// pad.set_output_state(0, 0.5);
/// assert_eq!(pad.output("Motor"), 0.5);
/// ```
#[derive(Debug)]
pub struct VirtualDevice {
    source: String,
    name: String,
    inputs: Vec<VirtualControl>,
    outputs: Vec<VirtualControl>,
    input_idx: FnvHashMap<String, usize>,
    output_idx: FnvHashMap<String, usize>,
    pending: Mutex<VecDeque<(usize, ControlState)>>,
}

impl VirtualDevice {
    pub fn new<S: Into<String>, N: Into<String>>(source: S, name: N) -> Self {
        VirtualDevice {
            source: source.into(),
            name: name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            input_idx: FnvHashMap::default(),
            output_idx: FnvHashMap::default(),
            pending: Mutex::new(VecDeque::new()),
        }
    }

    /// Adds input. Names are unique, adding the same name twice is no-op.
    pub fn with_input<S: Into<String>>(mut self, name: S) -> Self {
        let name = name.into();
        if !self.input_idx.contains_key(&name) {
            self.input_idx.insert(name.clone(), self.inputs.len());
            self.inputs.push(VirtualControl::new(name));
        }
        self
    }

    /// Adds output. Names are unique, adding the same name twice is no-op.
    pub fn with_output<S: Into<String>>(mut self, name: S) -> Self {
        let name = name.into();
        if !self.output_idx.contains_key(&name) {
            self.output_idx.insert(name.clone(), self.outputs.len());
            self.outputs.push(VirtualControl::new(name));
        }
        self
    }

    /// Sets state of input. Returns `false` if there is no such input.
    pub fn set_input(&self, name: &str, val: ControlState) -> bool {
        match self.input_idx.get(name) {
            Some(&idx) => {
                self.inputs[idx].set(val);
                true
            }
            None => false,
        }
    }

    /// Queues change of input that will be applied by `update_input()`. Returns `false` if
    /// there is no such input.
    pub fn queue_input(&self, name: &str, val: ControlState) -> bool {
        match self.input_idx.get(name) {
            Some(&idx) => {
                self.pending.lock().push_back((idx, val));
                true
            }
            None => false,
        }
    }

    /// Returns state of input or 0.0 if there is no such input.
    pub fn input(&self, name: &str) -> ControlState {
        self.input_idx
            .get(name)
            .map(|&idx| self.inputs[idx].get())
            .unwrap_or(0.0)
    }

    /// Returns last value written to output or 0.0 if there is no such output.
    pub fn output(&self, name: &str) -> ControlState {
        self.output_idx
            .get(name)
            .map(|&idx| self.outputs[idx].get())
            .unwrap_or(0.0)
    }
}

impl Device for VirtualDevice {
    fn source(&self) -> &str {
        &self.source
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn input_count(&self) -> usize {
        self.inputs.len()
    }

    fn input_name(&self, idx: usize) -> Option<&str> {
        self.inputs.get(idx).map(|c| c.name.as_str())
    }

    fn input_state(&self, idx: usize) -> ControlState {
        self.inputs.get(idx).map(VirtualControl::get).unwrap_or(0.0)
    }

    fn output_count(&self) -> usize {
        self.outputs.len()
    }

    fn output_name(&self, idx: usize) -> Option<&str> {
        self.outputs.get(idx).map(|c| c.name.as_str())
    }

    fn set_output_state(&self, idx: usize, state: ControlState) {
        if let Some(output) = self.outputs.get(idx) {
            output.set(state);
        }
    }

    fn update_input(&self) -> bool {
        if let Some((idx, val)) = self.pending.lock().pop_front() {
            self.inputs[idx].set(val);
        }
        true
    }

    fn find_input(&self, name: &str) -> Option<usize> {
        self.input_idx.get(name).cloned()
    }

    fn find_output(&self, name: &str) -> Option<usize> {
        self.output_idx.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controls() {
        let dev = VirtualDevice::new("virtual", "Keyboard")
            .with_input("Up")
            .with_input("Down")
            .with_input("Up")
            .with_output("Light");

        assert_eq!(dev.input_names(), vec!["Up", "Down"]);
        assert_eq!(dev.output_names(), vec!["Light"]);
        assert_eq!(dev.find_input("Down"), Some(1));
        assert_eq!(dev.find_output("Down"), None);

        assert!(dev.set_input("Down", 0.75));
        assert!(!dev.set_input("Left", 1.0));
        assert_eq!(dev.input_state(1), 0.75);
        assert_eq!(dev.input_state(7), 0.0);

        dev.set_output_state(3, 1.0);
        assert_eq!(dev.output("Light"), 0.0);
    }

    #[test]
    fn queued_input() {
        let dev = VirtualDevice::new("virtual", "Pad").with_input("A");
        assert!(dev.queue_input("A", 1.0));
        assert!(dev.queue_input("A", 0.0));

        assert_eq!(dev.input("A"), 0.0);
        dev.update_input();
        assert_eq!(dev.input("A"), 1.0);
        dev.update_input();
        assert_eq!(dev.input("A"), 0.0);
        dev.update_input();
        assert_eq!(dev.input("A"), 0.0);
    }
}
