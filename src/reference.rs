// Copyright 2024 Emupad Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Bindings between virtual controls and controls of physical devices.

use crate::device::{ControlState, Device, DeviceQualifier, DeviceRegistry};
use crate::expr::ControlExpression;

use std::sync::{Arc, Weak};
use std::thread;
use std::time::{Duration, Instant};

/// Input has to exceed this value to be picked up by detection.
pub const DETECT_THRESHOLD: ControlState = 0.55;
/// How long detection sleeps between polls.
pub const DETECT_POLL_STEP: Duration = Duration::from_millis(10);
/// Detection timeout used by configuration frontends.
pub const DEFAULT_DETECT_TIMEOUT: Duration = Duration::from_millis(1500);

/// How operands of input expression are combined.
///
/// Only `Or` has defined semantics. `And` and `Not` are stored and persisted, but evaluated
/// the same as `Or`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CombineMode {
    #[default]
    Or = 0,
    And = 1,
    Not = 2,
}

impl CombineMode {
    /// Converts persisted value. Unknown values map to `Or`.
    pub fn from_i64(val: i64) -> Self {
        match val {
            1 => CombineMode::And,
            2 => CombineMode::Not,
            _ => CombineMode::Or,
        }
    }

    pub fn as_i64(self) -> i64 {
        self as i64
    }
}

/// Direction of a binding.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReferenceKind {
    Input { mode: CombineMode },
    Output,
}

#[derive(Clone, Debug)]
struct Resolved {
    device: Weak<dyn Device>,
    // Indices of inputs or outputs, depending on kind
    controls: Vec<usize>,
}

/// Binding of one virtual control to named controls of one device.
///
/// Reference has to be resolved with `update_reference()` before it reports anything. Until
/// then, and whenever device disappears, `state()` returns 0 and `set_state()` does nothing.
#[derive(Clone, Debug)]
pub struct ControlReference {
    /// Device this reference points at.
    pub device: DeviceQualifier,
    /// Scale applied to state.
    pub range: ControlState,
    expression: ControlExpression,
    kind: ReferenceKind,
    resolved: Option<Resolved>,
}

impl ControlReference {
    fn new(kind: ReferenceKind) -> Self {
        ControlReference {
            device: DeviceQualifier::default(),
            range: 1.0,
            expression: ControlExpression::new(),
            kind,
            resolved: None,
        }
    }

    /// Creates unbound input reference.
    pub fn input() -> Self {
        ControlReference::new(ReferenceKind::Input {
            mode: CombineMode::Or,
        })
    }

    /// Creates unbound output reference.
    pub fn output() -> Self {
        ControlReference::new(ReferenceKind::Output)
    }

    pub fn kind(&self) -> ReferenceKind {
        self.kind
    }

    pub fn is_input(&self) -> bool {
        match self.kind {
            ReferenceKind::Input { .. } => true,
            ReferenceKind::Output => false,
        }
    }

    /// Returns combine mode of input reference or `None` for output.
    pub fn mode(&self) -> Option<CombineMode> {
        match self.kind {
            ReferenceKind::Input { mode } => Some(mode),
            ReferenceKind::Output => None,
        }
    }

    /// Sets combine mode. No-op for output references.
    pub fn set_mode(&mut self, new: CombineMode) {
        if let ReferenceKind::Input { ref mut mode } = self.kind {
            *mode = new;
        }
    }

    pub fn expression(&self) -> &ControlExpression {
        &self.expression
    }

    /// Replaces expression. Reference becomes unresolved until next `update_reference()`.
    pub fn set_expression(&mut self, expression: ControlExpression) {
        self.expression = expression;
        self.resolved = None;
    }

    /// Unbinds reference and resets range.
    pub fn clear(&mut self) {
        self.set_expression(ControlExpression::new());
        self.range = 1.0;
    }

    /// Number of controls from expression that were found on device during last
    /// `update_reference()`.
    pub fn bound_count(&self) -> usize {
        match self.resolved {
            Some(ref r) if r.device.strong_count() > 0 => r.controls.len(),
            _ => 0,
        }
    }

    /// Returns `true` if reference points at live device.
    pub fn is_resolved(&self) -> bool {
        self.resolved
            .as_ref()
            .map(|r| r.device.strong_count() > 0)
            .unwrap_or(false)
    }

    /// Resolves reference against `registry`. If device is not present reference becomes
    /// unresolved. Names that device does not have are skipped.
    pub fn update_reference(&mut self, registry: &DeviceRegistry) {
        let device = match registry.find_device(&self.device) {
            Some(device) => device,
            None => {
                if !self.device.is_empty() && !self.expression.is_empty() {
                    debug!(
                        "Device {:?} not found, {} unbound",
                        self.device.to_string(),
                        self.expression
                    );
                }
                self.resolved = None;
                return;
            }
        };

        let is_input = self.is_input();
        let controls = self
            .expression
            .names()
            .filter_map(|name| {
                let idx = if is_input {
                    device.find_input(name)
                } else {
                    device.find_output(name)
                };
                if idx.is_none() {
                    debug!("{} has no control named {:?}", self.device, name);
                }
                idx
            })
            .collect();

        self.resolved = Some(Resolved {
            device: Arc::downgrade(&device),
            controls,
        });
    }

    /// Returns state of input reference scaled by range. Bound controls are combined by taking
    /// the maximum. Unresolved references and outputs return 0.
    pub fn state(&self) -> ControlState {
        if !self.is_input() {
            return 0.0;
        }

        let resolved = match self.resolved {
            Some(ref r) => r,
            None => return 0.0,
        };
        let device = match resolved.device.upgrade() {
            Some(device) => device,
            None => return 0.0,
        };

        let state = resolved
            .controls
            .iter()
            .map(|&idx| device.input_state(idx))
            .fold(0.0, ControlState::max);

        state * self.range
    }

    /// Sets all bound outputs to `state` scaled by range. No-op for unresolved references and
    /// inputs.
    pub fn set_state(&self, state: ControlState) {
        if self.is_input() {
            return;
        }

        let resolved = match self.resolved {
            Some(ref r) => r,
            None => return,
        };

        if let Some(device) = resolved.device.upgrade() {
            for &idx in &resolved.controls {
                device.set_output_state(idx, state * self.range);
            }
        }
    }

    /// Waits up to `timeout` for any input of referenced device to be pressed and binds this
    /// reference to it. `slot` selects which of the newly pressed inputs to take, counting from
    /// 1. On timeout reference is left untouched and `false` is returned.
    ///
    /// Output references are tested instead, see `test_output()`.
    ///
    /// This blocks calling thread. Do not call it while holding a lock that emulation thread
    /// needs, see `detect_control()`.
    pub fn detect(&mut self, registry: &DeviceRegistry, timeout: Duration, slot: usize) -> bool {
        if !self.is_input() {
            return self.test_output(registry, timeout);
        }

        match detect_control(registry, &self.device, timeout, slot) {
            Some(name) => {
                self.set_expression(ControlExpression::single(name));
                self.update_reference(registry);
                true
            }
            None => false,
        }
    }

    /// Drives bound outputs to full for `duration`, then sets them back to 0. Returns `false`
    /// without waiting if this is an input or it is not resolved.
    pub fn test_output(&self, registry: &DeviceRegistry, duration: Duration) -> bool {
        if self.is_input() || !self.is_resolved() {
            return false;
        }

        self.set_state(1.0);
        registry.update_output();
        thread::sleep(duration);
        self.set_state(0.0);
        registry.update_output();

        true
    }
}

/// Polls inputs of device matching `qualifier` for up to `timeout` and returns name of the
/// `slot`-th input that got pressed. Inputs that were already pressed when detection started
/// have to be released first.
///
/// Device is polled through `registry`, so detection never races with the emulation thread
/// calling `DeviceRegistry::update_input()`.
pub fn detect_control(
    registry: &DeviceRegistry,
    qualifier: &DeviceQualifier,
    timeout: Duration,
    slot: usize,
) -> Option<String> {
    let device = match registry.find_device(qualifier) {
        Some(device) => device,
        None => {
            debug!("Can not detect input, device {:?} not found", qualifier.to_string());
            return None;
        }
    };

    detect_input(registry, qualifier, &*device, timeout, slot)
        .and_then(|idx| device.input_name(idx).map(str::to_owned))
}

fn detect_input(
    registry: &DeviceRegistry,
    qualifier: &DeviceQualifier,
    device: &dyn Device,
    timeout: Duration,
    slot: usize,
) -> Option<usize> {
    let count = device.input_count();
    if count == 0 {
        return None;
    }

    let slot = slot.max(1);
    let mut found = 0;
    let mut held = (0..count)
        .map(|idx| device.input_state(idx) > DETECT_THRESHOLD)
        .collect::<Vec<_>>();
    let start = Instant::now();

    loop {
        if !registry.update_device_input(qualifier) {
            debug!("{} went away during input detection", qualifier);
            return None;
        }

        for (idx, held) in held.iter_mut().enumerate() {
            if device.input_state(idx) > DETECT_THRESHOLD {
                if !*held {
                    *held = true;
                    found += 1;
                    if found == slot {
                        return Some(idx);
                    }
                }
            } else {
                *held = false;
            }
        }

        if start.elapsed() >= timeout {
            debug!("Input detection timed out after {:?}", timeout);
            return None;
        }
        thread::sleep(DETECT_POLL_STEP);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::VirtualDevice;

    fn setup() -> (DeviceRegistry, Arc<VirtualDevice>, DeviceQualifier) {
        let registry = DeviceRegistry::new();
        let dev = Arc::new(
            VirtualDevice::new("virtual", "Pad")
                .with_input("A")
                .with_input("B")
                .with_input("C")
                .with_output("Motor")
                .with_output("Light"),
        );
        let q = registry.add_device(dev.clone());
        (registry, dev, q)
    }

    fn input(q: &DeviceQualifier, expr: &str) -> ControlReference {
        let mut r = ControlReference::input();
        r.device = q.clone();
        r.set_expression(expr.parse().unwrap());
        r
    }

    #[test]
    fn unresolved_is_neutral() {
        let (_registry, dev, q) = setup();
        let r = input(&q, "A");
        dev.set_input("A", 1.0);

        assert!(!r.is_resolved());
        assert_eq!(r.state(), 0.0);
        assert_eq!(r.bound_count(), 0);
    }

    #[test]
    fn or_takes_maximum() {
        let (registry, dev, q) = setup();
        let mut r = input(&q, "A|B|Missing");
        r.update_reference(&registry);

        assert!(r.is_resolved());
        assert_eq!(r.bound_count(), 2);

        dev.set_input("A", 0.25);
        dev.set_input("B", 0.5);
        dev.set_input("C", 1.0);
        assert_eq!(r.state(), 0.5);

        r.range = 2.0;
        assert_eq!(r.state(), 1.0);

        // Other modes are evaluated as OR
        r.set_mode(CombineMode::Not);
        assert_eq!(r.mode(), Some(CombineMode::Not));
        assert_eq!(r.state(), 1.0);
    }

    #[test]
    fn missing_device() {
        let (registry, dev, _) = setup();
        let mut r = input(&DeviceQualifier::new("virtual", 5, "Pad"), "A");
        dev.set_input("A", 1.0);
        r.update_reference(&registry);

        assert!(!r.is_resolved());
        assert_eq!(r.state(), 0.0);
    }

    #[test]
    fn hotplug_invalidates() {
        let (registry, dev, q) = setup();
        let mut r = input(&q, "A");
        r.update_reference(&registry);
        dev.set_input("A", 1.0);
        assert_eq!(r.state(), 1.0);

        drop(dev);
        registry.remove_device(&q);
        assert!(!r.is_resolved());
        assert_eq!(r.state(), 0.0);
        assert_eq!(r.bound_count(), 0);
    }

    #[test]
    fn set_expression_unresolves() {
        let (registry, dev, q) = setup();
        let mut r = input(&q, "A");
        r.update_reference(&registry);
        dev.set_input("B", 1.0);

        r.set_expression("B".parse().unwrap());
        assert_eq!(r.state(), 0.0);
        r.update_reference(&registry);
        assert_eq!(r.state(), 1.0);

        r.range = 0.5;
        r.clear();
        assert!(r.expression().is_empty());
        assert_eq!(r.range, 1.0);
    }

    #[test]
    fn output() {
        let (registry, dev, q) = setup();
        let mut r = ControlReference::output();
        r.device = q;
        r.set_expression("Motor|Light".parse().unwrap());

        r.set_state(1.0);
        assert_eq!(dev.output("Motor"), 0.0);

        r.update_reference(&registry);
        r.range = 0.5;
        r.set_state(1.0);
        assert_eq!(dev.output("Motor"), 0.5);
        assert_eq!(dev.output("Light"), 0.5);
        assert_eq!(r.state(), 0.0);
        assert_eq!(r.mode(), None);
    }

    #[test]
    fn test_output_pulses_motor() {
        let (registry, dev, q) = setup();
        let mut r = ControlReference::output();
        r.device = q;
        r.set_expression("Motor".parse().unwrap());
        r.update_reference(&registry);

        thread::scope(|s| {
            let pulse = s.spawn(|| r.test_output(&registry, Duration::from_millis(300)));
            thread::sleep(Duration::from_millis(50));
            assert_eq!(dev.output("Motor"), 1.0);
            assert!(pulse.join().unwrap());
        });
        assert_eq!(dev.output("Motor"), 0.0);

        let mut r = r.clone();
        assert!(r.detect(&registry, Duration::from_millis(10), 1));
        assert_eq!(r.expression().to_string(), "Motor");
    }

    #[test]
    fn test_output_needs_bound_output() {
        let (registry, dev, q) = setup();
        let mut r = ControlReference::output();
        r.device = q.clone();
        r.set_expression("Motor".parse().unwrap());

        let start = Instant::now();
        assert!(!r.test_output(&registry, Duration::from_secs(5)));
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(dev.output("Motor"), 0.0);

        let mut i = input(&q, "A");
        i.update_reference(&registry);
        assert!(!i.test_output(&registry, Duration::from_secs(5)));
    }

    #[test]
    fn combine_mode_values() {
        assert_eq!(CombineMode::from_i64(0), CombineMode::Or);
        assert_eq!(CombineMode::from_i64(1), CombineMode::And);
        assert_eq!(CombineMode::from_i64(2), CombineMode::Not);
        assert_eq!(CombineMode::from_i64(42), CombineMode::Or);
        assert_eq!(CombineMode::Not.as_i64(), 2);
    }

    #[test]
    fn detect() {
        let (registry, dev, q) = setup();
        let mut r = input(&q, "A");
        dev.queue_input("B", 1.0);

        assert!(r.detect(&registry, Duration::from_millis(200), 1));
        assert_eq!(r.expression().to_string(), "B");
        assert!(r.is_resolved());
        assert_eq!(r.state(), 1.0);
    }

    #[test]
    fn detect_ignores_held_inputs() {
        let (registry, dev, q) = setup();
        dev.set_input("A", 1.0);
        dev.queue_input("A", 0.0);
        dev.queue_input("C", 1.0);

        let name = detect_control(&registry, &q, Duration::from_millis(200), 1);
        assert_eq!(name.as_deref(), Some("C"));
    }

    #[test]
    fn detect_slot() {
        let (registry, dev, q) = setup();
        dev.queue_input("C", 1.0);
        dev.queue_input("A", 1.0);

        let name = detect_control(&registry, &q, Duration::from_millis(200), 2);
        assert_eq!(name.as_deref(), Some("A"));
    }

    #[test]
    fn detect_stops_when_device_removed() {
        let (registry, _dev, q) = setup();
        let start = Instant::now();

        thread::scope(|s| {
            let detect = s.spawn(|| detect_control(&registry, &q, Duration::from_secs(5), 1));
            thread::sleep(Duration::from_millis(50));
            registry.remove_device(&q);
            assert_eq!(detect.join().unwrap(), None);
        });
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn detect_timeout_keeps_binding() {
        let (registry, _dev, q) = setup();
        let mut r = input(&q, "A");

        assert!(!r.detect(&registry, Duration::from_millis(30), 1));
        assert_eq!(r.expression().to_string(), "A");

        let mut missing = input(&DeviceQualifier::default(), "A");
        assert!(!missing.detect(&registry, Duration::from_millis(30), 1));
        assert_eq!(missing.expression().to_string(), "A");
    }
}
