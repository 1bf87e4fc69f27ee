// Copyright 2024 Emupad Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Groups of virtual controls and algorithms that turn their bindings into controller state.

use crate::device::ControlState;
use crate::reference::ControlReference;
use crate::utils;

/// Name of threshold setting of `Buttons` and `MixedTriggers` groups.
pub const THRESHOLD: &str = "Threshold";
/// Name of dead zone setting of `AnalogStick` groups.
pub const DEAD_ZONE: &str = "Dead Zone";
/// Name of square stick setting of `AnalogStick` groups.
pub const SQUARE_STICK: &str = "Square Stick";

const BUTTONS_THRESHOLD: ControlState = 0.5;
const TRIGGERS_THRESHOLD: ControlState = 0.9;

/// Named tunable value of a group.
#[derive(Clone, Debug, PartialEq)]
pub struct Setting {
    name: String,
    pub value: ControlState,
    default: ControlState,
}

impl Setting {
    pub fn new<S: Into<String>>(name: S, default: ControlState) -> Self {
        Setting {
            name: name.into(),
            value: default,
            default,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_value(&self) -> ControlState {
        self.default
    }

    pub fn reset(&mut self) {
        self.value = self.default;
    }
}

/// Named virtual control together with its binding.
#[derive(Clone, Debug)]
pub struct Control {
    name: String,
    pub reference: ControlReference,
}

impl Control {
    /// Creates control driven by physical inputs.
    pub fn input<S: Into<String>>(name: S) -> Self {
        Control {
            name: name.into(),
            reference: ControlReference::input(),
        }
    }

    /// Creates control that drives physical outputs.
    pub fn output<S: Into<String>>(name: S) -> Self {
        Control {
            name: name.into(),
            reference: ControlReference::output(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shorthand for `self.reference.state()`.
    pub fn state(&self) -> ControlState {
        self.reference.state()
    }
}

/// Directions of analog stick.
#[derive(Clone, Debug)]
pub struct StickControls {
    pub up: Control,
    pub down: Control,
    pub left: Control,
    pub right: Control,
    /// When active, stick snaps to directions with magnitude equal to modifier state.
    pub modifier: Control,
}

/// One trigger with digital click and analog travel.
#[derive(Clone, Debug)]
pub struct TriggerControls {
    pub digital: Control,
    pub analog: Control,
}

/// Variant of `ControlGroup` with controls in the shape its state algorithm expects.
#[derive(Clone, Debug)]
pub enum GroupKind {
    Buttons(Vec<Control>),
    AnalogStick(StickControls),
    MixedTriggers(Vec<TriggerControls>),
    Other(Vec<Control>),
}

/// Named group of controls and settings.
#[derive(Clone, Debug)]
pub struct ControlGroup {
    name: String,
    settings: Vec<Setting>,
    kind: GroupKind,
}

impl ControlGroup {
    /// Group of digital buttons with `Threshold` setting.
    pub fn buttons<S: Into<String>>(name: S, buttons: &[&str]) -> Self {
        ControlGroup {
            name: name.into(),
            settings: vec![Setting::new(THRESHOLD, BUTTONS_THRESHOLD)],
            kind: GroupKind::Buttons(buttons.iter().map(|&b| Control::input(b)).collect()),
        }
    }

    /// Analog stick with `Up`, `Down`, `Left`, `Right` and `Modifier` controls.
    pub fn analog_stick<S: Into<String>>(name: S) -> Self {
        ControlGroup {
            name: name.into(),
            settings: vec![Setting::new(DEAD_ZONE, 0.0), Setting::new(SQUARE_STICK, 0.0)],
            kind: GroupKind::AnalogStick(StickControls {
                up: Control::input("Up"),
                down: Control::input("Down"),
                left: Control::input("Left"),
                right: Control::input("Right"),
                modifier: Control::input("Modifier"),
            }),
        }
    }

    /// Triggers given as `(digital, analog)` control names, with `Threshold` setting.
    pub fn mixed_triggers<S: Into<String>>(name: S, triggers: &[(&str, &str)]) -> Self {
        ControlGroup {
            name: name.into(),
            settings: vec![Setting::new(THRESHOLD, TRIGGERS_THRESHOLD)],
            kind: GroupKind::MixedTriggers(
                triggers
                    .iter()
                    .map(|&(d, a)| TriggerControls {
                        digital: Control::input(d),
                        analog: Control::input(a),
                    })
                    .collect(),
            ),
        }
    }

    /// Group without built-in state algorithm.
    pub fn other<S: Into<String>>(name: S, controls: Vec<Control>, settings: Vec<Setting>) -> Self {
        ControlGroup {
            name: name.into(),
            settings,
            kind: GroupKind::Other(controls),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &GroupKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut GroupKind {
        &mut self.kind
    }

    /// All controls in declaration order. Triggers list all digital controls first, then all
    /// analog ones.
    pub fn controls(&self) -> Vec<&Control> {
        match self.kind {
            GroupKind::Buttons(ref c) | GroupKind::Other(ref c) => c.iter().collect(),
            GroupKind::AnalogStick(ref s) => vec![&s.up, &s.down, &s.left, &s.right, &s.modifier],
            GroupKind::MixedTriggers(ref t) => t
                .iter()
                .map(|t| &t.digital)
                .chain(t.iter().map(|t| &t.analog))
                .collect(),
        }
    }

    /// Mutable version of `controls()`, in the same order.
    pub fn controls_mut(&mut self) -> Vec<&mut Control> {
        match self.kind {
            GroupKind::Buttons(ref mut c) | GroupKind::Other(ref mut c) => c.iter_mut().collect(),
            GroupKind::AnalogStick(ref mut s) => vec![
                &mut s.up,
                &mut s.down,
                &mut s.left,
                &mut s.right,
                &mut s.modifier,
            ],
            GroupKind::MixedTriggers(ref mut t) => {
                let mut digital = Vec::with_capacity(t.len() * 2);
                let mut analog = Vec::with_capacity(t.len());
                for t in t.iter_mut() {
                    digital.push(&mut t.digital);
                    analog.push(&mut t.analog);
                }
                digital.extend(analog);
                digital
            }
        }
    }

    pub fn control(&self, name: &str) -> Option<&Control> {
        self.controls().into_iter().find(|c| c.name == name)
    }

    pub fn control_mut(&mut self, name: &str) -> Option<&mut Control> {
        self.controls_mut().into_iter().find(|c| c.name == name)
    }

    pub fn settings(&self) -> &[Setting] {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut [Setting] {
        &mut self.settings
    }

    pub fn setting(&self, name: &str) -> Option<&Setting> {
        self.settings.iter().find(|s| s.name == name)
    }

    pub fn setting_mut(&mut self, name: &str) -> Option<&mut Setting> {
        self.settings.iter_mut().find(|s| s.name == name)
    }

    fn setting_value(&self, name: &str) -> ControlState {
        self.setting(name).map(|s| s.value).unwrap_or(0.0)
    }

    /// ORs `masks[i]` into `buttons` for every button `i` whose state is strictly above
    /// threshold. No-op for other group kinds.
    pub fn get_buttons(&self, buttons: &mut u16, masks: &[u16]) {
        let controls = match self.kind {
            GroupKind::Buttons(ref c) => c,
            _ => return,
        };

        let threshold = self.setting_value(THRESHOLD);
        for (control, &mask) in controls.iter().zip(masks) {
            if control.state() > threshold {
                *buttons |= mask;
            }
        }
    }

    /// Returns `(x, y)` stick position as `round(axis * range + base)`. Non-stick groups are
    /// always centered.
    pub fn get_stick(
        &self,
        base: ControlState,
        range: ControlState,
    ) -> (ControlState, ControlState) {
        let stick = match self.kind {
            GroupKind::AnalogStick(ref s) => s,
            _ => return (base.round(), base.round()),
        };

        let (x, y) = stick_position(
            stick.right.state() - stick.left.state(),
            stick.up.state() - stick.down.state(),
            stick.modifier.state(),
            self.setting_value(DEAD_ZONE),
            self.setting_value(SQUARE_STICK),
        );

        ((x * range + base).round(), (y * range + base).round())
    }

    /// For every trigger `i`, if digital control is above threshold sets `analog[i]` to `range`
    /// and ORs `masks[i]` into `digital`. Otherwise `analog[i]` is the analog control state
    /// scaled by `range`.
    pub fn get_triggers(
        &self,
        digital: &mut u16,
        masks: &[u16],
        analog: &mut [ControlState],
        range: ControlState,
    ) {
        let triggers = match self.kind {
            GroupKind::MixedTriggers(ref t) => t,
            _ => return,
        };

        let threshold = self.setting_value(THRESHOLD);
        for ((trigger, &mask), out) in triggers.iter().zip(masks).zip(analog.iter_mut()) {
            if trigger.digital.state() > threshold {
                *out = range;
                *digital |= mask;
            } else {
                *out = trigger.analog.state() * range;
            }
        }
    }

    /// Sets every output control of the group to `state`.
    pub fn set_outputs(&self, state: ControlState) {
        for control in self.controls() {
            control.reference.set_state(state);
        }
    }
}

/// Computes stick position from raw axes in `[-1, 1]`.
///
/// Active `modifier` turns the stick digital: every axis outside dead zone snaps to
/// `±modifier`. Otherwise dead zone is removed and the response is blended toward a square
/// envelope by `square`.
pub fn stick_position(
    xx: ControlState,
    yy: ControlState,
    modifier: ControlState,
    deadzone: ControlState,
    square: ControlState,
) -> (ControlState, ControlState) {
    if modifier != 0.0 {
        let snap = |axis: ControlState| {
            if axis.abs() > deadzone {
                utils::sign(axis) * modifier
            } else {
                0.0
            }
        };
        return (snap(xx), snap(yy));
    }

    if deadzone <= 0.0 && square <= 0.0 {
        return (xx, yy);
    }

    if (xx == 0.0 && yy == 0.0) || deadzone >= 1.0 {
        return (0.0, 0.0);
    }

    let ang = yy.atan2(xx);
    let (ang_sin, ang_cos) = ang.sin_cos();
    let square_full = if ang_sin == 0.0 {
        1.0 / ang_cos.abs()
    } else if ang_cos == 0.0 {
        1.0 / ang_sin.abs()
    } else {
        (1.0 / ang_sin.abs()).min(1.0 / ang_cos.abs())
    };
    let stick_full = 1.0 + (square_full - 1.0) * square;

    let mut dist = (xx * xx + yy * yy).sqrt();
    dist = (dist - deadzone * stick_full).max(0.0) / (1.0 - deadzone);

    let amt = dist / stick_full;
    dist -= (square_full - 1.0) * amt * square;

    (
        (ang_cos * dist).max(-1.0).min(1.0),
        (ang_sin * dist).max(-1.0).min(1.0),
    )
}
