// Copyright 2024 Emupad Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! GameCube style pad.

use crate::device::{ControlState, DeviceRegistry};
use crate::emu::ControllerEmu;
use crate::group::{Control, ControlGroup, GroupKind};

pub const BUTTON_LEFT: u16 = 0x0001;
pub const BUTTON_RIGHT: u16 = 0x0002;
pub const BUTTON_DOWN: u16 = 0x0004;
pub const BUTTON_UP: u16 = 0x0008;
pub const TRIGGER_Z: u16 = 0x0010;
pub const TRIGGER_R: u16 = 0x0020;
pub const TRIGGER_L: u16 = 0x0040;
pub const BUTTON_A: u16 = 0x0100;
pub const BUTTON_B: u16 = 0x0200;
pub const BUTTON_X: u16 = 0x0400;
pub const BUTTON_Y: u16 = 0x0800;
pub const BUTTON_START: u16 = 0x1000;

const BUTTON_NAMES: [&str; 6] = ["A", "B", "X", "Y", "Z", "Start"];
const BUTTON_MASKS: [u16; 6] = [
    BUTTON_A,
    BUTTON_B,
    BUTTON_X,
    BUTTON_Y,
    TRIGGER_Z,
    BUTTON_START,
];
const DPAD_NAMES: [&str; 4] = ["Up", "Down", "Left", "Right"];
const DPAD_MASKS: [u16; 4] = [BUTTON_UP, BUTTON_DOWN, BUTTON_LEFT, BUTTON_RIGHT];
const TRIGGER_NAMES: [(&str, &str); 2] = [("L", "L-Analog"), ("R", "R-Analog")];
const TRIGGER_MASKS: [u16; 2] = [TRIGGER_L, TRIGGER_R];

pub const STICK_CENTER: u8 = 0x80;
const STICK_RANGE: ControlState = 127.0;
const TRIGGER_RANGE: ControlState = 255.0;

// Group indices, in declaration order
const BUTTONS: usize = 0;
const MAIN_STICK: usize = 1;
const C_STICK: usize = 2;
const TRIGGERS: usize = 3;
const DPAD: usize = 4;
const RUMBLE: usize = 5;

/// Name of rumble output control.
pub const MOTOR: &str = "Motor";

/// State of the pad reported to emulated console on every poll.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PadStatus {
    /// Bitwise OR of `BUTTON_*` and `TRIGGER_*` constants.
    pub button: u16,
    pub stick_x: u8,
    pub stick_y: u8,
    pub substick_x: u8,
    pub substick_y: u8,
    pub trigger_left: u8,
    pub trigger_right: u8,
}

impl PadStatus {
    /// Returns `true` if all bits of `mask` are set.
    pub fn is_pressed(&self, mask: u16) -> bool {
        self.button & mask == mask
    }
}

impl Default for PadStatus {
    /// Nothing pressed, both sticks centered.
    fn default() -> Self {
        PadStatus {
            button: 0,
            stick_x: STICK_CENTER,
            stick_y: STICK_CENTER,
            substick_x: STICK_CENTER,
            substick_y: STICK_CENTER,
            trigger_left: 0,
            trigger_right: 0,
        }
    }
}

/// Virtual GameCube controller.
///
/// Groups: `Buttons`, `Main Stick`, `C-Stick`, `Triggers`, `D-Pad` and `Rumble`.
#[derive(Clone, Debug)]
pub struct GcPad {
    emu: ControllerEmu,
}

impl GcPad {
    /// Creates unbound pad for controller port `port`, counting from 0.
    pub fn new(port: usize) -> Self {
        let emu = ControllerEmu::new(format!("GCPad{}", port + 1))
            .with_group(ControlGroup::buttons("Buttons", &BUTTON_NAMES))
            .with_group(ControlGroup::analog_stick("Main Stick"))
            .with_group(ControlGroup::analog_stick("C-Stick"))
            .with_group(ControlGroup::mixed_triggers("Triggers", &TRIGGER_NAMES))
            .with_group(ControlGroup::buttons("D-Pad", &DPAD_NAMES))
            .with_group(ControlGroup::other(
                "Rumble",
                vec![Control::output(MOTOR)],
                Vec::new(),
            ));

        GcPad { emu }
    }

    /// Name of ini section this pad is stored in.
    pub fn name(&self) -> &str {
        self.emu.name()
    }

    pub fn emu(&self) -> &ControllerEmu {
        &self.emu
    }

    pub fn emu_mut(&mut self) -> &mut ControllerEmu {
        &mut self.emu
    }

    /// Computes current pad state.
    pub fn get_input(&self, status: &mut PadStatus) {
        let groups = self.emu.groups();

        groups[BUTTONS].get_buttons(&mut status.button, &BUTTON_MASKS);
        groups[DPAD].get_buttons(&mut status.button, &DPAD_MASKS);

        let base = ControlState::from(STICK_CENTER);
        let (x, y) = groups[MAIN_STICK].get_stick(base, STICK_RANGE);
        status.stick_x = to_u8(x);
        status.stick_y = to_u8(y);
        let (x, y) = groups[C_STICK].get_stick(base, STICK_RANGE);
        status.substick_x = to_u8(x);
        status.substick_y = to_u8(y);

        let mut analog = [0.0; 2];
        groups[TRIGGERS].get_triggers(
            &mut status.button,
            &TRIGGER_MASKS,
            &mut analog,
            TRIGGER_RANGE,
        );
        status.trigger_left = to_u8(analog[0]);
        status.trigger_right = to_u8(analog[1]);
    }

    /// Switches rumble motor on or off.
    pub fn set_output(&self, on: bool) {
        self.emu.groups()[RUMBLE].set_outputs(if on { 1.0 } else { 0.0 });
    }

    /// Binds pad to keyboard style defaults on the first device in `registry` and resolves the
    /// bindings. With empty registry pad ends up unbound.
    pub fn load_defaults(&mut self, registry: &DeviceRegistry) {
        self.emu.clear_all();

        let device = match registry.qualifiers().into_iter().next() {
            Some(device) => device,
            None => {
                debug!("No devices, {} left unbound", self.name());
                return;
            }
        };
        self.emu.set_default_device(device);

        let groups = self.emu.groups_mut();
        bind_all(&mut groups[BUTTONS], &["X", "Z", "C", "S", "D", "Return"]);
        bind_all(&mut groups[DPAD], &["T", "G", "F", "H"]);

        if let GroupKind::AnalogStick(ref mut s) = *groups[MAIN_STICK].kind_mut() {
            bind(&mut s.up, "Up");
            bind(&mut s.down, "Down");
            bind(&mut s.left, "Left");
            bind(&mut s.right, "Right");
            bind(&mut s.modifier, "Shift_L");
        }
        if let GroupKind::AnalogStick(ref mut s) = *groups[C_STICK].kind_mut() {
            bind(&mut s.up, "I");
            bind(&mut s.down, "K");
            bind(&mut s.left, "J");
            bind(&mut s.right, "L");
        }
        if let GroupKind::MixedTriggers(ref mut t) = *groups[TRIGGERS].kind_mut() {
            bind(&mut t[0].digital, "Q");
            bind(&mut t[1].digital, "W");
        }

        self.emu.update_references(registry);
        info!("Loaded default bindings for {}", self.name());
    }
}

fn bind(control: &mut Control, name: &str) {
    control.reference.set_expression(name.parse().unwrap_or_default());
}

fn bind_all(group: &mut ControlGroup, names: &[&str]) {
    for (control, name) in group.controls_mut().into_iter().zip(names) {
        bind(control, name);
    }
}

fn to_u8(val: ControlState) -> u8 {
    val.max(0.0).min(255.0) as u8
}
