// Copyright 2024 Emupad Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Emupad - controller emulation and input mapping
//! ===============================================
//!
//! Emupad binds elements of a virtual controller (buttons, analog sticks, triggers, rumble) to
//! controls of arbitrary physical devices, stores these bindings in human editable ini files and
//! computes state of the virtual controller on every poll.
//!
//! Main features:
//!
//! - Bindings by name: controls are bound with expressions like `Button A|Space`, devices with
//!   qualifiers like `evdev/0/Xbox Wireless Controller`
//! - Hotplugging: removed devices read as neutral, bindings come back when device reconnects
//! - Dead zone and square stick correction, mixed analog/digital triggers
//! - Profiles and input detection for configuration frontends
//!
//! Example
//! -------
//!
//! ```
//! use emupad::{DeviceRegistry, GcPad, PadStatus, VirtualDevice};
//! use emupad::pad::BUTTON_A;
//! use std::sync::Arc;
//!
//! let keyboard = Arc::new(VirtualDevice::new("virtual", "Keyboard").with_input("X"));
//! let registry = DeviceRegistry::new();
//! registry.add_device(keyboard.clone());
//!
//! let mut pad = GcPad::new(0);
//! pad.load_defaults(&registry);
//!
//! keyboard.set_input("X", 1.0);
//! let mut status = PadStatus::default();
//! pad.get_input(&mut status);
//! assert!(status.is_pressed(BUTTON_A));
//! ```
//!
//! Persistence
//! -----------
//!
//! Each virtual controller is stored in one ini section. Keys are prefixed with group name and
//! values equal to their defaults are omitted:
//!
//! ```text
//! [GCPad1]
//! Device = evdev/0/Xbox Wireless Controller
//! Buttons/A = BTN_SOUTH
//! Main Stick/Dead Zone = 15
//! Main Stick/Up = ABS_Y-
//! Triggers/L/Range = 50
//! ```
//!
//! Backends are not part of this crate. Anything that implements `Device` can be added to a
//! `DeviceRegistry`.

#[macro_use]
extern crate log;
#[cfg(feature = "serde")]
#[macro_use]
extern crate serde;

mod config;
mod emu;
mod error;
mod reference;
mod utils;

pub mod device;
pub mod expr;
pub mod group;
pub mod ini;
pub mod pad;

pub use crate::config::{InputConfig, InputConfigBuilder, CONFIG_DIR_ENV, PROFILE_SECTION};
pub use crate::device::{ControlState, Device, DeviceQualifier, DeviceRegistry, VirtualDevice};
pub use crate::emu::ControllerEmu;
pub use crate::error::Error;
pub use crate::expr::ControlExpression;
pub use crate::group::{Control, ControlGroup, GroupKind, Setting};
pub use crate::ini::{IniFile, IniSection};
pub use crate::pad::{GcPad, PadStatus};
pub use crate::reference::{
    detect_control, CombineMode, ControlReference, ReferenceKind, DEFAULT_DETECT_TIMEOUT,
};
