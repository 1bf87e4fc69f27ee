// Copyright 2024 Emupad Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Physical devices as seen by the mapping engine.
//!
//! Backends (evdev, XInput, keyboard, …) are not part of this crate. Anything that can list
//! named inputs and outputs can be registered in a `DeviceRegistry` by implementing `Device`.
//! `VirtualDevice` is an in-memory implementation useful for tests and for headless frontends.

mod qualifier;
mod registry;
mod virtual_device;

pub use self::qualifier::DeviceQualifier;
pub use self::registry::DeviceRegistry;
pub use self::virtual_device::VirtualDevice;

use std::fmt::Debug;

/// Scalar state of a single control. Inputs report values in `[0, 1]`, outputs accept values
/// in the same range.
pub type ControlState = f64;

/// Capability contract of one physical device.
///
/// Controls are addressed by index, `0..input_count()` for inputs and `0..output_count()` for
/// outputs. Out of range indices must be tolerated: reading returns 0 and writing is no-op.
/// All methods take `&self`, implementations are expected to use interior mutability because
/// devices are shared between the emulation thread and UI.
pub trait Device: Send + Sync + Debug {
    /// Name of the backend that created this device, for example `"evdev"`.
    fn source(&self) -> &str;

    /// Human readable device name. Not unique.
    fn name(&self) -> &str;

    fn input_count(&self) -> usize;

    fn input_name(&self, idx: usize) -> Option<&str>;

    /// Returns current state of input, in `[0, 1]`.
    fn input_state(&self, idx: usize) -> ControlState;

    fn output_count(&self) -> usize;

    fn output_name(&self, idx: usize) -> Option<&str>;

    fn set_output_state(&self, idx: usize, state: ControlState);

    /// Refreshes cached input state from hardware. Returns `false` if device is gone.
    ///
    /// `DeviceRegistry` never calls this from two threads at once.
    fn update_input(&self) -> bool {
        true
    }

    /// Flushes output state to hardware. Returns `false` if device is gone.
    fn update_output(&self) -> bool {
        true
    }

    /// Returns index of input named `name`.
    fn find_input(&self, name: &str) -> Option<usize> {
        (0..self.input_count()).find(|&idx| self.input_name(idx) == Some(name))
    }

    /// Returns index of output named `name`.
    fn find_output(&self, name: &str) -> Option<usize> {
        (0..self.output_count()).find(|&idx| self.output_name(idx) == Some(name))
    }

    /// Names of all inputs, in index order.
    fn input_names(&self) -> Vec<&str> {
        (0..self.input_count())
            .filter_map(|idx| self.input_name(idx))
            .collect()
    }

    /// Names of all outputs, in index order.
    fn output_names(&self) -> Vec<&str> {
        (0..self.output_count())
            .filter_map(|idx| self.output_name(idx))
            .collect()
    }
}
