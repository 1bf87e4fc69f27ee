// Copyright 2024 Emupad Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::device::ControlState;

/// Returns -1.0, 0.0 or 1.0 depending on sign of `val`. Unlike `f64::signum`, zero maps to zero.
pub fn sign(val: ControlState) -> ControlState {
    if val > 0.0 {
        1.0
    } else if val < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Converts state to the integer percentage used in ini files.
pub fn to_percent(val: ControlState) -> i64 {
    (val * 100.0).round() as i64
}

/// Parses percentage written by `to_percent`. Fractional values are accepted, anything else
/// yields `None`.
pub fn from_percent(s: &str) -> Option<ControlState> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v / 100.0)
}
