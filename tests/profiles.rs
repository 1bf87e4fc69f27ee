// Copyright 2024 Emupad Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use emupad::group::DEAD_ZONE;
use emupad::pad::{BUTTON_A, BUTTON_B, TRIGGER_R};
use emupad::{DeviceQualifier, DeviceRegistry, InputConfig, InputConfigBuilder, VirtualDevice};

use std::fs;
use std::path::Path;
use std::sync::Arc;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn gamepad() -> Arc<VirtualDevice> {
    Arc::new(
        VirtualDevice::new("evdev", "Gamepad")
            .with_input("BTN_SOUTH")
            .with_input("BTN_EAST")
            .with_input("BTN_TR2")
            .with_input("ABS_RZ+")
            .with_input("ABS_X+")
            .with_input("ABS_X-")
            .with_output("Strong"),
    )
}

fn build(dir: &Path, registry: Arc<DeviceRegistry>) -> InputConfig {
    InputConfigBuilder::new()
        .config_dir(dir)
        .build(registry)
        .unwrap()
}

const GCPAD1: &str = "\
# Hand edited
[GCPad1]
 Device = evdev/0/Gamepad
Buttons/A = BTN_SOUTH | BTN_EAST
Buttons/B = BTN_EAST
Buttons/B/Device = evdev/1/Gamepad
Main Stick/Right = ABS_X+
Main Stick/Left = ABS_X-
Main Stick/Dead Zone = 20
Triggers/R = BTN_TR2
Triggers/R-Analog = ABS_RZ+
Rumble/Motor = Strong
this line is ignored

[Unrelated]
Key = Value
";

#[test]
fn hand_edited_file() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("GCPadNew.ini"), GCPAD1).unwrap();

    let pad = gamepad();
    let registry = Arc::new(DeviceRegistry::new());
    registry.add_device(pad.clone());

    let config = build(dir.path(), registry);
    config.load_config().unwrap();

    pad.set_input("BTN_EAST", 1.0);
    pad.set_input("ABS_X+", 0.15);
    pad.set_input("ABS_RZ+", 0.5);

    let status = config.pad_status(0);
    assert!(status.is_pressed(BUTTON_A));
    // B points at second gamepad, which is not connected
    assert!(!status.is_pressed(BUTTON_B));
    assert!(!status.is_pressed(TRIGGER_R));
    // Inside dead zone
    assert_eq!(status.stick_x, 0x80);
    assert_eq!(status.trigger_right, 127);

    pad.set_input("ABS_X+", 1.0);
    assert_eq!(config.pad_status(0).stick_x, 255);

    config.rumble(0, true);
    assert_eq!(pad.output("Strong"), 1.0);

    // Saving normalizes the file and keeps unrelated sections
    config.save_config().unwrap();
    let text = fs::read_to_string(config.ini_path()).unwrap();
    assert!(text.contains("Device = evdev/0/Gamepad\n"));
    assert!(text.contains("Buttons/A = BTN_SOUTH|BTN_EAST\n"));
    assert!(text.contains("Main Stick/Dead Zone = 20\n"));
    assert!(text.contains("[Unrelated]\nKey = Value\n"));
    assert!(!text.contains("Hand edited"));
    assert!(!text.contains("[GCPad2]"));
}

#[test]
fn hotplug() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("GCPadNew.ini"), GCPAD1).unwrap();

    let first = gamepad();
    let second = gamepad();
    let registry = Arc::new(DeviceRegistry::new());
    let config = build(dir.path(), registry);
    config.load_config().unwrap();

    first.set_input("BTN_SOUTH", 1.0);
    second.set_input("BTN_EAST", 1.0);
    assert_eq!(config.pad_status(0).button, 0);

    config.refresh_devices(|registry| {
        registry.add_device(first.clone());
        registry.add_device(second.clone());
    });
    let status = config.pad_status(0);
    assert!(status.is_pressed(BUTTON_A | BUTTON_B));

    config.refresh_devices(|registry| {
        registry.remove_device(&DeviceQualifier::new("evdev", 1, "Gamepad"));
    });
    let status = config.pad_status(0);
    assert!(status.is_pressed(BUTTON_A));
    assert!(!status.is_pressed(BUTTON_B));
}

#[test]
fn profile_round_trip() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("GCPadNew.ini"), GCPAD1).unwrap();

    let registry = Arc::new(DeviceRegistry::new());
    registry.add_device(gamepad());
    let config = build(dir.path(), registry);
    config.load_config().unwrap();

    config.save_profile(0, "Gamepad").unwrap();
    let profile = fs::read_to_string(config.profile_path("Gamepad").unwrap()).unwrap();
    assert!(profile.starts_with("\n[Profile]\n"));

    config.load_profile(3, "Gamepad").unwrap();
    let pads = config.pads();
    let (a, b) = (pads[0].emu(), pads[3].emu());
    assert_eq!(a.default_device, b.default_device);
    assert_eq!(
        b.group("Main Stick").unwrap().setting(DEAD_ZONE).unwrap().value,
        0.2
    );
    for (ga, gb) in a.groups().iter().zip(b.groups()) {
        for (ca, cb) in ga.controls().iter().zip(gb.controls()) {
            assert_eq!(ca.reference.expression(), cb.reference.expression());
            assert_eq!(ca.reference.device, cb.reference.device);
            assert_eq!(ca.reference.range, cb.reference.range);
        }
    }
    drop(pads);

    assert_eq!(config.profiles().unwrap(), ["Gamepad"]);
}
