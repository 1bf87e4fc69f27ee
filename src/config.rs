// Copyright 2024 Emupad Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Set of virtual pads together with their configuration file and profiles.

use crate::device::{DeviceQualifier, DeviceRegistry};
use crate::error::Error;
use crate::expr::ControlExpression;
use crate::group::Control;
use crate::ini::IniFile;
use crate::pad::{GcPad, PadStatus};
use crate::reference;

use parking_lot::{Mutex, MutexGuard};

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Environment variable that overrides configuration directory.
pub const CONFIG_DIR_ENV: &str = "EMUPAD_CONFIG_DIR";
/// Section name used in profile files.
pub const PROFILE_SECTION: &str = "Profile";

const DEFAULT_INI_NAME: &str = "GCPadNew.ini";
const DEFAULT_PROFILE_DIR: &str = "GCPad";
const DEFAULT_SLOTS: usize = 4;
const PROFILE_EXT: &str = "ini";

/// Builder for `InputConfig`.
///
/// ```
/// use emupad::{DeviceRegistry, InputConfigBuilder};
/// use std::sync::Arc;
///
/// let dir = std::env::temp_dir().join("emupad-doc");
/// let config = InputConfigBuilder::new()
///     .slots(2)
///     .config_dir(&dir)
///     .build(Arc::new(DeviceRegistry::new()))
///     .unwrap();
///
/// assert_eq!(config.slots(), 2);
/// assert_eq!(config.ini_path(), dir.join("GCPadNew.ini"));
/// ```
#[derive(Clone, Debug)]
pub struct InputConfigBuilder {
    ini_name: String,
    profile_dir: String,
    slots: usize,
    config_dir: Option<PathBuf>,
}

impl InputConfigBuilder {
    pub fn new() -> Self {
        InputConfigBuilder {
            ini_name: DEFAULT_INI_NAME.to_owned(),
            profile_dir: DEFAULT_PROFILE_DIR.to_owned(),
            slots: DEFAULT_SLOTS,
            config_dir: None,
        }
    }

    /// Name of file that stores all slots. Default is `GCPadNew.ini`.
    pub fn ini_name<S: Into<String>>(mut self, name: S) -> Self {
        self.ini_name = name.into();
        self
    }

    /// Directory under `Profiles/` where profiles are stored. Default is `GCPad`.
    pub fn profile_dir<S: Into<String>>(mut self, dir: S) -> Self {
        self.profile_dir = dir.into();
        self
    }

    /// Number of controller slots. Default is 4.
    pub fn slots(mut self, slots: usize) -> Self {
        self.slots = slots;
        self
    }

    /// Sets configuration directory. If not set, `$EMUPAD_CONFIG_DIR` is used, then
    /// `emupad` directory in user's configuration directory.
    pub fn config_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.config_dir = Some(dir.as_ref().to_owned());
        self
    }

    /// Creates `InputConfig` with unbound pads. Call `load_config()` to read bindings.
    pub fn build(self, registry: Arc<DeviceRegistry>) -> Result<InputConfig, Error> {
        let config_dir = match self.config_dir {
            Some(dir) => dir,
            None => default_config_dir()?,
        };
        debug!("Using configuration directory {}", config_dir.display());

        Ok(InputConfig {
            registry,
            pads: Mutex::new((0..self.slots).map(GcPad::new).collect()),
            config_dir,
            ini_name: self.ini_name,
            profile_dir: self.profile_dir,
        })
    }
}

impl Default for InputConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn default_config_dir() -> Result<PathBuf, Error> {
    if let Some(dir) = env::var_os(CONFIG_DIR_ENV) {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }

    dirs::config_dir()
        .map(|dir| dir.join("emupad"))
        .ok_or(Error::NoConfigDir)
}

fn find_control<'a>(
    pads: &'a [GcPad],
    port: usize,
    group: &str,
    control: &str,
) -> Result<&'a Control, Error> {
    pads.get(port)
        .ok_or(Error::InvalidPort(port))?
        .emu()
        .control(group, control)
        .ok_or_else(|| Error::unknown_control(group, control))
}

/// Virtual pads, the devices they are bound to and their persistence.
///
/// Pads are guarded by a single lock. Emulation thread reads state with `pad_status()`, which
/// never waits for the lock. If UI holds it, the poll reports neutral state for that frame.
#[derive(Debug)]
pub struct InputConfig {
    registry: Arc<DeviceRegistry>,
    pads: Mutex<Vec<GcPad>>,
    config_dir: PathBuf,
    ini_name: String,
    profile_dir: String,
}

impl InputConfig {
    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.registry
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn slots(&self) -> usize {
        self.pads.lock().len()
    }

    pub fn ini_path(&self) -> PathBuf {
        self.config_dir.join(&self.ini_name)
    }

    /// Directory that holds profiles.
    pub fn profiles_dir(&self) -> PathBuf {
        self.config_dir.join("Profiles").join(&self.profile_dir)
    }

    /// Returns path of profile `name`. Fails if name is empty or could escape profile directory.
    pub fn profile_path(&self, name: &str) -> Result<PathBuf, Error> {
        let valid = !name.trim().is_empty()
            && name != "."
            && name != ".."
            && !name.contains(|c: char| c == '/' || c == '\\' || c == '\0');
        if !valid {
            return Err(Error::InvalidProfileName(name.to_owned()));
        }

        Ok(self
            .profiles_dir()
            .join(format!("{}.{}", name, PROFILE_EXT)))
    }

    /// Locks pads for editing. Emulation polls report neutral state while guard is alive, so
    /// keep it short and never hold it during `detect()`.
    pub fn pads(&self) -> MutexGuard<'_, Vec<GcPad>> {
        self.pads.lock()
    }

    /// Loads bindings of all slots from ini file and resolves them. If file does not exist,
    /// first slot gets default bindings and the rest is cleared.
    pub fn load_config(&self) -> Result<(), Error> {
        let path = self.ini_path();
        let ini = match IniFile::load(&path) {
            Ok(ini) => Some(ini),
            Err(Error::Io { ref source, .. }) if source.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e),
        };

        let mut pads = self.pads.lock();
        match ini {
            Some(ini) => {
                for pad in pads.iter_mut() {
                    match ini.section(pad.name()) {
                        Some(section) => pad.emu_mut().load_config(section),
                        None => pad.emu_mut().clear_all(),
                    }
                    pad.emu_mut().update_references(&self.registry);
                }
                info!("Loaded controller configuration from {}", path.display());
            }
            None => {
                for (port, pad) in pads.iter_mut().enumerate() {
                    if port == 0 {
                        pad.load_defaults(&self.registry);
                    } else {
                        pad.emu_mut().clear_all();
                    }
                }
                info!("{} not found, using defaults", path.display());
            }
        }

        Ok(())
    }

    /// Writes all slots to ini file. Sections not owned by any slot are preserved.
    pub fn save_config(&self) -> Result<(), Error> {
        let path = self.ini_path();
        let mut ini = if path.exists() {
            IniFile::load(&path)?
        } else {
            IniFile::new()
        };

        for pad in self.pads.lock().iter() {
            pad.emu().save_config(ini.get_or_create_section(pad.name()));
        }
        ini.clean();
        ini.save(&path)?;
        info!("Saved controller configuration to {}", path.display());

        Ok(())
    }

    /// Current state of pad at `port`. Returns neutral state if pads are locked by someone
    /// else or port does not exist.
    pub fn pad_status(&self, port: usize) -> PadStatus {
        let mut status = PadStatus::default();

        match self.pads.try_lock() {
            Some(pads) => match pads.get(port) {
                Some(pad) => pad.get_input(&mut status),
                None => debug!("Polled nonexistent controller slot {}", port),
            },
            None => trace!("Pads are locked, skipping poll of slot {}", port),
        }

        status
    }

    /// Switches rumble of pad at `port`. Dropped if pads are locked.
    pub fn rumble(&self, port: usize, on: bool) {
        if let Some(pads) = self.pads.try_lock() {
            if let Some(pad) = pads.get(port) {
                pad.set_output(on);
                self.registry.update_output();
            }
        }
    }

    /// Re-resolves bindings of all pads.
    pub fn update_references(&self) {
        for pad in self.pads.lock().iter_mut() {
            pad.emu_mut().update_references(&self.registry);
        }
    }

    /// Runs `f` to add or remove devices while pads are locked, then re-resolves bindings.
    pub fn refresh_devices<F: FnOnce(&DeviceRegistry)>(&self, f: F) {
        let mut pads = self.pads.lock();
        f(&self.registry);
        for pad in pads.iter_mut() {
            pad.emu_mut().update_references(&self.registry);
        }
        debug!("Devices refreshed, {} present", self.registry.len());
    }

    /// Waits up to `timeout` for an input of the device `group/control` of pad `port` is bound
    /// to, and binds control to it. `slot` picks Nth pressed input, counting from 1.
    ///
    /// Pads are unlocked while waiting. Returns `Ok(None)` on timeout, leaving binding intact.
    /// Output controls are pulsed for `timeout` with `test_output()` and also return `Ok(None)`.
    pub fn detect(
        &self,
        port: usize,
        group: &str,
        control: &str,
        timeout: Duration,
        slot: usize,
    ) -> Result<Option<String>, Error> {
        let device = {
            let pads = self.pads.lock();
            let reference = &find_control(&pads, port, group, control)?.reference;
            if !reference.is_input() {
                drop(pads);
                self.test_output(port, group, control, timeout)?;
                return Ok(None);
            }
            reference.device.clone()
        };

        let name = match reference::detect_control(&self.registry, &device, timeout, slot) {
            Some(name) => name,
            None => return Ok(None),
        };

        let mut pads = self.pads.lock();
        let reference = &mut pads
            .get_mut(port)
            .and_then(|pad| pad.emu_mut().control_mut(group, control))
            .ok_or_else(|| Error::unknown_control(group, control))?
            .reference;
        reference.set_expression(ControlExpression::single(name.as_str()));
        reference.update_reference(&self.registry);
        debug!("Bound {}/{} of slot {} to {:?}", group, control, port, name);

        Ok(Some(name))
    }

    /// Drives outputs bound to `group/control` of pad `port` to full for `duration`, then back
    /// to 0. Pads are unlocked while waiting. Returns `Ok(false)` if control is an input or its
    /// device is not present.
    pub fn test_output(
        &self,
        port: usize,
        group: &str,
        control: &str,
        duration: Duration,
    ) -> Result<bool, Error> {
        let reference = find_control(&self.pads.lock(), port, group, control)?
            .reference
            .clone();

        Ok(reference.test_output(&self.registry, duration))
    }

    /// Sets default device of pad `port` and points controls that followed the old default at
    /// it.
    pub fn set_default_device(&self, port: usize, device: DeviceQualifier) -> Result<(), Error> {
        let mut pads = self.pads.lock();
        let emu = pads.get_mut(port).ok_or(Error::InvalidPort(port))?.emu_mut();
        emu.set_default_device(device);
        emu.update_references(&self.registry);

        Ok(())
    }

    /// Saves configuration of pad `port` as profile `name`, replacing existing one.
    pub fn save_profile(&self, port: usize, name: &str) -> Result<(), Error> {
        let path = self.profile_path(name)?;
        let mut ini = IniFile::new();
        {
            let pads = self.pads.lock();
            let pad = pads.get(port).ok_or(Error::InvalidPort(port))?;
            pad.emu().save_config(ini.get_or_create_section(PROFILE_SECTION));
        }
        ini.clean();
        ini.save(&path)?;
        info!("Saved profile {:?}", name);

        Ok(())
    }

    /// Replaces configuration of pad `port` with profile `name`.
    pub fn load_profile(&self, port: usize, name: &str) -> Result<(), Error> {
        let path = self.profile_path(name)?;
        if port >= self.slots() {
            return Err(Error::InvalidPort(port));
        }
        let ini = match IniFile::load(&path) {
            Ok(ini) => ini,
            Err(Error::Io { ref source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                return Err(Error::ProfileNotFound(name.to_owned()))
            }
            Err(e) => return Err(e),
        };

        let mut pads = self.pads.lock();
        let emu = pads.get_mut(port).ok_or(Error::InvalidPort(port))?.emu_mut();
        match ini.section(PROFILE_SECTION) {
            Some(section) => emu.load_config(section),
            None => emu.clear_all(),
        }
        emu.update_references(&self.registry);
        info!("Loaded profile {:?} into slot {}", name, port);

        Ok(())
    }

    pub fn delete_profile(&self, name: &str) -> Result<(), Error> {
        let path = self.profile_path(name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("Deleted profile {:?}", name);
                Ok(())
            }
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => {
                Err(Error::ProfileNotFound(name.to_owned()))
            }
            Err(e) => Err(Error::io(&path, e)),
        }
    }

    /// Names of saved profiles, sorted.
    pub fn profiles(&self) -> Result<Vec<String>, Error> {
        let dir = self.profiles_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(&dir, e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| Error::io(&dir, e))?.path();
            if path.is_file() && path.extension().map_or(false, |ext| ext == PROFILE_EXT) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_owned());
                }
            }
        }
        names.sort();

        Ok(names)
    }
}
