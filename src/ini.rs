// Copyright 2024 Emupad Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Minimal ini files.
//!
//! Sections and keys are kept sorted, so rendering a file is deterministic. Values are plain
//! strings, typed access goes through `FromStr`/`ToString`. Parsing never fails: lines that do
//! not look like a section header, comment or `key = value` pair are skipped.
//!
//! ```
//! use emupad::IniFile;
//!
//! let mut ini = IniFile::new();
//! ini.get_or_create_section("GCPad1").set("Buttons/A", "X", "");
//! ini.get_or_create_section("GCPad1").set("Buttons/Threshold", "50", "50");
//!
//! let text = ini.to_string();
//! assert_eq!(IniFile::parse(&text), ini);
//! assert_eq!(ini.section("GCPad1").unwrap().get("Buttons/Threshold", "50"), "50");
//! ```

use std::collections::btree_map::{self, BTreeMap};
use std::fmt::{self, Display};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::Error;

const TRIM: &[char] = &['\t', '\r', ' '];
const SECTION_TRIM: &[char] = &[']', '[', '\t', '\r', ' '];

/// Mapping from key to value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IniSection {
    values: BTreeMap<String, String>,
}

impl IniSection {
    pub fn new() -> Self {
        IniSection {
            values: BTreeMap::new(),
        }
    }

    /// Stores `val` under `key` if it differs from `def`, otherwise removes `key`.
    ///
    /// Keys and values are normalized the way the parser reads them back: line breaks become
    /// spaces and surrounding tabs and spaces are trimmed. Keys that contain `=` or start with
    /// `[`, `#` or `;` can not be written to a file and are ignored.
    pub fn set<V: Into<String>>(&mut self, key: &str, val: V, def: &str) {
        let key = normalize(key);
        if !is_valid_key(&key) {
            warn!("Ignoring invalid ini key {:?}", key);
            return;
        }

        let val: String = val.into();
        let val = normalize(&val);
        if val == normalize(def) {
            self.values.remove(&key);
        } else {
            self.values.insert(key, val);
        }
    }

    /// Typed version of `set`. Values are compared after conversion to string.
    pub fn set_value<T: ToString>(&mut self, key: &str, val: T, def: T) {
        self.set(key, val.to_string(), &def.to_string());
    }

    /// Returns stored, non-empty value of `key` or `def`.
    pub fn get<'a>(&'a self, key: &str, def: &'a str) -> &'a str {
        self.lookup(key).unwrap_or(def)
    }

    /// Returns parsed value of `key`. Falls back to `def` when key is missing, empty or can not
    /// be parsed.
    pub fn get_value<T: FromStr>(&self, key: &str, def: T) -> T {
        self.lookup(key)
            .and_then(|val| val.parse().ok())
            .unwrap_or(def)
    }

    /// Returns stored, non-empty value of `key`.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.values
            .get(&normalize(key))
            .map(String::as_str)
            .filter(|val| !val.is_empty())
    }

    pub fn exists(&self, key: &str) -> bool {
        self.values.contains_key(&normalize(key))
    }

    pub fn delete(&mut self, key: &str) -> Option<String> {
        self.values.remove(&normalize(key))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> IniSectionIter<'_> {
        IniSectionIter(self.values.iter())
    }

    /// Stores value without elision. Used by the parser.
    fn insert(&mut self, key: &str, val: &str) {
        self.values.insert(key.to_owned(), val.to_owned());
    }

    fn clean(&mut self) {
        self.values.retain(|_, val| !val.trim_matches(TRIM).is_empty());
    }
}

fn normalize(s: &str) -> String {
    s.replace(|c: char| c == '\r' || c == '\n', " ")
        .trim_matches(TRIM)
        .to_owned()
}

fn normalize_section(name: &str) -> String {
    name.replace(|c: char| c == '\r' || c == '\n', " ")
        .trim_matches(SECTION_TRIM)
        .to_owned()
}

// Key has to survive `key = value` line split on first `=`
fn is_valid_key(key: &str) -> bool {
    !key.contains('=') && !key.starts_with(|c: char| c == '[' || c == '#' || c == ';')
}

/// Iterator over entries of `IniSection`.
pub struct IniSectionIter<'a>(btree_map::Iter<'a, String, String>);

impl<'a> Iterator for IniSectionIter<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Mapping from section name to `IniSection`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IniFile {
    sections: BTreeMap<String, IniSection>,
}

impl IniFile {
    pub fn new() -> Self {
        IniFile {
            sections: BTreeMap::new(),
        }
    }

    /// Parses ini text. Never fails, see module documentation.
    pub fn parse(text: &str) -> Self {
        let mut ini = IniFile::new();
        let mut current: Option<String> = None;

        for (n, line) in text.lines().enumerate() {
            let line = line.trim_matches(TRIM);

            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if line.starts_with('[') {
                let name = line.trim_matches(SECTION_TRIM);
                ini.sections.entry(name.to_owned()).or_default();
                current = Some(name.to_owned());
                continue;
            }

            let section = match current {
                Some(ref name) => ini.sections.entry(name.clone()).or_default(),
                None => {
                    trace!("Skipping line {} outside of any section", n + 1);
                    continue;
                }
            };

            match line.find('=') {
                Some(idx) => {
                    let key = line[..idx].trim_matches(TRIM);
                    let val = line[idx + 1..].trim_matches(TRIM);
                    section.insert(key, val);
                }
                None => trace!("Skipping malformed line {}: {:?}", n + 1, line),
            }
        }

        ini
    }

    /// Reads and parses file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        debug!("Loaded {}", path.display());

        Ok(IniFile::parse(&text))
    }

    /// Writes rendered file to `path`, creating parent directories if needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
        fs::write(path, self.to_string()).map_err(|e| Error::io(path, e))?;
        debug!("Saved {}", path.display());

        Ok(())
    }

    pub fn section(&self, name: &str) -> Option<&IniSection> {
        self.sections.get(&normalize_section(name))
    }

    pub fn section_mut(&mut self, name: &str) -> Option<&mut IniSection> {
        self.sections.get_mut(&normalize_section(name))
    }

    /// Returns section `name`, creating it if needed. Names are trimmed of brackets, tabs and
    /// spaces, the same way the parser reads section headers.
    pub fn get_or_create_section(&mut self, name: &str) -> &mut IniSection {
        self.sections.entry(normalize_section(name)).or_default()
    }

    pub fn delete_section(&mut self, name: &str) -> Option<IniSection> {
        self.sections.remove(&normalize_section(name))
    }

    /// Iterate over `(name, section)` pairs in name order.
    pub fn sections(&self) -> btree_map::Iter<'_, String, IniSection> {
        self.sections.iter()
    }

    /// Removes keys with empty values and sections that end up empty.
    pub fn clean(&mut self) {
        for section in self.sections.values_mut() {
            section.clean();
        }
        self.sections.retain(|_, section| !section.is_empty());
    }
}

impl Display for IniFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, section) in &self.sections {
            writeln!(f)?;
            writeln!(f, "[{}]", name)?;
            for (key, val) in section.iter() {
                writeln!(f, "{} = {}", key, val)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "\
# comment
; another comment
orphan = 1

[GCPad1]
Device = DInput/0/Keyboard Mouse
\tButtons/A = X   \r
Buttons/B=Z
Main Stick/Dead Zone = 25
garbage line
Empty =

[ Profile ]
Rumble/Motor = Motor | Strong
Rumble/Motor = Weak
";

    #[test]
    fn parse() {
        let ini = IniFile::parse(TEXT);
        let pad = ini.section("GCPad1").unwrap();

        assert_eq!(pad.get("Device", ""), "DInput/0/Keyboard Mouse");
        assert_eq!(pad.get("Buttons/A", ""), "X");
        assert_eq!(pad.get("Buttons/B", ""), "Z");
        assert_eq!(pad.get_value("Main Stick/Dead Zone", 0), 25);
        assert_eq!(pad.get("Empty", "default"), "default");
        assert!(pad.exists("Empty"));
        assert!(!pad.exists("garbage line"));

        // Later values overwrite earlier ones, header is trimmed of brackets
        let profile = ini.section("Profile").unwrap();
        assert_eq!(profile.get("Rumble/Motor", ""), "Weak");
        assert_eq!(ini.sections().count(), 2);
    }

    #[test]
    fn set_elides_default() {
        let mut section = IniSection::new();
        section.set("Buttons/Threshold", "60", "50");
        assert_eq!(section.lookup("Buttons/Threshold"), Some("60"));
        section.set("Buttons/Threshold", "50", "50");
        assert!(!section.exists("Buttons/Threshold"));

        section.set_value("Range", 100, 100);
        assert!(section.is_empty());
        section.set_value("Range", 150, 100);
        assert_eq!(section.get_value("Range", 100), 150);
    }

    #[test]
    fn get_value_falls_back() {
        let ini = IniFile::parse("[A]\nx = 1.5\ny = nope\n");
        let sec = ini.section("A").unwrap();
        assert_eq!(sec.get_value("x", 0.0), 1.5);
        assert_eq!(sec.get_value("y", 7), 7);
        assert_eq!(sec.get_value("z", 3), 3);
    }

    #[test]
    fn render() {
        let mut ini = IniFile::new();
        ini.get_or_create_section("B").set("k", "v", "");
        ini.get_or_create_section("A").set("x", "1", "");
        assert_eq!(ini.to_string(), "\n[A]\nx = 1\n\n[B]\nk = v\n");
    }

    #[test]
    fn clean() {
        let mut ini = IniFile::parse(TEXT);
        ini.get_or_create_section("Nothing");
        ini.clean();

        assert!(ini.section("Nothing").is_none());
        assert!(!ini.section("GCPad1").unwrap().exists("Empty"));
    }

    #[test]
    fn cleaned_file_is_fixed_point() {
        let mut ini = IniFile::parse(TEXT);
        ini.get_or_create_section("Wiimote1").set("Buttons/A", "", "x");
        {
            let odd = ini.get_or_create_section(" [Odd]\n");
            odd.set(" Device", "evdev/0/Pad ", "");
            odd.set("k", "  ", "");
            odd.set("multi", "one\ntwo", "");
            odd.set("a=b", "c", "");
            odd.set("#comment", "c", "");
            odd.set("[section", "c", "");
            odd.set("; other", "c", "");
            odd.set("x", "=y", "");
        }
        ini.clean();

        let odd = ini.section("Odd").unwrap();
        assert_eq!(
            odd.iter().collect::<Vec<_>>(),
            [("Device", "evdev/0/Pad"), ("multi", "one two"), ("x", "=y")]
        );
        assert_eq!(odd.lookup(" Device\t"), Some("evdev/0/Pad"));

        let reparsed = IniFile::parse(&ini.to_string());
        assert_eq!(reparsed, ini);
        assert_eq!(IniFile::parse(&reparsed.to_string()), reparsed);
    }

    #[test]
    fn whitespace_value_is_default() {
        let mut section = IniSection::new();
        section.set("Buttons/Threshold", " 50 ", "50");
        assert!(section.is_empty());
        section.set("Buttons/A", "\t", "");
        assert!(section.is_empty());
    }
}
