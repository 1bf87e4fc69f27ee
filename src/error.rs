// Copyright 2024 Emupad Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// The error type for operations that touch the filesystem or address controllers by index or
/// name. Mapping and state computation never fail, unresolved bindings read as neutral values.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading or writing `path` failed.
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Profile name is empty or contains path separators.
    #[error("invalid profile name {0:?}")]
    InvalidProfileName(String),
    /// There is no profile with given name.
    #[error("profile {0:?} does not exist")]
    ProfileNotFound(String),
    /// There is no controller slot with given index.
    #[error("controller slot {0} does not exist")]
    InvalidPort(usize),
    /// Group or control with given name does not exist.
    #[error("unknown control {group}/{control}")]
    UnknownControl { group: String, control: String },
    /// Could not determine where configuration should be stored.
    #[error("could not determine configuration directory")]
    NoConfigDir,
}

impl Error {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Error::Io {
            path: path.to_owned(),
            source,
        }
    }

    pub(crate) fn unknown_control(group: &str, control: &str) -> Self {
        Error::UnknownControl {
            group: group.to_owned(),
            control: control.to_owned(),
        }
    }
}
