//! GPIO access through the Linux sysfs interface.
//!
//! ```text
//! <root>/export           write N to create <root>/gpioN
//! <root>/gpioN/direction  "in"
//! <root>/gpioN/value      "0" | "1"
//! <root>/unexport         write N to remove <root>/gpioN
//! ```
//!
//! `N` is the kernel's global line number, which is not always the header
//! or BCM number printed on the board.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{PinDriver, PinState};
use crate::utils::{Error, Result};

#[derive(Debug)]
pub struct SysfsPin {
    root: PathBuf,
    line: Option<u8>,
    exported: bool,
}

impl SysfsPin {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            line: None,
            exported: false,
        }
    }

    fn line_dir(&self, pin: u8) -> PathBuf {
        self.root.join(format!("gpio{pin}"))
    }
}

fn write(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|source| Error::Gpio {
        path: path.to_path_buf(),
        source,
    })
}

impl PinDriver for SysfsPin {
    fn open(&mut self) -> Result<()> {
        match fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(Error::Gpio {
                path: self.root.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "not a directory"),
            }),
            Err(source) => Err(Error::Gpio {
                path: self.root.clone(),
                source,
            }),
        }
    }

    fn configure_as_input(&mut self, pin: u8) -> Result<()> {
        let dir = self.line_dir(pin);
        if !dir.exists() {
            write(&self.root.join("export"), &pin.to_string())?;
            self.exported = true;
            debug!(pin, "exported gpio line");
        }
        self.line = Some(pin);
        write(&dir.join("direction"), "in")
    }

    fn read_state(&mut self) -> Result<PinState> {
        let pin = self.line.ok_or(Error::PinNotConfigured)?;
        let path = self.line_dir(pin).join("value");
        let raw = fs::read_to_string(&path).map_err(|source| Error::Gpio {
            path: path.clone(),
            source,
        })?;

        match raw.trim() {
            "1" => Ok(PinState::Active),
            "0" => Ok(PinState::Inactive),
            other => Err(Error::Gpio {
                path,
                source: io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("unexpected value {other:?}"),
                ),
            }),
        }
    }

    fn close(&mut self) {
        let Some(pin) = self.line.take() else {
            return;
        };
        if std::mem::take(&mut self.exported) {
            if let Err(e) = write(&self.root.join("unexport"), &pin.to_string()) {
                warn!("failed to release gpio line {}: {}", pin, e);
            }
        }
    }
}

impl Drop for SysfsPin {
    fn drop(&mut self) {
        self.close();
    }
}
