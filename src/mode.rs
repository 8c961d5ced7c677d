//! Execution mode and the flag holding it.
//!
//! The flag stores the parsed mode in one atomic byte so every dispatch reads
//! it with a single load. A value that names no mode is remembered verbatim
//! and reported by the call that observes it.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::RwLock;

use crate::error::{Error, Result};

/// Environment variable read when a manager is created from the environment.
pub const MODE_ENV: &str = "TENSOR_OPERANTS_MODE";

/// Which backend slot serves calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Eager,
    Static,
    Phi,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Eager, Mode::Static, Mode::Phi];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Eager => "eager",
            Mode::Static => "static",
            Mode::Phi => "phi",
        }
    }

    fn to_raw(self) -> u8 {
        match self {
            Mode::Eager => EAGER,
            Mode::Static => STATIC,
            Mode::Phi => PHI,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| Error::UnimplementedMode { mode: s.to_string() })
    }
}

const UNSET: u8 = 0;
const EAGER: u8 = 1;
const STATIC: u8 = 2;
const PHI: u8 = 3;
const UNRECOGNIZED: u8 = u8::MAX;

/// Process- or manager-wide mode setting.
#[derive(Debug)]
pub struct ModeFlag {
    state: AtomicU8,
    raw: RwLock<String>,
}

impl ModeFlag {
    /// An unset flag; reading it fails until a mode is set.
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(UNSET),
            raw: RwLock::new(String::new()),
        }
    }

    /// Flag initialized from [`MODE_ENV`], unset when the variable is absent.
    pub fn from_env() -> Self {
        let flag = Self::new();
        if let Ok(value) = std::env::var(MODE_ENV) {
            flag.set(&value);
        }
        flag
    }

    /// Store a raw setting. Unrecognized values are kept for error reporting.
    pub fn set(&self, value: &str) {
        match value.parse::<Mode>() {
            Ok(mode) => self.set_mode(mode),
            Err(_) => {
                log::debug!("unrecognized tensor operants mode `{value}`");
                if let Ok(mut raw) = self.raw.write() {
                    *raw = value.to_string();
                }
                self.state.store(UNRECOGNIZED, Ordering::Release);
            }
        }
    }

    pub fn set_mode(&self, mode: Mode) {
        self.state.store(mode.to_raw(), Ordering::Release);
    }

    /// The current mode, or `UnimplementedMode` naming the raw setting.
    pub fn get(&self) -> Result<Mode> {
        match self.state.load(Ordering::Acquire) {
            EAGER => Ok(Mode::Eager),
            STATIC => Ok(Mode::Static),
            PHI => Ok(Mode::Phi),
            UNSET => Err(Error::UnimplementedMode {
                mode: String::new(),
            }),
            _ => {
                let mode = self
                    .raw
                    .read()
                    .map(|raw| raw.clone())
                    .unwrap_or_default();
                Err(Error::UnimplementedMode { mode })
            }
        }
    }
}

impl Default for ModeFlag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exact_names_only() {
        assert_eq!("phi".parse::<Mode>().unwrap(), Mode::Phi);
        assert!("Phi".parse::<Mode>().is_err());
        assert!(" eager".parse::<Mode>().is_err());
    }

    #[test]
    fn flag_reports_unrecognized_value() {
        let flag = ModeFlag::new();
        flag.set("graph");
        assert_eq!(
            flag.get().unwrap_err(),
            Error::UnimplementedMode {
                mode: "graph".to_string()
            }
        );
        flag.set("static");
        assert_eq!(flag.get().unwrap(), Mode::Static);
    }

    #[test]
    fn unset_flag_is_unimplemented() {
        assert!(matches!(
            ModeFlag::default().get(),
            Err(Error::UnimplementedMode { mode }) if mode.is_empty()
        ));
    }
}
