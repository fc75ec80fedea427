//! Preset persistence.
//!
//! A preset is four additive deltas stored as whitespace-separated signed
//! integers in a flat text file, always in the order
//! `brightness hue saturation light`:
//!
//! ```text
//! 12 -30 5 0
//! ```
//!
//! Loading never touches an existing preset. Callers get a `Result` back and
//! decide what to keep; the session logs the error and carries on with the
//! values it already had.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PresetError {
    #[error("Cannot open preset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed preset: {0}")]
    Malformed(String),
}

/// Brightness, hue, saturation and lightness deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Preset {
    pub brightness: i32,
    pub hue: i32,
    pub saturation: i32,
    pub light: i32,
}

impl Preset {
    pub fn new(brightness: i32, hue: i32, saturation: i32, light: i32) -> Self {
        Self {
            brightness,
            hue,
            saturation,
            light,
        }
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.brightness, self.hue, self.saturation, self.light
        )
    }
}

impl FromStr for Preset {
    type Err = PresetError;

    /// Parse the first four whitespace-separated integers; extra tokens are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const FIELDS: [&str; 4] = ["brightness", "hue", "saturation", "light"];

        let mut tokens = s.split_whitespace();
        let mut values = [0i32; 4];
        for (value, field) in values.iter_mut().zip(FIELDS) {
            let token = tokens
                .next()
                .ok_or_else(|| PresetError::Malformed(format!("missing {field}")))?;
            *value = token
                .parse()
                .map_err(|_| PresetError::Malformed(format!("{field} is not an integer: {token:?}")))?;
        }

        let [brightness, hue, saturation, light] = values;
        Ok(Self::new(brightness, hue, saturation, light))
    }
}

/// Write `preset` to `path`, truncating any previous contents.
pub fn save(preset: &Preset, path: &Path) -> Result<(), PresetError> {
    std::fs::write(path, preset.to_string()).map_err(|source| PresetError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a preset from `path`.
pub fn load(path: &Path) -> Result<Preset, PresetError> {
    let content = std::fs::read_to_string(path).map_err(|source| PresetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    content.parse()
}
