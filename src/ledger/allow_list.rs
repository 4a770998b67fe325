//! The set of valid PIN tokens.

use crate::error::{Result, ResultExt as _};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Valid PINs, one per line in the source file.
#[derive(Debug, Clone, Default)]
pub struct PinAllowList {
    pins: HashSet<String>,
}

impl PinAllowList {
    /// Parse one token per line, ignoring blank lines and surrounding whitespace.
    pub fn parse(text: &str) -> Self {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Load the allow-list file. A missing file is an empty allow-list.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(Self::parse(&text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("PIN allow-list not found at {}", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e).ledger_unavailable(format!(
                "Failed to read PIN allow-list {}",
                path.display()
            )),
        }
    }

    pub fn contains(&self, pin: &str) -> bool {
        let pin = pin.trim();
        !pin.is_empty() && self.pins.contains(pin)
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}

impl FromIterator<String> for PinAllowList {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            pins: iter.into_iter().collect(),
        }
    }
}
