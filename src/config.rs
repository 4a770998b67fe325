//! Portal configuration
//!
//! Handles persistent configuration: where the flat files live, the HTTP
//! bind address, and the PIN usage cap.
//!
//! Configuration is stored as JSON, by default in
//! `<config_dir>/reportcard/portal.json`:
//!
//! ```json
//! {
//!   "data_dir": "/srv/school",
//!   "allow_list_file": "pins.csv",
//!   "ledger_file": "records.csv",
//!   "directory_file": "public/data.csv",
//!   "names_file": "public/names.csv",
//!   "bind": "127.0.0.1:3000",
//!   "usage_cap": 5,
//!   "log_dir": null
//! }
//! ```
//!
//! Relative file names are resolved against `data_dir`.

use crate::error::{PortalError, Result, ResultExt as _};
use crate::ledger::DEFAULT_USAGE_CAP;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Portal configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Base directory for every relative file path below
    pub data_dir: PathBuf,
    /// Valid PINs, one per line
    pub allow_list_file: PathBuf,
    /// PIN usage ledger
    pub ledger_file: PathBuf,
    /// Submitted reports, searched by validation
    pub directory_file: PathBuf,
    /// Deduplicated student names
    pub names_file: PathBuf,
    /// HTTP listen address
    pub bind: String,
    /// Uses a PIN grants its bound student
    pub usage_cap: u32,
    /// Log directory; the platform data directory when unset
    pub log_dir: Option<PathBuf>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            allow_list_file: PathBuf::from("pins.csv"),
            ledger_file: PathBuf::from("records.csv"),
            directory_file: PathBuf::from("public").join("data.csv"),
            names_file: PathBuf::from("public").join("names.csv"),
            bind: DEFAULT_BIND.to_owned(),
            usage_cap: DEFAULT_USAGE_CAP,
            log_dir: None,
        }
    }
}

impl PortalConfig {
    /// Per-user config file location
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| PortalError::Config("Failed to get config directory".to_owned()))?;
        Ok(config_dir.join("reportcard").join("portal.json"))
    }

    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, the per-user file is used
    /// if present and defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::load_from(path)?,
            None => match Self::default_path() {
                Ok(path) if path.exists() => Self::load_from(&path)?,
                _ => Self::default(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_config_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&contents)
            .with_config_context(|| format!("Failed to parse config JSON {}", path.display()))
    }

    /// Save configuration to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_config_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(self)?;

        std::fs::write(path, json)
            .with_config_context(|| format!("Failed to write config to {}", path.display()))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.usage_cap == 0 {
            return Err(PortalError::Config(
                "usage_cap must be at least 1".to_owned(),
            ));
        }
        self.bind_addr()?;
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.bind
            .parse()
            .map_err(|e| PortalError::Config(format!("Invalid bind address {:?}: {e}", self.bind)))
    }

    fn resolve(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.data_dir.join(file)
        }
    }

    pub fn allow_list_path(&self) -> PathBuf {
        self.resolve(&self.allow_list_file)
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.resolve(&self.ledger_file)
    }

    pub fn directory_path(&self) -> PathBuf {
        self.resolve(&self.directory_file)
    }

    pub fn names_path(&self) -> PathBuf {
        self.resolve(&self.names_file)
    }
}
