use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::io;
use std::path::{Path, PathBuf};
use std::{env, fs};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default per-endpoint request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Default polling interval for live monitoring in seconds.
pub const DEFAULT_INTERVAL_SECONDS: u64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read registry {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write registry {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("registry {path} is corrupted: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    #[error("failed to serialize registry: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("cannot determine a configuration directory; set XDG_CONFIG_HOME or HOME")]
    PathUnavailable,
}

/// A named network target with its probe timeout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

/// The persistent set of configured endpoints, keyed by name.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default)]
    endpoints: BTreeMap<String, Endpoint>,
}

impl Registry {
    /// Load the registry from `path`.
    ///
    /// A missing file is not an error: a default empty registry is
    /// created and persisted, mirroring first-run behavior. An
    /// unreadable or malformed file is fatal to the calling command.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let registry = Self::default();
            registry.save(path)?;
            return Ok(registry);
        }

        let raw = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;

        toml::from_str(&raw)
            .map_err(|err| ConfigError::Corrupt { path: path.to_path_buf(), reason: err.to_string() })
    }

    /// Serialize and write the full registry to `path`, creating parent
    /// directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let raw = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|source| ConfigError::Write { path: path.to_path_buf(), source })?;
        }

        fs::write(path, raw)
            .map_err(|source| ConfigError::Write { path: path.to_path_buf(), source })
    }

    /// Register a new endpoint. Returns false without mutating when the
    /// name is already taken.
    pub fn add(&mut self, name: String, url: String, timeout: u64) -> bool {
        match self.endpoints.entry(name) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Endpoint { url, timeout });
                true
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.get(name)
    }

    /// Snapshot the endpoints for one probe cycle.
    ///
    /// `filter` restricts the snapshot to the named endpoints; unknown
    /// names are silently dropped. The returned map is an owned copy, so
    /// later registry mutation cannot affect probes already in flight.
    pub fn select(&self, filter: Option<&[String]>) -> BTreeMap<String, Endpoint> {
        match filter {
            None => self.endpoints.clone(),
            Some(names) => names
                .iter()
                .filter_map(|name| self.endpoints.get_key_value(name))
                .map(|(name, endpoint)| (name.clone(), endpoint.clone()))
                .collect(),
        }
    }
}

/// Default registry path: `$XDG_CONFIG_HOME/upcheck/config.toml` or
/// `$HOME/.config/upcheck/config.toml`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let base = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(ConfigError::PathUnavailable);
    };

    Ok(base.join("upcheck/config.toml"))
}

/// Default history path: `$XDG_DATA_HOME/upcheck/history.csv` or
/// `$HOME/.local/share/upcheck/history.csv`.
pub fn default_history_path() -> Result<PathBuf, ConfigError> {
    let base = if let Ok(data_home) = env::var("XDG_DATA_HOME") {
        PathBuf::from(data_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".local/share")
    } else {
        return Err(ConfigError::PathUnavailable);
    };

    Ok(base.join("upcheck/history.csv"))
}
