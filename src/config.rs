//! User configuration loaded from a TOML file.

use crate::error::ConfigError;
use crate::search::{DEFAULT_MIN_PARTIAL_LEN, Scorer};
use crate::state::DEFAULT_CACHE_CAPACITY;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "SEARCHINDEX_MCP_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Index used when a tool call omits `path`.
    pub default_index: Option<PathBuf>,
    /// Number of parsed indexes kept in memory.
    pub cache_capacity: usize,
    /// Seconds between checks for changed index files. 0 disables watching.
    pub watch_interval_secs: u64,
    /// Persist parsed indexes as snapshots in the user cache directory.
    pub snapshot_cache: bool,
    /// Overrides the snapshot directory.
    pub snapshot_dir: Option<PathBuf>,
    /// Result limit when a request does not give one.
    pub default_limit: usize,
    /// Shortest query word that also matches inside longer terms.
    pub min_partial_len: usize,
    pub scorer: Scorer,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_index: None,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            watch_interval_secs: 5,
            snapshot_cache: true,
            snapshot_dir: None,
            default_limit: 10,
            min_partial_len: DEFAULT_MIN_PARTIAL_LEN,
            scorer: Scorer::default(),
        }
    }
}

impl Config {
    /// Parses a config file's contents.
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads the config at `path`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    /// Loads the config from the first location that applies:
    /// `explicit`, then `$SEARCHINDEX_MCP_CONFIG`, then the user config
    /// directory. Only the user config file may be absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
            return Self::from_file(Path::new(&path));
        }
        match default_config_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn watch_interval(&self) -> Option<Duration> {
        (self.watch_interval_secs > 0).then(|| Duration::from_secs(self.watch_interval_secs))
    }

    /// Where snapshots go, or `None` when snapshots are disabled.
    pub fn snapshot_root(&self) -> Option<PathBuf> {
        if !self.snapshot_cache {
            return None;
        }
        self.snapshot_dir
            .clone()
            .or_else(|| dirs::cache_dir().map(|dir| dir.join(env!("CARGO_PKG_NAME"))))
    }
}

/// `<config dir>/searchindex-mcp/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(env!("CARGO_PKG_NAME")).join("config.toml"))
}
