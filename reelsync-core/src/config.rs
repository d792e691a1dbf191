use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

const CONFIG_FILE: &str = "config.json";
const DATABASE_FILE: &str = "catalog.db";

/// Environment variable pointing at an explicit config file
pub const CONFIG_PATH_ENV: &str = "REELSYNC_CONFIG";
/// Overrides [`ClientConfig::server_url`]
pub const SERVER_URL_ENV: &str = "REELSYNC_SERVER_URL";
/// Overrides [`ClientConfig::database_path`]
pub const DATABASE_ENV: &str = "REELSYNC_DATABASE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Client identity and local storage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Reported as `Client` in the authorization header
    pub client_name: String,
    /// Reported as `Device` in the authorization header
    pub device_name: String,
    /// Reported as `Version` in the authorization header
    pub client_version: String,
    /// Base URL requests are built against before the session rewrites them
    pub server_url: String,
    pub database_path: PathBuf,
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_name: "reelsync".to_string(),
            device_name: std::env::consts::OS.to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            server_url: "http://localhost:8096".to_string(),
            database_path: default_data_dir().join(DATABASE_FILE),
            request_timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    /// Loads the config from `$REELSYNC_CONFIG` or the per-user config dir.
    ///
    /// A missing or unreadable file falls back to defaults; env overrides are
    /// applied last either way.
    pub fn load() -> Self {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .or_else(default_config_path);

        let mut config = match path {
            Some(path) if path.exists() => match Self::from_path(&path) {
                Ok(config) => {
                    info!("Loaded config from {}", path.display());
                    config
                }
                Err(err) => {
                    warn!("{err}; using defaults");
                    Self::default()
                }
            },
            _ => {
                info!("No config file found; using defaults");
                Self::default()
            }
        };

        config.apply_env_overrides();
        config
    }

    /// Reads a config file without applying env overrides.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw =
            std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(server_url) = std::env::var(SERVER_URL_ENV) {
            self.server_url = server_url;
        }
        if let Some(database) = std::env::var_os(DATABASE_ENV) {
            self.database_path = PathBuf::from(database);
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Directory holding the database, device id and session files.
    pub fn data_dir(&self) -> PathBuf {
        self.database_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "reelsync", "reelsync")
}

fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

fn default_data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".reelsync"))
}
