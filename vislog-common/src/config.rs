//! Configuration loading and root folder resolution
//!
//! Resolution order for every setting:
//! 1. Command-line argument / environment variable (highest priority)
//! 2. TOML config file
//! 3. Compiled default

use crate::events::DEFAULT_EVENT_CAPACITY;
use crate::{Error, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "VISLOG_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "vislog.db";

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_GEO_API_URL: &str = "http://ip-api.com";

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub geo_api_url: Option<String>,
    pub static_dir: Option<PathBuf>,
    pub event_capacity: Option<usize>,
}

impl TomlConfig {
    /// Parse TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config file: {}", e)))
    }

    /// Load and parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config = Self::parse(&content)?;
        info!("Loaded config file {}", path.display());
        Ok(config)
    }

    /// Load the platform config file if one exists, else an empty config
    pub fn load_default() -> Result<Self> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Platform config file location (`~/.config/vislog/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("vislog").join("config.toml"))
}

/// Root folder resolution:
/// 1. Command-line argument
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent default
pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml_config: &TomlConfig,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// OS-dependent default root folder
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("vislog"))
        .unwrap_or_else(|| PathBuf::from("./vislog_data"))
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub root_folder: Option<PathBuf>,
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub geo_api_url: Option<String>,
    pub static_dir: Option<PathBuf>,
}

/// Fully resolved server settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub root_folder: PathBuf,
    pub port: u16,
    pub bind: String,
    pub geo_api_url: String,
    pub static_dir: Option<PathBuf>,
    pub event_capacity: usize,
}

impl ServerConfig {
    /// Merge overrides over the TOML file over compiled defaults
    pub fn resolve(overrides: ConfigOverrides, toml_config: &TomlConfig) -> Result<Self> {
        let root_folder = resolve_root_folder(
            overrides.root_folder.as_deref(),
            ROOT_FOLDER_ENV,
            toml_config,
        );

        let event_capacity = toml_config.event_capacity.unwrap_or(DEFAULT_EVENT_CAPACITY);
        if event_capacity == 0 {
            return Err(Error::Config("event_capacity must be greater than 0".to_string()));
        }

        let config = Self {
            root_folder,
            port: overrides.port.or(toml_config.port).unwrap_or(DEFAULT_PORT),
            bind: overrides
                .bind
                .or_else(|| toml_config.bind.clone())
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
            geo_api_url: overrides
                .geo_api_url
                .or_else(|| toml_config.geo_api_url.clone())
                .unwrap_or_else(|| DEFAULT_GEO_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            static_dir: overrides.static_dir.or_else(|| toml_config.static_dir.clone()),
            event_capacity,
        };

        config.socket_addr()?;
        Ok(config)
    }

    /// Listen address
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let host = if self.bind.contains(':') && !self.bind.starts_with('[') {
            format!("[{}]", self.bind)
        } else {
            self.bind.clone()
        };
        format!("{}:{}", host, self.port)
            .parse()
            .map_err(|e| Error::Config(format!("Invalid bind address {:?}: {}", self.bind, e)))
    }

    /// SQLite database file
    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }
}

/// Create the root folder if it is missing
pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
        info!("Created root folder {}", path.display());
    }
    Ok(())
}
