//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Everything lives under one directory (`~/.config/mongui/` on Linux):
//!
//! ```text
//! mongui/
//! ├── config.toml        general settings, current style
//! ├── keybindings.json   per-component key bindings
//! ├── history.txt        query history
//! └── styles/
//!     ├── default.toml
//!     └── light.toml
//! ```

pub mod keys;
mod merge;
pub mod source;
pub mod styles;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub use keys::{Key, KeyBindings};
pub use merge::Merge;
pub use source::{ConfigSource, FsConfig};
pub use styles::Styles;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct MonguiConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub styles: StylesConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub page_size: Option<u64>,
    pub history_limit: Option<usize>,
    pub history_file: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct StylesConfig {
    pub current_style: Option<String>,
    pub better_symbols: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    pub name: Option<String>,
    pub seed_file: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_PAGE_SIZE: u64 = 50;
pub const DEFAULT_HISTORY_LIMIT: usize = 20;
pub const DEFAULT_HISTORY_FILE: &str = "history.txt";
pub const DEFAULT_STYLE: &str = "default";
pub const DEFAULT_STORE_NAME: &str = "local";
pub const CONFIG_DIR_NAME: &str = "mongui";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub config_dir: PathBuf,
    pub page_size: u64,
    pub history_limit: usize,
    pub history_path: PathBuf,
    pub log_level: Option<String>,
    pub current_style: String,
    pub better_symbols: bool,
    pub store_name: String,
    pub seed_file: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Fold the persistent fields back into the sparse file representation.
    pub fn to_file(&self) -> MonguiConfig {
        MonguiConfig {
            general: GeneralConfig {
                page_size: Some(self.page_size),
                history_limit: Some(self.history_limit),
                history_file: self
                    .history_path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned()),
                log_level: self.log_level.clone(),
            },
            styles: StylesConfig {
                current_style: Some(self.current_style.clone()),
                better_symbols: Some(self.better_symbols),
            },
            store: StoreConfig {
                name: Some(self.store_name.clone()),
                seed_file: self
                    .seed_file
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned()),
            },
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
    Json(serde_json::Error),
    NoConfigDir,
    UnknownStyle(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
            ConfigError::Serialize(e) => write!(f, "config serialize error: {e}"),
            ConfigError::Json(e) => write!(f, "keybindings error: {e}"),
            ConfigError::NoConfigDir => write!(f, "could not determine config directory"),
            ConfigError::UnknownStyle(name) => write!(f, "unknown style: {name}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(e: toml::ser::Error) -> Self {
        ConfigError::Serialize(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Returns the config directory: `MONGUI_CONFIG_DIR` or `<os config dir>/mongui`.
pub fn default_config_dir() -> Option<PathBuf> {
    std::env::var_os("MONGUI_CONFIG_DIR")
        .map(PathBuf::from)
        .or_else(|| dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME)))
}

/// Load `config.toml` from `dir`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `MonguiConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config(dir: &Path) -> Result<MonguiConfig, ConfigError> {
    let path = dir.join("config.toml");

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(MonguiConfig::default());
    }

    let contents = fs::read_to_string(&path)?;
    let config: MonguiConfig = toml::from_str(&contents)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

fn generate_default_config(path: &Path) {
    let default_content = r#"# mongui configuration
# All settings are optional, defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# page_size = 50
# history_limit = 20                # Oldest entries are dropped beyond this
# history_file = "history.txt"      # Relative to this directory
# log_level = "debug"

# [styles]
# current_style = "default"         # Any file name in styles/ (without .toml)
# better_symbols = false

# [store]
# name = "local"
# seed_file = "/path/to/seed.json"  # { "db": { "collection": [ {...} ] } }
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Flags that can override file settings from the command line.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub style: Option<String>,
    pub seed_file: Option<PathBuf>,
    pub log_level: Option<String>,
}

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &MonguiConfig, dir: &Path, cli: &CliOverrides) -> ResolvedConfig {
    // Style: CLI → env → config → default
    let current_style = cli
        .style
        .clone()
        .or_else(|| std::env::var("MONGUI_STYLE").ok())
        .or_else(|| config.styles.current_style.clone())
        .unwrap_or_else(|| DEFAULT_STYLE.to_string());

    // Seed file: CLI → env → config
    let seed_file = cli
        .seed_file
        .clone()
        .or_else(|| std::env::var_os("MONGUI_SEED").map(PathBuf::from))
        .or_else(|| config.store.seed_file.as_ref().map(PathBuf::from));

    let log_level = cli
        .log_level
        .clone()
        .or_else(|| std::env::var("MONGUI_LOG_LEVEL").ok())
        .or_else(|| config.general.log_level.clone());

    let history_file = config
        .general
        .history_file
        .clone()
        .unwrap_or_else(|| DEFAULT_HISTORY_FILE.to_string());

    ResolvedConfig {
        config_dir: dir.to_path_buf(),
        page_size: config
            .general
            .page_size
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE),
        history_limit: config
            .general
            .history_limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT),
        history_path: dir.join(history_file),
        log_level,
        current_style,
        better_symbols: config.styles.better_symbols.unwrap_or(false),
        store_name: config
            .store
            .name
            .clone()
            .unwrap_or_else(|| DEFAULT_STORE_NAME.to_string()),
        seed_file,
    }
}
