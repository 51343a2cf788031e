//! Where styles and key bindings come from.
//!
//! The orchestrator only sees [`ConfigSource`]; [`FsConfig`] reads and
//! writes the files under the config directory.

use log::{debug, info};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::styles::BUILTIN_STYLES;
use super::{ConfigError, KeyBindings, ResolvedConfig, Styles};

pub trait ConfigSource {
    /// Load the style called `name`, completed from the built-in default.
    fn load_styles(&self, name: &str, better_symbols: bool) -> Result<Styles, ConfigError>;

    /// Load key bindings, completed from the defaults.
    fn load_keybindings(&self) -> Result<KeyBindings, ConfigError>;

    /// Persist the resolved configuration.
    fn save_config(&self, config: &ResolvedConfig) -> Result<(), ConfigError>;

    /// Names of every style that `load_styles` can find, sorted.
    fn list_styles(&self) -> Vec<String>;
}

pub struct FsConfig {
    dir: PathBuf,
}

impl FsConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn styles_dir(&self) -> PathBuf {
        self.dir.join("styles")
    }

    fn keybindings_path(&self) -> PathBuf {
        self.dir.join("keybindings.json")
    }
}

impl ConfigSource for FsConfig {
    fn load_styles(&self, name: &str, better_symbols: bool) -> Result<Styles, ConfigError> {
        let path = self.styles_dir().join(format!("{name}.toml"));

        let mut styles = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let loaded: Styles = toml::from_str(&contents)?;
            info!("Loaded style '{}' from {}", name, path.display());
            loaded.completed()
        } else {
            let builtin =
                Styles::builtin(name).ok_or_else(|| ConfigError::UnknownStyle(name.to_string()))?;
            info!("Writing built-in style '{}' to {}", name, path.display());
            atomic_write(&path, &toml::to_string_pretty(&builtin)?)?;
            builtin
        };

        styles.better_symbols = better_symbols;
        Ok(styles)
    }

    fn load_keybindings(&self) -> Result<KeyBindings, ConfigError> {
        let path = self.keybindings_path();

        if !path.exists() {
            let defaults = KeyBindings::defaults();
            info!("No keybindings found, writing defaults to {}", path.display());
            atomic_write(&path, &serde_json::to_string_pretty(&defaults)?)?;
            return Ok(defaults);
        }

        let contents = fs::read_to_string(&path)?;
        let loaded: KeyBindings = serde_json::from_str(&contents)?;
        debug!("Loaded keybindings from {}", path.display());
        Ok(loaded.completed())
    }

    fn save_config(&self, config: &ResolvedConfig) -> Result<(), ConfigError> {
        let path = self.dir.join("config.toml");
        atomic_write(&path, &to_toml(&config.to_file())?)?;
        debug!("Saved config to {}", path.display());
        Ok(())
    }

    fn list_styles(&self) -> Vec<String> {
        let mut names: Vec<String> = BUILTIN_STYLES.iter().map(|s| s.to_string()).collect();
        if let Ok(entries) = fs::read_dir(self.styles_dir()) {
            names.extend(entries.filter_map(|entry| {
                let path = entry.ok()?.path();
                if path.extension().is_some_and(|ext| ext == "toml") {
                    Some(path.file_stem()?.to_string_lossy().into_owned())
                } else {
                    None
                }
            }));
        }
        names.sort();
        names.dedup();
        names
    }
}

fn to_toml<T: Serialize>(value: &T) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(value)?)
}

/// Write via `.tmp` + rename so a crash never leaves a half-written file.
fn atomic_write(path: &Path, contents: &str) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, contents)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}
