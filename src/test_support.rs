//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;

use crate::config::styles::BUILTIN_STYLES;
use crate::config::{ConfigError, ConfigSource, KeyBindings, ResolvedConfig, Styles};
use crate::core::App;

/// An in-memory config source serving the built-in styles and default keys.
/// Failures can be switched on per call type.
#[derive(Default, Clone)]
pub struct StaticSource {
    fail_styles: Rc<Cell<bool>>,
    fail_keys: Rc<Cell<bool>>,
    saved: Rc<RefCell<Vec<String>>>,
}

impl StaticSource {
    pub fn fail_styles(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.fail_styles)
    }

    pub fn fail_keys(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.fail_keys)
    }

    /// `current_style` of every config passed to `save_config`.
    pub fn saved_styles(&self) -> Rc<RefCell<Vec<String>>> {
        Rc::clone(&self.saved)
    }
}

fn unavailable(what: &str) -> ConfigError {
    ConfigError::Io(std::io::Error::other(format!("{what} unavailable")))
}

impl ConfigSource for StaticSource {
    fn load_styles(&self, name: &str, better_symbols: bool) -> Result<Styles, ConfigError> {
        if self.fail_styles.get() {
            return Err(unavailable("styles"));
        }
        let mut styles =
            Styles::builtin(name).ok_or_else(|| ConfigError::UnknownStyle(name.to_string()))?;
        styles.better_symbols = better_symbols;
        Ok(styles)
    }

    fn load_keybindings(&self) -> Result<KeyBindings, ConfigError> {
        if self.fail_keys.get() {
            return Err(unavailable("keybindings"));
        }
        Ok(KeyBindings::defaults())
    }

    fn save_config(&self, config: &ResolvedConfig) -> Result<(), ConfigError> {
        self.saved.borrow_mut().push(config.current_style.clone());
        Ok(())
    }

    fn list_styles(&self) -> Vec<String> {
        BUILTIN_STYLES.iter().map(|s| s.to_string()).collect()
    }
}

/// A resolved config that does not depend on the environment.
pub fn test_config() -> ResolvedConfig {
    let dir = PathBuf::from("/tmp/mongui-test");
    ResolvedConfig {
        history_path: dir.join("history.txt"),
        config_dir: dir,
        page_size: 5,
        history_limit: 3,
        log_level: None,
        current_style: "default".to_string(),
        better_symbols: false,
        store_name: "test".to_string(),
        seed_file: None,
    }
}

/// Creates a test App backed by a [`StaticSource`].
pub fn test_app() -> App {
    test_app_with(StaticSource::default())
}

pub fn test_app_with(source: StaticSource) -> App {
    App::new(test_config(), Box::new(source)).expect("static source always loads")
}
