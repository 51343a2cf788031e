use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use log::{error, info};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

use mongui::config::{self, CliOverrides, FsConfig};
use mongui::core::App;
use mongui::store::{DocumentStore, MemoryStore};
use mongui::tui;

#[derive(Parser)]
#[command(name = "mongui", about = "Terminal browser for document databases")]
struct Args {
    /// Config directory (defaults to $MONGUI_CONFIG_DIR or the OS config dir)
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// JSON seed file for the in-memory store
    #[arg(short, long)]
    seed: Option<PathBuf>,

    /// Style to start with
    #[arg(long)]
    style: Option<String>,

    /// Where to write the log (defaults to mongui.log in the config dir)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// error, warn, info, debug or trace
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let Some(dir) = args.config_dir.clone().or_else(config::default_config_dir) else {
        eprintln!("mongui: could not determine config directory");
        std::process::exit(1);
    };

    let overrides = CliOverrides {
        style: args.style,
        seed_file: args.seed,
        log_level: args.log_level,
    };
    let file_config = match config::load_config(&dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("mongui: {e}");
            std::process::exit(1);
        }
    };
    let resolved = config::resolve(&file_config, &dir, &overrides);
    init_logger(&dir, args.log_file, resolved.log_level.as_deref());
    info!("mongui starting up, config dir {}", dir.display());

    let store: Arc<dyn DocumentStore> = match &resolved.seed_file {
        Some(path) => match MemoryStore::load_seed(resolved.store_name.clone(), path) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                error!("Failed to load seed {}: {}", path.display(), e);
                eprintln!("mongui: {}: {e}", path.display());
                std::process::exit(1);
            }
        },
        None => Arc::new(MemoryStore::demo(resolved.store_name.clone())),
    };

    let app = match App::new(resolved, Box::new(FsConfig::new(dir.clone()))) {
        Ok(app) => app,
        Err(e) => {
            error!("Startup failed: {}", e);
            eprintln!("mongui: {e}");
            std::process::exit(1);
        }
    };

    tui::run(app, store).map_err(std::io::Error::other)
}

/// Where to log and how much: `--log-file` or `mongui.log` in the config
/// dir, at the resolved level or `Debug`.
fn log_target(dir: &Path, file: Option<PathBuf>, level: Option<&str>) -> (PathBuf, LevelFilter) {
    let level = level
        .and_then(|level| level.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Debug);
    (file.unwrap_or_else(|| dir.join("mongui.log")), level)
}

fn init_logger(dir: &Path, file: Option<PathBuf>, level: Option<&str>) {
    let (path, level) = log_target(dir, file, level);
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create(&path) {
        let _ = WriteLogger::init(level, log_config, log_file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_goes_to_config_dir_by_default() {
        let dir = Path::new("/tmp/mongui-config");
        assert_eq!(
            log_target(dir, None, None),
            (dir.join("mongui.log"), LevelFilter::Debug)
        );
        assert_eq!(
            log_target(dir, Some(PathBuf::from("/var/log/m.log")), Some("warn")),
            (PathBuf::from("/var/log/m.log"), LevelFilter::Warn)
        );
        assert_eq!(log_target(dir, None, Some("loud")).1, LevelFilter::Debug);
    }
}
