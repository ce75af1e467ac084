// File logger
// The terminal owns stdout while the game runs, so log records go to a file instead

use chrono::Local;
use directories::ProjectDirs;
use log::{LevelFilter, Metadata, Record};
use std::env;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::msw_config::APP_NAME;

struct FileLogger {
    file: Mutex<File>,
}

impl log::Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(
                file,
                "{} {:<5} {} - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

/// Log file location: the per-user data directory, or the current directory
pub fn log_path() -> PathBuf {
    let name = format!("{}.log", APP_NAME);
    match ProjectDirs::from("com", "mswpr", APP_NAME) {
        Some(proj) => proj.data_dir().join(name),
        None => PathBuf::from(name),
    }
}

/// Pick the level from `MSWPR_LOG`, then the configured level, then `info`
pub fn resolve_level(env_level: Option<&str>, configured: &str) -> LevelFilter {
    env_level
        .and_then(|lvl| lvl.parse().ok())
        .or_else(|| configured.parse().ok())
        .unwrap_or(LevelFilter::Info)
}

/// Install the file logger. Logging is best-effort: failures leave it disabled.
pub fn init_logging(configured: &str) {
    let level = resolve_level(env::var("MSWPR_LOG").ok().as_deref(), configured);
    if level == LevelFilter::Off {
        return;
    }
    let path = log_path();
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let logger = FileLogger {
        file: Mutex::new(file),
    };
    if log::set_boxed_logger(Box::new(logger)).is_ok() {
        log::set_max_level(level);
        log::info!("{} {} started, logging at {}", APP_NAME, env!("CARGO_PKG_VERSION"), level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_level_wins_over_config() {
        assert_eq!(resolve_level(Some("debug"), "warn"), LevelFilter::Debug);
    }

    #[test]
    fn invalid_levels_fall_back() {
        assert_eq!(resolve_level(Some("loud"), "trace"), LevelFilter::Trace);
        assert_eq!(resolve_level(None, "nonsense"), LevelFilter::Info);
        assert_eq!(resolve_level(None, "off"), LevelFilter::Off);
    }
}
