// src/logging.rs
use chrono::Local;
use log::LevelFilter;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::APP_NAME;

/// Where the interactive view logs when no `--log-file` is given.
pub fn default_log_path() -> PathBuf {
    let file_name = format!("{}.log", APP_NAME);
    dirs::data_dir()
        .map(|dir| dir.join(APP_NAME).join(&file_name))
        .unwrap_or_else(|| PathBuf::from(file_name))
}

/// File logger for the interactive view, which owns the terminal.
pub fn init_file_logger(path: &Path, level: LevelFilter) -> Result<(), fern::InitError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .level_for("hyper_util", LevelFilter::Warn)
        .level_for("reqwest", LevelFilter::Warn)
        .chain(fern::log_file(path)?)
        .apply()?;
    Ok(())
}

/// Stderr logger for one-shot commands; `RUST_LOG` overrides `level`.
pub fn init_stderr_logger(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    env_logger::Builder::new().filter_level(level).parse_default_env().try_init()
}
