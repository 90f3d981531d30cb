#![deny(missing_docs)]
//! Logging for the Sendoc crates.
//!
//! Every crate logs through the `sendoc_*` macros below. They expand to the
//! `log` facade re-exported from here, so callers need no `log` dependency of
//! their own. The binary picks where records go with [`initialize`]; tests use
//! [`initialize_for_tests`].

use std::fs::File;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

#[doc(hidden)]
pub use log as __log;

/// File used when no explicit log path is configured.
pub const DEFAULT_LOG_FILE: &str = "sendoc.log";

/// Per-chunk stream detail.
#[macro_export]
macro_rules! sendoc_trace {
    ($($arg:tt)*) => { $crate::__log::trace!($($arg)*) };
}

/// Request-level detail, shown with `--verbose`.
#[macro_export]
macro_rules! sendoc_debug {
    ($($arg:tt)*) => { $crate::__log::debug!($($arg)*) };
}

/// Lifecycle events worth keeping in the log file.
#[macro_export]
macro_rules! sendoc_info {
    ($($arg:tt)*) => { $crate::__log::info!($($arg)*) };
}

/// Recoverable problems: failed requests, unreadable state files.
#[macro_export]
macro_rules! sendoc_warn {
    ($($arg:tt)*) => { $crate::__log::warn!($($arg)*) };
}

/// Failures the app cannot work around.
#[macro_export]
macro_rules! sendoc_error {
    ($($arg:tt)*) => { $crate::__log::error!($($arg)*) };
}

/// Where [`initialize`] sends records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogDestination {
    /// Log file only; keeps the chat transcript on stdout clean.
    File,
    /// Stderr only.
    Terminal,
    /// Log file and stderr.
    Both,
}

/// Installs the global logger.
///
/// `log_file` falls back to [`DEFAULT_LOG_FILE`] in the working directory.
/// A log file that cannot be created is reported on stderr and skipped.
/// Only the first call in a process takes effect.
pub fn initialize(destination: LogDestination, level: LevelFilter, log_file: Option<&Path>) {
    let config = record_config();
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();

    if destination != LogDestination::File {
        loggers.push(TermLogger::new(
            level,
            config.clone(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ));
    }
    if destination != LogDestination::Terminal {
        let path = log_file.map_or_else(|| PathBuf::from(DEFAULT_LOG_FILE), Path::to_path_buf);
        if let Some(logger) = open_file_logger(level, config, &path) {
            loggers.push(logger);
        }
    }

    if !loggers.is_empty() {
        let _ = CombinedLogger::init(loggers);
    }
}

/// Terminal logger for tests: debug level in debug builds, info otherwise.
///
/// Safe to call from every test; later calls are no-ops.
pub fn initialize_for_tests() {
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

/// HTTP internals are noise at any level we use.
fn record_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .add_filter_ignore_str("hyper")
        .add_filter_ignore_str("reqwest")
        .add_filter_ignore_str("rustls")
        .build()
}

fn open_file_logger(
    level: LevelFilter,
    config: Config,
    path: &Path,
) -> Option<Box<WriteLogger<File>>> {
    File::create(path)
        .map(|file| WriteLogger::new(level, config, file))
        .map_err(|err| eprintln!("sendoc: not logging to {}: {err}", path.display()))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_directory_skips_file_logger() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("absent").join("sendoc.log");
        assert!(open_file_logger(LevelFilter::Info, record_config(), &path).is_none());
    }

    #[test]
    fn file_logger_creates_its_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("sendoc.log");
        assert!(open_file_logger(LevelFilter::Info, record_config(), &path).is_some());
        assert!(path.is_file());
    }

    #[test]
    fn macros_expand_without_a_direct_log_import() {
        initialize_for_tests();
        sendoc_debug!("debug {}", 1);
        sendoc_info!("info");
    }
}
