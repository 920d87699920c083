//! Diagnostic log for the library's own failures
//!
//! Background rotation errors and stack-discontinuity resets must never reach
//! the caller of a log method, but silently dropping them hides real bugs.
//! They go to a plain file instead: `<temp_dir>/nestlog-diagnostics.log`.
//!
//! Disabled unless `NESTLOG_DEBUG` is `1` or `true`. `NESTLOG_LOG_LEVEL`
//! (`trace|debug|info|warn|error`) sets the minimum level, default `debug`.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::level::Level;

struct DiagnosticState {
    file: Option<File>,
    min_level: Level,
    enabled: bool,
}

impl DiagnosticState {
    fn from_env() -> Self {
        let enabled = std::env::var("NESTLOG_DEBUG")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let min_level = std::env::var("NESTLOG_LOG_LEVEL")
            .ok()
            .and_then(|v| v.parse::<Level>().ok())
            .unwrap_or(Level::Debug);

        let file = if enabled {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file_path())
                .ok()
        } else {
            None
        };

        Self {
            file,
            min_level,
            enabled,
        }
    }

    fn write(&mut self, level: Level, module: &str, message: &str) {
        if !self.enabled || !level.passes(self.min_level) {
            return;
        }

        if let Some(ref mut file) = self.file {
            let timestamp = chrono::Local::now().format("%H:%M:%S%.3f");
            let _ = writeln!(file, "[{}] [{:<5}] [{}] {}", timestamp, level.as_str(), module, message);
            let _ = file.flush();
        }
    }
}

static STATE: Lazy<Mutex<DiagnosticState>> = Lazy::new(|| Mutex::new(DiagnosticState::from_env()));

/// Record a diagnostic at the given level
pub fn log(level: Level, module: &str, message: &str) {
    STATE.lock().write(level, module, message);
}

pub fn trace(module: &str, message: &str) {
    log(Level::Trace, module, message);
}

pub fn debug(module: &str, message: &str) {
    log(Level::Debug, module, message);
}

pub fn info(module: &str, message: &str) {
    log(Level::Info, module, message);
}

pub fn warn(module: &str, message: &str) {
    log(Level::Warn, module, message);
}

pub fn error(module: &str, message: &str) {
    log(Level::Error, module, message);
}

/// Whether diagnostics are currently being recorded
pub fn is_enabled() -> bool {
    STATE.lock().enabled
}

/// Path of the diagnostic log file
pub fn log_file_path() -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push("nestlog-diagnostics.log");
    path
}

#[macro_export]
macro_rules! diag_trace {
    ($($arg:tt)*) => {
        $crate::diagnostics::trace(module_path!(), &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! diag_debug {
    ($($arg:tt)*) => {
        $crate::diagnostics::debug(module_path!(), &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! diag_info {
    ($($arg:tt)*) => {
        $crate::diagnostics::info(module_path!(), &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! diag_warn {
    ($($arg:tt)*) => {
        $crate::diagnostics::warn(module_path!(), &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! diag_error {
    ($($arg:tt)*) => {
        $crate::diagnostics::error(module_path!(), &format!($($arg)*))
    };
}
