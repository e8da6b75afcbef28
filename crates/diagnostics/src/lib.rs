//! Logging setup shared by the site generator crates.
//!
//! Usage:
//! - Set SITEGEN_LOG=off - no logs
//! - Set SITEGEN_LOG=warn (default) - recoverable problems only
//! - Set SITEGEN_LOG=info - build progress (pages written, files copied)
//! - Set SITEGEN_LOG=debug - per-page and per-file detail

use std::sync::Once;

// Re-export emit so macros can use it
pub use emit;

/// Environment variable holding the log threshold.
pub const LOG_ENV: &str = "SITEGEN_LOG";

/// Threshold used when SITEGEN_LOG is unset.
pub const DEFAULT_LEVEL: &str = "warn";

static INIT: Once = Once::new();

/// Threshold parsed from a `SITEGEN_LOG` style value.
///
/// `None` means logging is off.
fn parse_level(value: &str) -> Result<Option<emit::Level>, ()> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "off" => Ok(None),
        "debug" => Ok(Some(emit::Level::Debug)),
        "info" => Ok(Some(emit::Level::Info)),
        "warn" => Ok(Some(emit::Level::Warn)),
        "error" => Ok(Some(emit::Level::Error)),
        _ => Err(()),
    }
}

/// Initialize diagnostics from the SITEGEN_LOG environment variable.
///
/// Safe to call multiple times; only the first call has an effect.
pub fn init_diagnostics() {
    init_with(&level_or_default(std::env::var(LOG_ENV).ok()));
}

fn level_or_default(value: Option<String>) -> String {
    value.unwrap_or_else(|| DEFAULT_LEVEL.to_string())
}

/// Initialize diagnostics with an explicit threshold (e.g. from `--verbose`).
///
/// Unknown values fall back to `info`.
pub fn init_with(value: &str) {
    INIT.call_once(|| {
        let level = match parse_level(value) {
            Ok(None) => return,
            Ok(Some(level)) => level,
            Err(()) => {
                // Bootstrap warning, emitted before the runtime exists
                eprintln!("Warning: Unknown {} value '{}', using 'info'", LOG_ENV, value);
                emit::Level::Info
            }
        };

        let rt = emit::setup()
            .emit_to(emit_term::stderr())
            .emit_when(emit::level::min_filter(level))
            .init();

        // The runtime lives for the whole process.
        std::mem::forget(rt);
    });
}

/// Log build progress (pages rendered, files copied).
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Log per-item detail useful when a build misbehaves.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Log recoverable problems (missing partials, skipped sources).
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

/// Log failures that abort a build.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}

/// Short form of [`log_info!`].
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Short form of [`log_debug!`].
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Short form of [`log_warn!`].
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

/// Short form of [`log_error!`].
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}

pub use init_diagnostics as init;
