//! Logging setup for programs embedding brope, with file output and optional stdout.
//!
//! Logs always go to a file at `warn` level (or higher if `BROPE_LOG` is set).
//! Stdout logging is enabled when `BROPE_LOG` or `RUST_LOG` is set, or in debug builds.
//!
//! ## Environment Variables
//!
//! 1. **`BROPE_LOG`** (highest priority) - brope-specific logging control
//! 2. **`RUST_LOG`** - Standard tracing environment variable
//! 3. **Default** - `warn` globally, `info` for brope crates
//!
//! ## Log File Location
//!
//! Default: `<data_local_dir>/brope/logs/brope-<pid>.log`
//! - macOS: `~/Library/Application Support/brope/logs/brope-12345.log`
//! - Linux: `~/.local/share/brope/logs/brope-12345.log`
//!
//! Override with [`LogConfig::log_file_path`] or `BROPE_LOG_FILE`.

use std::{
    env,
    path::{Path, PathBuf},
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Crates whose level `BROPE_LOG=<level>` controls.
const CRATES: &[&str] = &["brope", "brope_text"];

/// Returned from [`init`]; must be held alive to ensure log file flushing.
pub struct LogGuard {
    _file_guard: WorkerGuard,
    pub log_file: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// A file path, or a directory to place `brope-<pid>.log` in.
    pub log_file_path: Option<PathBuf>,
}

/// Initialize logging.
///
/// This function respects the environment variable priority described in the module docs:
/// `BROPE_LOG` > `RUST_LOG` > default settings.
///
/// The returned [`LogGuard`] must be held for the lifetime of the program --
/// dropping it flushes and stops the background file writer.
///
/// Fails if a global subscriber is already installed.
pub fn init(config: LogConfig) -> Result<LogGuard, BoxError> {
    let override_path = config
        .log_file_path
        .or_else(|| env::var_os("BROPE_LOG_FILE").map(PathBuf::from));
    let (log_dir, filename) = resolve_log_path(override_path);

    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::never(&log_dir, &filename);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_filter(create_file_filter());

    let stdout_enabled =
        env::var("BROPE_LOG").is_ok() || env::var("RUST_LOG").is_ok() || cfg!(debug_assertions);

    let stdout_layer = if stdout_enabled {
        Some(fmt::layer().with_filter(create_filter()))
    } else {
        None
    };

    Registry::default()
        .with(file_layer)
        .with(stdout_layer)
        .try_init()?;

    Ok(LogGuard {
        _file_guard: file_guard,
        log_file: log_dir.join(filename),
    })
}

/// Initialize logging for tests.
///
/// Stdout-only (no file output), captured by the test harness. Will not crash if
/// called multiple times or if logging is already initialized by another test.
pub fn test() {
    let _ = fmt()
        .with_env_filter(create_filter())
        .with_test_writer()
        .try_init();
}

fn resolve_log_path(override_path: Option<PathBuf>) -> (PathBuf, String) {
    let filename = format!("brope-{}.log", std::process::id());

    if let Some(path) = override_path {
        if path.extension().is_some() {
            let dir = path
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or(filename);
            return (dir.to_path_buf(), name);
        }
        return (path, filename);
    }

    let dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("brope")
        .join("logs");

    (dir, filename)
}

/// File filter: uses user-specified level if set, otherwise defaults to `warn`.
fn create_file_filter() -> EnvFilter {
    if env::var("BROPE_LOG").is_ok() || env::var("RUST_LOG").is_ok() {
        return create_filter();
    }
    EnvFilter::new("warn")
}

/// Create the appropriate [`EnvFilter`] based on environment variables.
///
/// Implements the priority system: `BROPE_LOG` > `RUST_LOG` > defaults.
fn create_filter() -> EnvFilter {
    if let Ok(brope_log) = env::var("BROPE_LOG") {
        return expand_brope_log(&brope_log);
    }

    if let Ok(rust_log) = env::var("RUST_LOG") {
        return EnvFilter::new(rust_log);
    }

    EnvFilter::new(expand_level("info"))
}

/// Expand `BROPE_LOG` values into full tracing filter strings.
///
/// - `BROPE_LOG=debug` becomes `warn,brope=debug,brope_text=debug`
/// - `BROPE_LOG=brope=trace` is used as-is (advanced syntax)
fn expand_brope_log(brope_log: &str) -> EnvFilter {
    if brope_log.contains('=') || brope_log.contains(':') || brope_log.contains(',') {
        return EnvFilter::new(brope_log);
    }
    EnvFilter::new(expand_level(brope_log))
}

fn expand_level(level: &str) -> String {
    let mut directives = String::from("warn");
    for name in CRATES {
        directives.push_str(&format!(",{name}={level}"));
    }
    directives
}
