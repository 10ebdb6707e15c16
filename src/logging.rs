//! Logging configuration for LitCode

use std::path::Path;

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

use crate::Result;

const LOGS_DIR: &str = "logs";
const LOG_FILE_PREFIX: &str = "litcode.log";

/// Initialize logging system with file output
pub fn init_logging() -> Result<()> {
    init_logging_with_config(None)
}

/// Initialize logging with configuration
pub fn init_logging_with_config(config: Option<&crate::config::AppConfig>) -> Result<()> {
    let env_filter = if let Some(config) = config {
        filter_for_level(&config.logging.level)
    } else {
        // Fallback to environment variable or default
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,litcode=debug"))
    };

    let level = config.map_or("info", |c| c.logging.level.as_str());
    install(env_filter, level)
}

/// Initialize logging with custom log level
pub fn init_logging_with_level(level: &str) -> Result<()> {
    install(filter_for_level(level), level)
}

/// Export `RUST_BACKTRACE=1` when `logging.backtrace` is set
///
/// An explicit `RUST_BACKTRACE` in the environment always wins.
pub fn apply_backtrace_setting(config: &crate::config::LoggingConfig) {
    let current = std::env::var("RUST_BACKTRACE").ok();
    if let Some(value) = backtrace_override(config.backtrace, current.as_deref()) {
        std::env::set_var("RUST_BACKTRACE", value);
    }
}

fn backtrace_override(enabled: bool, current: Option<&str>) -> Option<&'static str> {
    (enabled && current.is_none()).then_some("1")
}

fn filter_for_level(level: &str) -> EnvFilter {
    EnvFilter::new(format!("{level},litcode={level}"))
}

fn install(env_filter: EnvFilter, level: &str) -> Result<()> {
    let logs_dir = Path::new(LOGS_DIR);
    if !logs_dir.exists() {
        std::fs::create_dir_all(logs_dir)?;
    }

    let file_appender = tracing_appender::rolling::daily(LOGS_DIR, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(non_blocking)
        .with_ansi(false); // No colors in file

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| crate::LitCodeError::Custom(format!("Failed to install logger: {e}")))?;

    tracing::info!("Logging initialized with level: {level} - console and file output enabled");
    tracing::debug!("Log files will be saved to: {LOGS_DIR}/{LOG_FILE_PREFIX}.YYYY-MM-DD");

    // The writer thread must outlive every span, including ones closed at exit
    std::mem::forget(guard);

    Ok(())
}

/// Initialize simple logging for testing
pub fn init_simple_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(true)
        .with_max_level(tracing::Level::INFO)
        .try_init()
        .map_err(|e| crate::LitCodeError::Custom(format!("Failed to install logger: {e}")))?;

    tracing::info!("Simple logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_initialization() {
        // A second install in the same process reports an error instead of panicking
        let _ = init_simple_logging();
        assert!(init_simple_logging().is_err());
    }

    #[test]
    fn test_filter_for_level() {
        let filter = filter_for_level("warn");
        assert!(filter.to_string().contains("litcode=warn"));
    }

    #[test]
    fn test_backtrace_override() {
        assert_eq!(backtrace_override(true, None), Some("1"));
        assert_eq!(backtrace_override(true, Some("0")), None);
        assert_eq!(backtrace_override(false, None), None);
    }
}
