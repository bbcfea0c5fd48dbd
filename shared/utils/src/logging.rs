use anyhow::{Context, Result};
use std::sync::Mutex;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LoggingConfig;

/// Installs the global subscriber. `RUST_LOG` takes precedence over the
/// configured level. Fails if a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    let file = match &config.file_path {
        Some(file_path) => Some(Mutex::new(
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file_path)
                .with_context(|| format!("opening log file {}", file_path))?,
        )),
        None => None,
    };

    match (config.format.as_str(), file) {
        ("json", Some(file)) => registry
            .with(
                fmt::layer()
                    .json()
                    .with_span_events(FmtSpan::CLOSE)
                    .with_writer(file),
            )
            .try_init()?,
        ("json", None) => registry
            .with(fmt::layer().json().with_span_events(FmtSpan::CLOSE))
            .try_init()?,
        (_, Some(file)) => registry
            .with(
                fmt::layer()
                    .with_span_events(FmtSpan::CLOSE)
                    .with_ansi(false)
                    .with_writer(file),
            )
            .try_init()?,
        (_, None) => registry
            .with(fmt::layer().with_span_events(FmtSpan::CLOSE))
            .try_init()?,
    }

    tracing::info!(level = %config.level, format = %config.format, "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwritable_log_file_is_reported() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
            file_path: Some("/nonexistent-dir/finrisk/test.log".to_string()),
        };
        let err = init_logging(&config).unwrap_err();
        assert!(err.to_string().contains("opening log file"));
    }

    #[test]
    fn test_file_logging_installs_once() {
        let path = std::env::temp_dir().join(format!("finrisk-{}.log", std::process::id()));
        let config = LoggingConfig {
            level: "info".to_string(),
            format: "json".to_string(),
            file_path: Some(path.to_string_lossy().into_owned()),
        };

        init_logging(&config).unwrap();
        assert!(path.exists());

        let err = init_logging(&config).unwrap_err();
        assert!(!err.to_string().contains("opening log file"));
        let _ = std::fs::remove_file(&path);
    }
}
