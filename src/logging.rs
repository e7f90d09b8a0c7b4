//! Logging setup
//!
//! `RUST_LOG` takes precedence over the configured level. `format = "json"`
//! selects structured JSON output; anything else uses the pretty formatter.

use std::sync::Mutex;
use thiserror::Error;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

use crate::config::LoggingConfig;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Failed to open log file {path}: {error}")]
    File {
        path: String,
        error: std::io::Error,
    },

    #[error("Failed to install subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Filter directive for a configured level
pub fn filter_directive(config: &LoggingConfig) -> String {
    format!("clinic_portal={}", config.level)
}

/// Install the global subscriber
pub fn init(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(config)));

    let writer = match &config.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|error| LoggingError::File {
                    path: path.clone(),
                    error,
                })?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };
    let ansi = config.file.is_none();

    let layer: BoxedLayer = if config.format == "json" {
        fmt::layer()
            .json()
            .with_writer(writer)
            .with_filter(filter)
            .boxed()
    } else {
        fmt::layer()
            .with_ansi(ansi)
            .with_writer(writer)
            .with_filter(filter)
            .boxed()
    };

    tracing_subscriber::registry().with(layer).try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            ..LoggingConfig::default()
        };
        assert_eq!(filter_directive(&config), "clinic_portal=debug");
    }

    #[test]
    fn test_unwritable_log_file() {
        let config = LoggingConfig {
            file: Some("/nonexistent-dir/portal.log".to_string()),
            ..LoggingConfig::default()
        };
        assert!(matches!(init(&config), Err(LoggingError::File { .. })));
    }
}
