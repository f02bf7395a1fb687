//! Tracing subscriber setup.
//!
//! Library code logs through both `tracing` and the `log` facade; the
//! `LogTracer` bridge forwards `log` records into the subscriber installed
//! here. `RUST_LOG` takes precedence over the configured level.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing::Subscriber;
use tracing_log::LogTracer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use crate::config::LogSettings;
use crate::error::LoggingError;

/// Installs the global subscriber.
///
/// Returns `Ok(false)` when a subscriber was already installed, which is
/// the case when the library is embedded in a host that configures its own.
pub fn init(settings: &LogSettings) -> Result<bool, LoggingError> {
    let _ = LogTracer::init();

    let subscriber = build_subscriber(settings)?;
    Ok(tracing::subscriber::set_global_default(subscriber).is_ok())
}

/// Builds the subscriber without installing it.
pub fn build_subscriber(
    settings: &LogSettings,
) -> Result<impl Subscriber + Send + Sync, LoggingError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));

    let console_layer = fmt::layer().with_target(false).compact();

    let file_layer = match &settings.file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|source| LoggingError::OpenFile {
                    path: path.clone(),
                    source,
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LoggingError::OpenFile {
                    path: path.clone(),
                    source,
                })?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    Ok(Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_file_layer_writes_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("mailsweep.log");
        let settings = LogSettings {
            level: "info".to_string(),
            file: Some(path.clone()),
        };

        let subscriber = build_subscriber(&settings).unwrap();
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("scan finished");
        });

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("scan finished"));
    }

    #[test]
    fn test_unwritable_log_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened as a log file.
        let settings = LogSettings {
            level: "info".to_string(),
            file: Some(PathBuf::from(dir.path())),
        };

        let result = build_subscriber(&settings);
        assert!(matches!(result, Err(LoggingError::OpenFile { .. })));
    }
}
