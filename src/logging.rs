//! Diagnostic logging setup.
//!
//! Logs go to stderr so they never interleave with the progress lines and the
//! confirmation prompt on stdout.

use std::io;

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Errors raised while installing the subscriber.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum LoggingError {
    /// The configured filter directive does not parse.
    #[error("invalid log filter '{filter}': {message}")]
    InvalidFilter {
        /// Directive that was rejected.
        filter: String,
        /// Parser message.
        message: String,
    },
}

/// Builds the filter, preferring `RUST_LOG` over `fallback`.
///
/// # Errors
///
/// Returns [`LoggingError::InvalidFilter`] when `RUST_LOG` is unset and
/// `fallback` does not parse.
pub fn build_filter(fallback: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(fallback).map_err(|err| LoggingError::InvalidFilter {
            filter: fallback.to_owned(),
            message: err.to_string(),
        })
    })
}

/// Installs the global subscriber writing to stderr.
///
/// Only the first call installs anything; later calls return `Ok(())`.
///
/// # Errors
///
/// Returns [`LoggingError::InvalidFilter`] when the filter does not parse.
pub fn init_logging(fallback: &str) -> Result<(), LoggingError> {
    let filter = build_filter(fallback)?;
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .try_init();
    if installed.is_err() {
        tracing::debug!("logging already initialised");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_initialisation_is_harmless() {
        assert_eq!(init_logging("rename_pvc=debug"), Ok(()));
        assert_eq!(init_logging("rename_pvc=debug"), Ok(()));
    }

    #[test]
    fn rejects_malformed_fallback_without_env_override() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let result = build_filter("rename_pvc=loudest");
        assert!(
            matches!(result, Err(LoggingError::InvalidFilter { ref filter, .. }) if filter == "rename_pvc=loudest"),
            "unexpected outcome: {result:?}"
        );
    }
}
