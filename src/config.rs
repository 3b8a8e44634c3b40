//! Configuration loading via `ortho-config`.

use std::ffi::OsString;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::poller::{DEFAULT_POLL_ATTEMPTS, PollSettings};

/// Display name used in usage output when none is configured.
pub const DEFAULT_COMMAND_NAME: &str = "rename-pvc";

/// Log filter applied when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "rename_pvc=warn";

/// Tool settings merged from defaults, configuration files, and environment
/// variables.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "RENAME_PVC",
    discovery(
        app_name = "rename-pvc",
        env_var = "RENAME_PVC_CONFIG_PATH",
        config_file_name = "rename-pvc.toml",
        dotfile_name = ".rename-pvc.toml",
        project_file_name = "rename-pvc.toml"
    )
)]
pub struct RenameConfig {
    /// Name shown in usage output, for example `kubectl rename-pvc` when
    /// installed as a kubectl plugin.
    #[ortho_config(default = DEFAULT_COMMAND_NAME.to_owned())]
    pub command_name: String,
    /// Delay between two reads of the replacement claim, in milliseconds.
    #[ortho_config(default = 1000)]
    pub poll_interval_ms: u64,
    /// Number of reads of the replacement claim before giving up.
    #[ortho_config(default = DEFAULT_POLL_ATTEMPTS)]
    pub poll_attempts: u32,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    #[ortho_config(default = DEFAULT_LOG_FILTER.to_owned())]
    pub log_filter: String,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }

    fn missing(&self) -> ConfigError {
        ConfigError::MissingField(format!(
            "missing {}: set {} or add {} to rename-pvc.toml",
            self.description, self.env_var, self.toml_key
        ))
    }

    fn zero(&self) -> ConfigError {
        ConfigError::InvalidValue(format!(
            "{} must be greater than zero: set {} or {} in rename-pvc.toml",
            self.description, self.env_var, self.toml_key
        ))
    }
}

const COMMAND_NAME: FieldMetadata =
    FieldMetadata::new("command name", "RENAME_PVC_COMMAND_NAME", "command_name");
const POLL_INTERVAL: FieldMetadata = FieldMetadata::new(
    "poll interval",
    "RENAME_PVC_POLL_INTERVAL_MS",
    "poll_interval_ms",
);
const POLL_ATTEMPTS: FieldMetadata =
    FieldMetadata::new("poll attempts", "RENAME_PVC_POLL_ATTEMPTS", "poll_attempts");
const LOG_FILTER: FieldMetadata =
    FieldMetadata::new("log filter", "RENAME_PVC_LOG_FILTER", "log_filter");

impl RenameConfig {
    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from(DEFAULT_COMMAND_NAME)])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation. Error messages name the environment
    /// variable and the TOML key that fix the problem.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] for blank strings and
    /// [`ConfigError::InvalidValue`] for zero timings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.command_name.trim().is_empty() {
            return Err(COMMAND_NAME.missing());
        }
        if self.poll_interval_ms == 0 {
            return Err(POLL_INTERVAL.zero());
        }
        if self.poll_attempts == 0 {
            return Err(POLL_ATTEMPTS.zero());
        }
        if self.log_filter.trim().is_empty() {
            return Err(LOG_FILTER.missing());
        }
        Ok(())
    }

    /// Returns the bind wait timing described by this configuration.
    #[must_use]
    pub const fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(self.poll_interval_ms),
            attempts: self.poll_attempts,
        }
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a numeric setting is out of range.
    #[error("invalid configuration value: {0}")]
    InvalidValue(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
