//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use zwdc_config::ConfigError;
use zwdc_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration file not found: {path}")]
    #[diagnostic(
        code(zwdc::no_config),
        help("Pass the connector config with --config or set ZWDC_CONFIG.")
    )]
    NoConfig { path: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(zwdc::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(zwdc::config))]
    Config(ConfigError),

    // ── Remote services ──────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(zwdc::auth_failed),
        help("Check auth_endpoint, auth_client_id, auth_username and auth_password.")
    )]
    AuthFailed { message: String },

    #[error("Catalog unreachable: {message}")]
    #[diagnostic(
        code(zwdc::connection_failed),
        help("Check device_repository_url and device_manager_url, or use --fallback.")
    )]
    ConnectionFailed { message: String },

    #[error("No device type matches '{key}'")]
    #[diagnostic(
        code(zwdc::not_found),
        help("Run: zwdc types list to see the integration's device types")
    )]
    NotFound { key: String },

    #[error(transparent)]
    #[diagnostic(code(zwdc::core))]
    Core(CoreError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(zwdc::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::NoConfig { .. } | Self::Validation { .. } | Self::Config(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotFound { path } => CliError::NoConfig {
                path: path.display().to_string(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::CatalogUnavailable { message } | CoreError::Fallback { message } => {
                CliError::ConnectionFailed { message }
            }
            CoreError::NoMatchingDeviceType { key, .. } => CliError::NotFound { key },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            other => CliError::Core(other),
        }
    }
}

impl From<zwdc_api::Error> for CliError {
    fn from(err: zwdc_api::Error) -> Self {
        CoreError::from(err).into()
    }
}
