// ── Core error types ──
//
// Errors surfaced by the connector core. Catalog transport failures are
// translated from `zwdc_api::Error`; a missing device type is its own
// variant so callers can decide whether to auto-create.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Catalog errors ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Catalog unreachable: {message}")]
    CatalogUnavailable { message: String },

    #[error("Catalog request failed (HTTP {status}): {message}")]
    Catalog { status: u16, message: String },

    #[error("Unexpected catalog response: {message}")]
    InvalidResponse { message: String },

    #[error("No matching device type found: mapping-key={key}")]
    NoMatchingDeviceType {
        key: String,
        /// Whether the list searched came from the fallback store.
        used_fallback: bool,
    },

    // ── Fallback store ───────────────────────────────────────────────
    #[error("Fallback store error: {message}")]
    Fallback { message: String },

    // ── Registry / event errors ──────────────────────────────────────
    #[error("Unknown device: {node_id}")]
    UnknownDevice { node_id: i64 },

    #[error("Invalid payload: {message}")]
    InvalidPayload { message: String },

    // ── Boundary errors ──────────────────────────────────────────────
    #[error("Gateway error: {message}")]
    Gateway { message: String },

    #[error("Z-Wave controller error: {message}")]
    Controller { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// True for the "catalog has no such type" outcome of a resolve.
    pub fn is_no_match(&self) -> bool {
        matches!(self, Self::NoMatchingDeviceType { .. })
    }

    pub fn gateway(message: impl Into<String>) -> Self {
        Self::Gateway {
            message: message.into(),
        }
    }

    pub fn controller(message: impl Into<String>) -> Self {
        Self::Controller {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<zwdc_api::Error> for CoreError {
    fn from(err: zwdc_api::Error) -> Self {
        match err {
            zwdc_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            zwdc_api::Error::Transport(e) => CoreError::CatalogUnavailable {
                message: e.to_string(),
            },
            zwdc_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid URL: {e}"),
            },
            zwdc_api::Error::Tls(message) => CoreError::Config { message },
            zwdc_api::Error::Api { status, message } => CoreError::Catalog { status, message },
            zwdc_api::Error::Deserialization { message, .. } => {
                CoreError::InvalidResponse { message }
            }
        }
    }
}
