// ── Core error types ──
//
// Errors surfaced by a discovery refresh. Consumers never match on
// reqwest or serde failures directly; the `From<tailfire_api::Error>`
// impl folds transport-layer errors into these variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to Tailscale API at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Tailscale API request timed out")]
    Timeout,

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Malformed device list: {message}")]
    Decode { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<tailfire_api::Error> for CoreError {
    fn from(err: tailfire_api::Error) -> Self {
        match err {
            tailfire_api::Error::Unauthorized { status, message } => {
                CoreError::AuthenticationFailed {
                    message: format!("HTTP {status}: {message}"),
                }
            }
            tailfire_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), |u| u.origin().ascii_serialization()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            tailfire_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            tailfire_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            tailfire_api::Error::Deserialization { message, body: _ } => {
                CoreError::Decode { message }
            }
        }
    }
}

impl CoreError {
    /// HTTP status code returned by the upstream API, if any.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => *status,
            _ => None,
        }
    }
}
