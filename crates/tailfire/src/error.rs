//! Binary error type with miette diagnostics.
//!
//! Wraps config, discovery and server failures with help text and maps
//! each one to a process exit code.

use std::net::SocketAddr;

use miette::Diagnostic;
use thiserror::Error;

use tailfire_config::ConfigError;
use tailfire_core::CoreError;

/// Process exit codes. Usage errors exit with 2 from clap itself.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const CONFIG: i32 = 3;
    pub const UPSTREAM: i32 = 4;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(tailfire::config),
        help(
            "Check config.yaml (or the file passed with --config) and TAILFIRE_* variables.\n\
             Run: tailfire check"
        )
    )]
    Config(#[from] ConfigError),

    #[error("Could not build the Tailscale client: {0}")]
    #[diagnostic(code(tailfire::client))]
    Client(#[from] tailfire_api::Error),

    // ── Upstream ─────────────────────────────────────────────────────
    #[error("Discovery refresh failed: {0}")]
    #[diagnostic(
        code(tailfire::discovery),
        help("Verify api_url, tailnet and that the api_token is still valid.")
    )]
    Discovery(#[from] CoreError),

    // ── Server ───────────────────────────────────────────────────────
    #[error("Could not bind {addr}")]
    #[diagnostic(
        code(tailfire::bind),
        help("Pick another port with --port or free {addr}.")
    )]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    #[diagnostic(code(tailfire::server))]
    Server(#[source] std::io::Error),

    #[error("Metrics registry setup failed: {0}")]
    #[diagnostic(code(tailfire::metrics))]
    Metrics(#[from] prometheus::Error),

    // ── Output ───────────────────────────────────────────────────────
    #[error("Could not encode target groups: {0}")]
    #[diagnostic(code(tailfire::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Client(_) => exit_code::CONFIG,
            Self::Discovery(_) => exit_code::UPSTREAM,
            Self::Bind { .. } | Self::Server(_) | Self::Metrics(_) | Self::Json(_) => {
                exit_code::GENERAL
            }
        }
    }
}
