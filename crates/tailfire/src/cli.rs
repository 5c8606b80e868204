//! Clap derive structures for the `tailfire` binary.
//!
//! Kept free of workspace imports: `build.rs` compiles this file on its own
//! to render man pages and shell completions.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// tailfire -- Prometheus HTTP service discovery for Tailscale
#[derive(Debug, Parser)]
#[command(
    name = "tailfire",
    version,
    about = "Prometheus HTTP service discovery for Tailscale tailnets",
    long_about = "Serves the devices of a Tailscale tailnet as Prometheus HTTP SD target groups.\n\n\
        Each scrape of /prometheus/targets fetches the device list from the\n\
        Tailscale API. Runs `serve` when no subcommand is given.",
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Option<Command>,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (YAML or TOML); defaults to ./config.yaml
    #[arg(long, short = 'c', env = "TAILFIRE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format
    #[arg(
        long,
        env = "TAILFIRE_LOG_FORMAT",
        default_value = "text",
        global = true
    )]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the discovery server (default)
    Serve(ServeArgs),

    /// Validate the configuration and print it with the token redacted
    Check,

    /// Run one discovery refresh and print the target groups as JSON
    Targets,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Default, Args)]
pub struct ServeArgs {
    /// Port to listen on (overrides the config file)
    #[arg(long, short = 'p')]
    pub port: Option<u16>,

    /// Address to bind (overrides the config file)
    #[arg(long)]
    pub listen: Option<IpAddr>,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
