mod cli;
mod error;
mod server;

use std::sync::Arc;

use clap::{CommandFactory, Parser};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use tailfire_api::{TailscaleClient, TransportConfig};
use tailfire_config::Config;
use tailfire_core::{Discovery, Metrics, Refresh, TargetGroupBuilder};

use crate::cli::{Cli, Command, GlobalOpts, LogFormat, ServeArgs};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let serving = matches!(cli.command, None | Some(Command::Serve(_)));
    init_tracing(log_level(cli.global.verbose, serving), cli.global.log_format);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

/// Default filter when `RUST_LOG` is unset. `serve` starts one step louder
/// so the listen address is always printed.
fn log_level(verbosity: u8, serving: bool) -> &'static str {
    match verbosity.saturating_add(u8::from(serving)) {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.with_target(false).init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::Completions(args) => {
            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "tailfire", &mut std::io::stdout());
            Ok(())
        }
        Command::Check => {
            let config = load(&cli.global)?;
            print!("{}", config.to_redacted_toml()?);
            Ok(())
        }
        Command::Targets => {
            let config = load(&cli.global)?;
            let discovery = build_discovery(&config)?;
            let groups = discovery.refresh().await?;
            println!("{}", serde_json::to_string_pretty(&groups)?);
            Ok(())
        }
        Command::Serve(args) => serve(&cli.global, args).await,
    }
}

fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let config = tailfire_config::load_config(global.config.as_deref())?;
    debug!(
        api_url = %config.api_url,
        tailnet = %config.tailnet,
        "configuration loaded"
    );
    Ok(config)
}

/// Wire client, builder and metrics from a validated config.
fn build_discovery(config: &Config) -> Result<Discovery<TailscaleClient>, CliError> {
    let transport = TransportConfig::default().with_timeout(config.request_timeout);
    let client = TailscaleClient::from_token(
        &config.api_url,
        config.tailnet.clone(),
        config.api_token.clone(),
        &transport,
    )?;
    debug!(
        base_url = %client.base_url(),
        tailnet = client.tailnet(),
        "tailscale client ready"
    );
    let builder = TargetGroupBuilder::new(config.api_url.clone(), config.tag_separator.clone());
    Ok(Discovery::new(client, builder, Metrics::new()?))
}

async fn serve(global: &GlobalOpts, args: ServeArgs) -> Result<(), CliError> {
    let mut config = load(global)?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(listen) = args.listen {
        config.listen_address = listen;
    }

    let discovery = build_discovery(&config)?;
    let metrics = discovery.metrics().clone();
    info!(
        api_url = %config.api_url,
        tailnet = %config.tailnet,
        refresh_interval = ?config.refresh_interval,
        "starting tailfire"
    );

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    server::serve(config.socket_addr(), Arc::new(discovery), metrics, shutdown).await
}

/// Cancel `token` on Ctrl-C or, on unix, SIGTERM.
async fn wait_for_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received");
    token.cancel();
}

#[cfg(test)]
mod tests {
    use super::log_level;

    #[test]
    fn serve_logs_info_by_default() {
        assert_eq!(log_level(0, true), "info");
        assert_eq!(log_level(1, true), "debug");
        assert_eq!(log_level(u8::MAX, true), "trace");
    }

    #[test]
    fn one_shot_commands_stay_quiet() {
        assert_eq!(log_level(0, false), "warn");
        assert_eq!(log_level(1, false), "info");
    }
}
