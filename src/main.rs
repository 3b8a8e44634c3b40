//! Binary entry point for the `rename-pvc` CLI.

use std::io::{self, Write};
use std::process;

use clap::{CommandFactory, FromArgMatches};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use rename_pvc::{
    ClusterError, ConfigError, ConnectOptions, KubeClient, LoggingError, RenameConfig,
    RenameFailure, RenameOrchestrator, RenameRequest, RequestError, init_logging,
};

mod cli;

use cli::Cli;

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),
    #[error("invalid arguments: {0}")]
    Request(#[from] RequestError),
    #[error("cannot reach the cluster: {0}")]
    Connect(#[from] ClusterError),
    #[error("rename failed: {0}")]
    Rename(#[from] RenameFailure),
}

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

async fn run() -> Result<(), CliError> {
    let config = RenameConfig::load_without_cli_args()?;
    config.validate()?;
    init_logging(&config.log_filter)?;

    let cli = parse_cli(&config.command_name);
    let options = ConnectOptions {
        kubeconfig: cli.kubeconfig.clone(),
        context: cli.context.clone(),
    };
    let (client, default_namespace) = KubeClient::connect(&options).await?;
    let request = build_request(&cli, &default_namespace)?;
    debug!(?request, "parsed rename request");

    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    let orchestrator = RenameOrchestrator::new(client).with_poll_settings(config.poll_settings());
    let mut input = io::stdin().lock();
    let mut output = io::stdout();
    orchestrator
        .execute(&request, &mut input, &mut output, &cancel)
        .await?;
    Ok(())
}

/// Builds the clap command, showing `command_name` in usage output.
fn cli_command(command_name: &str) -> clap::Command {
    Cli::command().bin_name(command_name.to_owned())
}

fn parse_cli(command_name: &str) -> Cli {
    let matches = cli_command(command_name).get_matches();
    Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit())
}

fn build_request(cli: &Cli, default_namespace: &str) -> Result<RenameRequest, RequestError> {
    let source_namespace = cli
        .namespace
        .clone()
        .unwrap_or_else(|| default_namespace.to_owned());

    RenameRequest::builder()
        .source(cli.source.clone(), source_namespace)
        .target_name(cli.target.clone())
        .target_namespace(cli.target_namespace.clone())
        .skip_confirmation(cli.yes)
        .build()
}

fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        warn!("interrupt received, cancelling rename");
        cancel.cancel();
    });
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(err) => {
            warn!(%err, "failed to register SIGTERM handler");
            wait_for_ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        () = wait_for_ctrl_c() => {}
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
