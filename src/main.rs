//! Binary entry point for the Nightcap CLI.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt};

use nightcap::{
    ConnectError, ConnectOrchestrator, ScalewayBackend, ScalewayBackendError, ScalewayConfig,
    SessionConfig, SessionRunner,
};

mod cli;

use cli::Cli;

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("backend error: {0}")]
    Backend(#[from] ScalewayBackendError),
    #[error("session error: {0}")]
    Session(String),
    #[error(transparent)]
    Connect(#[from] ConnectError<ScalewayBackendError>),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing();

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .try_init()
    {
        writeln!(io::stderr(), "failed to initialise logging: {err}").ok();
    }
}

async fn run(cli: Cli) -> Result<i32, CliError> {
    let scaleway_config =
        ScalewayConfig::load_without_cli_args().map_err(|err| CliError::Config(err.to_string()))?;
    let backend = ScalewayBackend::new(scaleway_config)?;
    let handle = backend.handle_for(&cli.instance_id, cli.zone.as_deref())?;

    let mut session_config =
        SessionConfig::load_without_cli_args().map_err(|err| CliError::Config(err.to_string()))?;
    apply_overrides(&cli, &mut session_config);
    let session = SessionRunner::with_process_runner(session_config)
        .map_err(|err| CliError::Session(err.to_string()))?
        .with_extra_args(cli.extra);

    let orchestrator = ConnectOrchestrator::new(backend, session);
    let report = orchestrator
        .execute(&handle, cli.host.as_deref(), interrupt_signal())
        .await?;

    Ok(report.session.exit_code())
}

/// Layers command-line flags over the loaded session configuration.
fn apply_overrides(cli: &Cli, config: &mut SessionConfig) {
    if let Some(user) = &cli.user {
        config.ssh_user.clone_from(user);
    }
    if let Some(identity) = &cli.identity {
        config.ssh_identity_file = Some(identity.clone());
    }
    if let Some(args) = &cli.ssh_args {
        config.ssh_args = Some(args.clone());
    }
}

/// Resolves on CTRL+C. Never resolves when the handler cannot be installed,
/// so the shutdown proceeds after the grace window.
async fn interrupt_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(%err, "failed to listen for CTRL+C; shutdown cannot be cancelled");
        std::future::pending::<()>().await;
    }
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
