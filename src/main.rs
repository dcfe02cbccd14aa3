//! corefork - one HTTP worker per CPU core, replaced whenever one dies.

mod cli;
mod config;
mod error;
mod logging;
mod role;
mod server;
mod supervisor;
mod version;

use anyhow::{Context, Result};
use clap::Parser;
use owo_colors::{OwoColorize, Stream::Stderr};

use cli::Cli;
use config::PoolConfig;
use role::Role;
use supervisor::{OsHost, Supervisor};

/// Parse the CLI, set up logging, resolve this process's role and run it.
///
/// Fatal errors are printed as an `error:` line followed by their causes, and
/// the process exits with status 1.
fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!(
            "{}: {}",
            "error"
                .if_supports_color(Stderr, |text| text.red())
                .if_supports_color(Stderr, |text| text.bold()),
            e
        );
        for cause in e.chain().skip(1) {
            eprintln!(
                "  {}: {}",
                "caused by".if_supports_color(Stderr, |text| text.yellow()),
                cause
            );
        }
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    if cli.no_color {
        owo_colors::set_override(false);
    }

    let log_config = cli.log_config();
    logging::init(log_config.clone());

    match Role::from_env()? {
        Role::Primary => run_primary(&log_config),
        Role::Worker { id, primary_pid } => {
            server::run_worker(id, primary_pid, config::worker_listen_addr())
                .with_context(|| format!("worker {} failed", id))
        }
    }
}

/// Supervise the pool until the process is killed.
fn run_primary(log_config: &logging::LogConfig) -> Result<()> {
    let config = PoolConfig::detect();

    server::listener::probe(config.listen_addr())
        .context("cannot start the worker pool")?;

    let host = OsHost::new(log_config)?;
    Supervisor::new(config, host).run()?;
    Ok(())
}
