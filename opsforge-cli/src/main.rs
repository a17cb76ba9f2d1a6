//! Opsforge CLI -- compiles unified agent configuration into backend files

mod cli;
mod commands;
mod error;
mod output;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use opsforge_core::config::OpsforgeConfig;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("{} {err}", "error:".red().bold());
        std::process::exit(err.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let settings = OpsforgeConfig::load_or_default(&cli.config).await?;

    let level = cli
        .log_level
        .as_deref()
        .unwrap_or(&settings.general.log_level);
    if let Err(e) = init_tracing(level, &settings.general.log_format) {
        eprintln!("{} {e:#}", "warning:".yellow());
    }
    opsforge_core::metrics::describe_all();

    tracing::debug!(config = %cli.config.display(), "opsforge starting");

    let writer = OutputWriter::new(cli.output);
    match cli.command {
        Commands::Generate(args) => commands::generate::execute(args, &settings, &writer).await,
        Commands::Validate(args) => commands::validate::execute(args, &settings, &writer).await,
        Commands::Components(args) => commands::components::execute(args, &writer),
    }
}

/// Install the global tracing subscriber. Logs go to stderr so that stdout
/// carries only command output.
fn init_tracing(level: &str, format: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_new(level).with_context(|| format!("invalid log level {level:?}"))?;

    match format {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to initialize JSON tracing subscriber: {e}")),
        "pretty" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to initialize pretty tracing subscriber: {e}")),
        other => Err(anyhow::anyhow!(
            "unknown log format '{other}', expected 'json' or 'pretty'"
        )),
    }
}
