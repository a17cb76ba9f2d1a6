//! CLI argument parsing using clap derive API
//!
//! Purely declarative: no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use opsforge_core::types::{Backend, Subagent};

/// Opsforge -- compile one unified agent configuration into backend files.
///
/// Use `opsforge <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "opsforge", version, about, long_about = None)]
pub struct Cli {
    /// Path to the opsforge.toml settings file.
    #[arg(short, long, global = true, default_value = "opsforge.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a unified configuration for one backend and write the files.
    Generate(GenerateArgs),

    /// Compile a unified configuration for every backend without writing.
    Validate(ValidateArgs),

    /// List registered component types and their capabilities.
    Components(ComponentsArgs),
}

/// Accepts `fluentbit`, `fluent-bit`, `fluent_bit`, `otel` and `collectd`.
fn parse_backend(s: &str) -> Result<Backend, String> {
    s.parse()
}

// ---- generate ----

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Unified configuration YAML file.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Target backend (fluentbit, otel, collectd).
    #[arg(short, long, value_parser = parse_backend)]
    pub backend: Backend,

    /// Directory for generated files (default: paths.output_dir).
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Add the agent's own log collection pipeline.
    #[arg(long)]
    pub self_logs: bool,
}

// ---- validate ----

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Unified configuration YAML file.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Only check these backends (repeatable; default: all).
    #[arg(short, long, value_parser = parse_backend)]
    pub backend: Vec<Backend>,
}

// ---- components ----

#[derive(Args, Debug)]
pub struct ComponentsArgs {
    /// Only list one domain.
    #[arg(long)]
    pub subagent: Option<SubagentArg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SubagentArg {
    Logging,
    Metrics,
}

impl From<SubagentArg> for Subagent {
    fn from(arg: SubagentArg) -> Self {
        match arg {
            SubagentArg::Logging => Subagent::Logging,
            SubagentArg::Metrics => Subagent::Metrics,
        }
    }
}
