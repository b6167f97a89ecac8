use super::project::DEFAULT_CONFIG_FILE;
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "cscaffold")]
#[command(about = "Generate cffi unit-test scaffolding for a C file and report its coverage")]
pub struct CliArgs {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Log line format
    #[arg(long, value_enum, default_value = "compact")]
    pub log_format: LogFormat,

    /// Validate the configuration and show the planned run without touching the workspace
    #[arg(long)]
    pub dry_run: bool,
}
