//! CLI for the rgql GraphQL client.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use rgql_core::config;
use std::path::PathBuf;

use commands::{run_classify, run_config, run_delays, run_operation, OperationKind};

/// Top-level CLI for rgql.
#[derive(Debug, Parser)]
#[command(name = "rgql")]
#[command(about = "rgql: GraphQL over HTTP with classified errors and retries", long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of ~/.config/rgql/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Arguments shared by `query` and `mutate`.
#[derive(Debug, Clone, Args)]
pub struct OperationArgs {
    /// GraphQL document, or @path to read it from a file.
    pub document: String,

    /// Variables as a JSON object.
    #[arg(long, value_name = "JSON")]
    pub variables: Option<String>,

    /// Operation name used in logs and errors.
    #[arg(long = "operation", value_name = "NAME")]
    pub operation_name: Option<String>,

    /// Override the configured endpoint.
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Override the configured bearer token.
    #[arg(long)]
    pub token: Option<String>,

    /// Give up on the whole call (including retries) after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub deadline: Option<u64>,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run a query and print its data as JSON.
    Query(OperationArgs),

    /// Run a mutation and print its data as JSON.
    Mutate(OperationArgs),

    /// Classify an error message (and optional status / extension code).
    Classify {
        /// Error text to classify.
        message: String,
        /// HTTP status code, if one was received.
        #[arg(long)]
        status: Option<u16>,
        /// GraphQL `extensions.code`.
        #[arg(long)]
        code: Option<String>,
        /// Print the full JSON error record.
        #[arg(long)]
        json: bool,
    },

    /// Print the backoff schedule of the configured retry policy.
    Delays,

    /// Show the config file path and the effective configuration.
    Config,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = match &cli.config {
            Some(path) => config::load_from(path)?,
            None => config::load_or_init()?,
        };
        tracing::debug!("loaded config: endpoint={} retry={:?}", cfg.endpoint, cfg.retry);

        match cli.command {
            CliCommand::Query(args) => run_operation(&cfg, OperationKind::Query, &args).await?,
            CliCommand::Mutate(args) => run_operation(&cfg, OperationKind::Mutation, &args).await?,
            CliCommand::Classify {
                message,
                status,
                code,
                json,
            } => run_classify(&message, status, code.as_deref(), json)?,
            CliCommand::Delays => run_delays(&cfg)?,
            CliCommand::Config => run_config(&cfg, cli.config.as_deref())?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
