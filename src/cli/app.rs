//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use super::order_cmd::{self, RecordKind};
use super::output::{Output, OutputFormat};
use crate::storage::{Config, OrderingConfig, StrategyKind};

#[derive(Parser)]
#[command(name = "shard-order")]
#[command(author, version, about = "Parents-first ordering for shard leases")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the configured format)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Path to a config file
    #[arg(long, short = 'c', global = true, env = "SHARD_ORDER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Order a batch of leases or shards for processing
    Order {
        /// JSONL batch file, or - for stdin
        input: PathBuf,

        /// Record type of the batch
        #[arg(long, short, value_enum, default_value = "lease")]
        kind: RecordKind,

        #[command(flatten)]
        strategy: StrategyArgs,

        /// Write the ordered batch to a JSONL file instead of printing it
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Show the dependency depth of every shard in a batch
    Depths {
        /// JSONL batch file, or - for stdin
        input: PathBuf,

        /// Record type of the batch
        #[arg(long, short, value_enum, default_value = "lease")]
        kind: RecordKind,
    },

    /// Show the effective configuration
    Config,
}

/// Strategy overrides for a single run
#[derive(Args, Debug, Default)]
pub struct StrategyArgs {
    /// Ordering strategy (overrides config)
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyKind>,

    /// Exclude shards deeper than this (parents-first only)
    #[arg(long, allow_negative_numbers = true)]
    pub max_depth: Option<i64>,

    /// Seed for a repeatable shuffle
    #[arg(long)]
    pub seed: Option<u64>,
}

impl StrategyArgs {
    /// Overlays the flags that were given onto the configured values
    pub fn apply(&self, ordering: &mut OrderingConfig) {
        if let Some(strategy) = self.strategy {
            ordering.strategy = strategy;
        }
        if let Some(max_depth) = self.max_depth {
            ordering.max_depth = Some(max_depth);
        }
        if let Some(seed) = self.seed {
            ordering.seed = Some(seed);
        }
    }
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(cli.config.as_deref())?;
    let output = Output::new(cli.format.unwrap_or(config.default_format));

    debug!(config = ?cli.config, "shard-order starting");

    match cli.command {
        Commands::Order {
            input,
            kind,
            strategy,
            output: dest,
        } => {
            let mut ordering = config.ordering.clone();
            strategy.apply(&mut ordering);
            debug!(?ordering, "Effective ordering settings");
            order_cmd::order(&output, &ordering, &input, kind, dest.as_deref())?
        }

        Commands::Depths { input, kind } => order_cmd::depths(&output, &input, kind)?,

        Commands::Config => show_config(&output, &config)?,
    }

    debug!("Command completed successfully");
    Ok(())
}

/// Logs go to stderr so stdout stays parseable
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // Keep any subscriber that is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Prints the effective configuration
fn show_config(output: &Output, config: &Config) -> Result<()> {
    if output.is_json() {
        output.data(config);
    } else {
        print!("{}", config.to_toml()?);
    }
    Ok(())
}
