mod cmd;
mod output;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hostpack_lib::pipeline::DEFAULT_TARGET;

use crate::cmd::RunOptions;
use crate::output::OutputFormat;

/// hostpack - build, package and validate runtime host packages
#[derive(Parser)]
#[command(name = "hostpack")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run a target and everything it depends on
  Run {
    /// Target to run
    #[arg(default_value = DEFAULT_TARGET)]
    target: String,

    /// Build configuration file (default: $HOSTPACK_CONFIG or ./hostpack.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Machine RID to build for instead of the detected one
    #[arg(long)]
    rid: Option<String>,

    /// Skip validation of the produced host packages
    #[arg(long)]
    no_validate: bool,

    /// Kill the pack script if it runs longer than this (e.g. "90s", "10m")
    #[arg(long, value_parser = humantime::parse_duration)]
    pack_timeout: Option<Duration>,
  },

  /// List targets, or the execution order of one target
  Targets {
    /// Show the order in which this target and its prerequisites run
    root: Option<String>,
  },

  /// Resolve a machine RID to the RID its packages publish under
  Rid {
    /// Machine RID (default: detected)
    rid: Option<String>,
  },

  /// Show platform information
  Info,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Run {
      target,
      config,
      rid,
      no_validate,
      pack_timeout,
    } => cmd::cmd_run(RunOptions {
      target,
      config,
      rid,
      no_validate,
      pack_timeout,
      format: cli.output,
    }),
    Commands::Targets { root } => cmd::cmd_targets(root.as_deref(), cli.output),
    Commands::Rid { rid } => cmd::cmd_rid(rid.as_deref(), cli.output),
    Commands::Info => cmd::cmd_info(cli.output),
  }
}
