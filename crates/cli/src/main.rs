mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{cmd_assets, cmd_build, cmd_check, cmd_micropython};
use output::OutputFormat;

/// sbuild - build, check and generate code for studio projects
#[derive(Parser)]
#[command(name = "sbuild")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build every output file of a project
  Build {
    /// Path to the project file
    project: PathBuf,

    /// Configuration for files without a <configuration> placeholder
    #[arg(short, long)]
    configuration: Option<String>,

    /// Override the project's destination folder
    #[arg(short, long)]
    destination: Option<PathBuf>,

    /// Create the destination folder if it does not exist
    #[arg(long)]
    create_destination: bool,

    /// Fail when a template references a part that was not built
    #[arg(long)]
    strict_templates: bool,
  },

  /// Validate a project and report problems
  Check {
    /// Path to the project file
    project: PathBuf,

    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
  },

  /// Build the parts of one configuration and list them
  Assets {
    /// Path to the project file
    project: PathBuf,

    #[arg(short, long)]
    configuration: Option<String>,

    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
  },

  /// Generate the MicroPython program of an LVGL project
  Micropython {
    /// Path to the project file
    project: PathBuf,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "info" } else { "warn" }));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Build {
      project,
      configuration,
      destination,
      create_destination,
      strict_templates,
    } => cmd_build(&project, configuration, destination, create_destination, strict_templates),
    Commands::Check { project, format } => cmd_check(&project, format),
    Commands::Assets {
      project,
      configuration,
      format,
    } => cmd_assets(&project, configuration, format),
    Commands::Micropython { project, output } => cmd_micropython(&project, output.as_deref()),
  }
}
