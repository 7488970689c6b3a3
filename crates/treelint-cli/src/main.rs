//! treelint CLI tool.
//!
//! Usage:
//! ```bash
//! treelint check [OPTIONS] [PATHS]...
//! treelint format [OPTIONS] [PATHS]...
//! treelint list-rules
//! treelint init
//! ```

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;
mod files;
mod runner;

/// Linter and formatter driven by syntax-tree rules
#[derive(Parser)]
#[command(name = "treelint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "TREELINT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report violations without changing files
    Check {
        /// Files or directories to check (default: current directory)
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        #[command(flatten)]
        rules: RuleArgs,
    },

    /// Fix violations in place and report the rest
    Format {
        /// Files or directories to format (default: current directory)
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Report what would change without writing files
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        rules: RuleArgs,
    },

    /// List available rules
    ListRules,

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Rule selection and configuration flags shared by `check` and `format`.
#[derive(Args, Debug, Clone, Default)]
pub struct RuleArgs {
    /// Disable rules (comma-separated ids, e.g. `no-var,custom:rule`)
    #[arg(long, value_delimiter = ',')]
    pub disable: Vec<String>,

    /// Run experimental rules
    #[arg(long)]
    pub experimental: bool,

    /// Override a property (`key=value`, can be specified multiple times)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub properties: Vec<String>,

    /// Exclude patterns (can be specified multiple times)
    #[arg(short, long)]
    pub exclude: Vec<String>,

    /// Stop checking a file at its first violation
    #[arg(long)]
    pub fail_fast: bool,
}

/// Output format for lint results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// One-line-per-violation compact format.
    Compact,
    /// JSON output.
    Json,
    /// Annotated source snippets.
    Pretty,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check {
            paths,
            format,
            rules,
        } => commands::check::run(&paths, format, &rules, cli.config.as_deref()),
        Commands::Format {
            paths,
            format,
            dry_run,
            rules,
        } => commands::format::run(&paths, format, dry_run, &rules, cli.config.as_deref()),
        Commands::ListRules => commands::list_rules::run(cli.config.as_deref()),
        Commands::Init { force } => commands::init::run(force),
    }
}
