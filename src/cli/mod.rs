//! CLI command definitions and handlers

mod init;
mod score;
mod serve;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use circuit_score::config::load_config;

use score::PinSelection;

/// Parse and validate workers count (1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("workers must be at least 1".to_string())
    } else if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// circuit-score - Replacement and completeness scores for attribution graphs
#[derive(Parser, Debug)]
#[command(name = "circuit-score")]
#[command(
    version,
    about = "Replacement and completeness scores for attribution graphs",
    long_about = "Propagates logit influence backwards through an attribution graph and reports \
how much of it reaches the input tokens through explained features (replacement score) \
and how much survives once reconstruction-error inputs are discounted (completeness score).",
    after_help = "\
Examples:
  circuit-score score graph.json                    Score a graph file
  circuit-score score graph.json --pinned 3_5_0     Keep one feature, fold the rest into error nodes
  circuit-score score a.json b.json --format json   JSON output for scripting
  circuit-score serve                               Answer JSON-lines requests on stdin"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Number of parallel workers for multi-file scoring (1-64)
    #[arg(long, global = true, default_value = "4", value_parser = parse_workers)]
    pub workers: usize,

    /// Config file (default: ./circuit-score.toml, then the user config dir)
    #[arg(long, global = true, env = "CIRCUIT_SCORE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the scoring worker on stdin/stdout (one JSON request per line)
    Serve,

    /// Score one or more graph JSON files
    #[command(after_help = "\
Pinning:
  Without --pinned, --prune-all or --full, pinned IDs saved in the graph file
  (qParams.pinnedIds) are used; an empty list prunes every feature and a
  missing list scores the full graph.")]
    Score {
        /// Graph JSON files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Feature node ID to keep; every other feature folds into its error node
        #[arg(long = "pinned", value_name = "NODE_ID", conflicts_with_all = ["prune_all", "full"])]
        pinned: Vec<String>,

        /// Fold every feature into its error node (empty pinned set)
        #[arg(long, conflicts_with = "full")]
        prune_all: bool,

        /// Score the full graph, ignoring pinned IDs saved in the file
        #[arg(long)]
        full: bool,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// Show the influence breakdown behind each score
        #[arg(long)]
        explain: bool,
    },

    /// Write a circuit-score.toml with the default settings
    Init {
        /// Directory to write the config into
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { path, force } => init::run(&path, force),

        Commands::Serve => {
            let config = load_config(cli.config.as_deref())?;
            serve::run(config.scoring)
        }

        Commands::Score {
            files,
            pinned,
            prune_all,
            full,
            format,
            explain,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let selection = PinSelection::from_flags(pinned, prune_all, full);
            score::run(&files, &selection, &format, explain, cli.workers, &config.scoring)
        }
    }
}
