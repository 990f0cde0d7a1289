mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use esmap::{Config, MappingOptions};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "esmap")]
#[command(about = "esmap - flatten Elasticsearch aggregations and rewrite search requests")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.esmap/config.toml)
    #[arg(long, global = true, env = "ESMAP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Flatten the aggregations of a search response into rows
    Map {
        /// Search response JSON file ("-" for stdin)
        #[arg(short, long, default_value = "-")]
        input: String,

        /// Add "<parent key> - <field>" columns
        #[arg(long)]
        flat: bool,

        /// Take sibling values from doc_count, implies --flat
        #[arg(long)]
        direct_doc_count: bool,

        /// Copy every sibling aggregation onto the row
        #[arg(long)]
        multi_series: bool,

        /// Collapse child rows into one column per child key
        #[arg(long)]
        stacked: bool,
    },

    /// List bucketing aggregations of a search request
    BucketPaths {
        /// Search request JSON file ("-" for stdin)
        #[arg(short, long, default_value = "-")]
        input: String,
    },

    /// Move a subtree of a search request
    Move {
        /// Search request JSON file ("-" for stdin)
        #[arg(short, long, default_value = "-")]
        input: String,

        /// Path of the subtree to move
        #[arg(long)]
        from: String,

        /// Destination path
        #[arg(long)]
        to: String,
    },

    /// Merge nested clauses that target the same nested path
    MergeNested {
        /// Search request JSON file ("-" for stdin)
        #[arg(short, long, default_value = "-")]
        input: String,
    },

    /// Reorder result arrays by custom value orders
    Reorder {
        /// JSON document holding the rows ("-" for stdin)
        #[arg(short, long, default_value = "-")]
        input: String,

        /// Path of the array to reorder, "#" to reorder every match
        #[arg(short, long)]
        target: String,

        /// Ordering keys, outermost first (comma-separated)
        #[arg(long, value_delimiter = ',', required = true)]
        by: Vec<String>,

        /// Value order per key (comma-separated, repeat once per key)
        #[arg(long, required = true)]
        order: Vec<String>,
    },
}

fn init_tracing(config: &Config) {
    let log_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| config.logging.format.clone());

    if format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(log_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(log_filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load_or_create(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Config::load().context("Failed to load config"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    init_tracing(&config);

    match cli.command {
        Commands::Map {
            input,
            flat,
            direct_doc_count,
            multi_series,
            stacked,
        } => {
            let options = MappingOptions {
                direct_doc_count,
                flat,
                multi_series,
                stacked,
            }
            .merge(config.mapping);
            commands::run_map(&input, options)?;
        }
        Commands::BucketPaths { input } => {
            commands::run_bucket_paths(&input)?;
        }
        Commands::Move { input, from, to } => {
            commands::run_move(&input, &from, &to)?;
        }
        Commands::MergeNested { input } => {
            commands::run_merge_nested(&input)?;
        }
        Commands::Reorder {
            input,
            target,
            by,
            order,
        } => {
            commands::run_reorder(&input, &target, &by, &order)?;
        }
    }

    Ok(())
}
