//! Nearmatch CLI
//!
//! Ranks candidate embeddings against text queries from the command line.

mod commands;

use clap::{Parser, Subcommand};
use commands::{BatchCommand, EmbedCommand, MatchCommand};
use nearmatch_core::{config::AppConfig, logging, logging::LogFormat, AppResult};
use std::path::PathBuf;

/// Nearmatch - cosine-similarity top-k retrieval over embeddings
#[derive(Parser, Debug)]
#[command(name = "nearmatch")]
#[command(about = "Cosine-similarity top-k retrieval over embeddings", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "NEARMATCH_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "NEARMATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log line format (pretty, json)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Embedding provider (trigram, ollama)
    #[arg(short, long, global = true)]
    embedding_provider: Option<String>,

    /// Similarity backend (ndarray, explicit)
    #[arg(short, long, global = true)]
    backend: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rank candidates against one query
    Match(MatchCommand),

    /// Rank candidates against many queries in one pass
    Batch(BatchCommand),

    /// Print embeddings as a candidate file
    Embed(EmbedCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_with(cli.workspace, cli.config)?.with_overrides(
        cli.log_level,
        cli.log_format,
        cli.verbose,
        cli.no_color,
        cli.embedding_provider,
        cli.backend,
    );

    logging::init_logging(config.log_level.as_deref(), config.log_format, config.no_color)?;

    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!(
        "Embedding: {} / {} ({} dims), backend: {}",
        config.embedding.provider,
        config.embedding.model,
        config.embedding.dimensions,
        config.retrieval.backend
    );

    config.validate()?;

    let command_name = match &cli.command {
        Commands::Match(_) => "match",
        Commands::Batch(_) => "batch",
        Commands::Embed(_) => "embed",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Match(cmd) => cmd.execute(&config).await,
        Commands::Batch(cmd) => cmd.execute(&config).await,
        Commands::Embed(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::debug!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
