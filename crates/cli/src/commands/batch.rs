//! Batch command handler.
//!
//! Ranks one candidate collection against many queries, preparing the
//! candidates and embedding the queries once.

use clap::Args;
use nearmatch_core::{config::AppConfig, AppError, AppResult};
use std::path::PathBuf;

use super::input::{
    build_engine, load_candidates, print_matches, read_lines, resolve_top_k, CandidateSource,
};

/// Rank candidates against many queries in one pass
#[derive(Args, Debug)]
pub struct BatchCommand {
    /// Query text (repeatable)
    #[arg(short, long = "query")]
    pub queries: Vec<String>,

    /// File with one query per line, appended after --query values
    #[arg(long)]
    pub queries_file: Option<PathBuf>,

    #[command(flatten)]
    pub source: CandidateSource,

    /// Number of matches per query (default: retrieval.topK from config)
    #[arg(short = 'k', long, allow_negative_numbers = true)]
    pub top_k: Option<i64>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl BatchCommand {
    fn collect_queries(&self) -> AppResult<Vec<String>> {
        let mut queries = self.queries.clone();
        if let Some(path) = &self.queries_file {
            queries.extend(read_lines(path)?);
        }

        if queries.is_empty() {
            return Err(AppError::Config(
                "No queries given; use --query or --queries-file".to_string(),
            ));
        }
        Ok(queries)
    }

    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let top_k = resolve_top_k(self.top_k, config)?;
        let queries = self.collect_queries()?;
        tracing::info!(
            "Executing batch command ({} queries, k = {})",
            queries.len(),
            top_k
        );

        let engine = build_engine(config).await?;
        let candidates = load_candidates(&self.source, &engine).await?;
        let results = engine
            .top_k_matches_batch(&queries, &candidates, top_k)
            .await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&results)?);
        } else {
            for entry in &results {
                println!("[{}] {}", entry.position, entry.query);
                print_matches(&entry.matches, "  ");
            }
        }

        Ok(())
    }
}
