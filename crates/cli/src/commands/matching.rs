//! Match command handler.
//!
//! Ranks a candidate collection against a single query.

use clap::Args;
use nearmatch_core::{config::AppConfig, AppResult};

use super::input::{build_engine, load_candidates, print_matches, resolve_top_k, CandidateSource};

/// Rank candidates against one query
#[derive(Args, Debug)]
pub struct MatchCommand {
    /// Query text
    pub query: String,

    #[command(flatten)]
    pub source: CandidateSource,

    /// Number of matches to return (default: retrieval.topK from config)
    #[arg(short = 'k', long, allow_negative_numbers = true)]
    pub top_k: Option<i64>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl MatchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let top_k = resolve_top_k(self.top_k, config)?;
        tracing::info!("Executing match command (k = {})", top_k);

        let engine = build_engine(config).await?;
        let candidates = load_candidates(&self.source, &engine).await?;
        let matches = engine.top_k_matches(&self.query, &candidates, top_k).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&matches)?);
        } else {
            print_matches(&matches, "");
        }

        Ok(())
    }
}
