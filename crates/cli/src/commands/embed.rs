//! Embed command handler.
//!
//! Writes embeddings in the candidate file format read by `match` and `batch`.

use clap::Args;
use nearmatch_core::{config::AppConfig, AppError, AppResult};
use std::path::PathBuf;

use super::input::{build_engine, read_lines};

/// Print embeddings as a candidate file
#[derive(Args, Debug)]
pub struct EmbedCommand {
    /// Texts to embed
    pub texts: Vec<String>,

    /// File with one text per line, appended after positional texts
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Emit [text, vector] pairs instead of bare vectors
    #[arg(long)]
    pub labeled: bool,
}

impl EmbedCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let mut texts = self.texts.clone();
        if let Some(path) = &self.file {
            texts.extend(read_lines(path)?);
        }
        if texts.is_empty() {
            return Err(AppError::Config(
                "Nothing to embed; pass texts or --file".to_string(),
            ));
        }

        tracing::info!("Executing embed command for {} texts", texts.len());

        let engine = build_engine(config).await?;
        let embeddings = engine.embed_texts(&texts).await?;

        let output = if self.labeled {
            let pairs: Vec<(String, Vec<f32>)> = texts.into_iter().zip(embeddings).collect();
            serde_json::to_string_pretty(&pairs)?
        } else {
            serde_json::to_string_pretty(&embeddings)?
        };
        println!("{}", output);

        Ok(())
    }
}
