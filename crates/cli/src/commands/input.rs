//! Helpers shared by the ranking commands: engine setup, candidate loading
//! and result printing.

use clap::Args;
use nearmatch_core::{config::AppConfig, AppError, AppResult};
use nearmatch_retrieval::{create_provider, Candidates, MatchRecord, RetrievalEngine, TopK};
use std::path::{Path, PathBuf};

/// Where candidates come from.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct CandidateSource {
    /// JSON file of candidate vectors or [label, vector] pairs
    #[arg(long)]
    pub candidates: Option<PathBuf>,

    /// Text file, one candidate per line, embedded with the configured provider
    #[arg(long)]
    pub texts: Option<PathBuf>,
}

/// Build an engine from the embedding and retrieval config sections.
pub async fn build_engine(config: &AppConfig) -> AppResult<RetrievalEngine> {
    let provider = create_provider(&config.embedding).await?;
    RetrievalEngine::from_settings(provider, &config.retrieval)
}

/// Load the candidate collection named by `source`.
pub async fn load_candidates(
    source: &CandidateSource,
    engine: &RetrievalEngine,
) -> AppResult<Candidates<String>> {
    let candidates = match (&source.candidates, &source.texts) {
        (Some(path), _) => Candidates::from_json_str(&read_file(path)?)?,
        (None, Some(path)) => engine.embed_candidates(&read_lines(path)?).await?,
        (None, None) => {
            return Err(AppError::Config(
                "Either --candidates or --texts is required".to_string(),
            ))
        }
    };

    tracing::info!(
        "Loaded {} candidates ({})",
        candidates.len(),
        if candidates.is_labeled() {
            "labeled"
        } else {
            "plain"
        }
    );

    Ok(candidates)
}

/// Requested count from the command line, else the configured default.
pub fn resolve_top_k(requested: Option<i64>, config: &AppConfig) -> AppResult<TopK> {
    match requested {
        Some(k) => Ok(TopK::new(k)?),
        None => Ok(TopK::from(config.retrieval.top_k)),
    }
}

pub fn read_file(path: &Path) -> AppResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("Failed to read {:?}: {}", path, e)))
}

/// Non-blank, trimmed lines of a text file.
pub fn read_lines(path: &Path) -> AppResult<Vec<String>> {
    Ok(read_file(path)?
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Print ranked matches as `rank. label-or-#index  score` lines.
pub fn print_matches(matches: &[MatchRecord<String>], indent: &str) {
    if matches.is_empty() {
        println!("{}(no matches)", indent);
        return;
    }

    for (rank, record) in matches.iter().enumerate() {
        let identity = match &record.label {
            Some(label) => label.clone(),
            None => format!("#{}", record.index),
        };
        println!("{}{}. {}  {:.4}", indent, rank + 1, identity, record.score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_top_k() {
        let config = AppConfig::default();
        assert_eq!(resolve_top_k(None, &config).unwrap().get(), 3);
        assert_eq!(resolve_top_k(Some(7), &config).unwrap().get(), 7);
        assert!(resolve_top_k(Some(-1), &config).is_err());
    }

    #[test]
    fn test_read_lines_skips_blanks() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("texts.txt");
        std::fs::write(&path, "first\n\n  second  \n   \nthird").unwrap();

        assert_eq!(read_lines(&path).unwrap(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_load_candidates_from_json_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("candidates.json");
        std::fs::write(&path, r#"[["sad", [1, 0]], ["happy", [0, 1]]]"#).unwrap();

        let engine = build_engine(&AppConfig::default()).await.unwrap();
        let source = CandidateSource {
            candidates: Some(path),
            texts: None,
        };
        let candidates = load_candidates(&source, &engine).await.unwrap();
        assert_eq!(candidates.len(), 2);
        assert!(candidates.is_labeled());
    }

    #[tokio::test]
    async fn test_load_candidates_from_texts() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("texts.txt");
        std::fs::write(&path, "calm breathing\nwork stress\n").unwrap();

        let engine = build_engine(&AppConfig::default()).await.unwrap();
        let source = CandidateSource {
            candidates: None,
            texts: Some(path),
        };
        match load_candidates(&source, &engine).await.unwrap() {
            Candidates::Labeled(pairs) => {
                assert_eq!(pairs.len(), 2);
                assert_eq!(pairs[1].0, "work stress");
                assert_eq!(pairs[1].1.len(), 384);
            }
            Candidates::Plain(_) => panic!("text candidates should carry labels"),
        }
    }
}
