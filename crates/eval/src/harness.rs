use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::client::ReviewClient;
use crate::config::EvalConfig;
use crate::gold::load_gold;
use crate::record::EvalResult;
use crate::recorder::RunRecorder;
use crate::scoring::{ScoreReport, score_run};
use crate::store::EvalLog;

/// How a harness run ended
#[derive(Debug)]
pub enum RunStatus {
    /// Nothing matched; the endpoint was never contacted
    NoInputs { dir: String },
    Completed {
        records: Vec<EvalResult>,
        score: Option<ScoreReport>,
    },
}

/// Evaluate `files`, or everything `EVAL_GLOB` matches when none are given
pub async fn run(config: &EvalConfig, files: Vec<PathBuf>, gold: Option<&Path>) -> Result<RunStatus> {
    let files = if files.is_empty() {
        ingest::discover(&config.eval_glob)?
    } else {
        files
    };

    if files.is_empty() {
        let dir = Path::new(&config.eval_glob)
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| ".".to_string());
        eprintln!("No files found. Drop test docs in {}/ (e.g., sample.docx)", dir);
        return Ok(RunStatus::NoInputs { dir });
    }

    // Fail on an unreadable gold set before contacting the endpoint
    let gold = match gold {
        Some(path) => Some(load_gold(path).await?),
        None => None,
    };

    let client = ReviewClient::from_config(config)?;
    println!("Target URL: {}", client.url());
    println!(
        "Timeout: {}s  Retries: {}  Saving to: {}",
        config.timeout_secs,
        config.retries,
        config.out_path.display()
    );
    println!("Evaluating {} file(s)...", files.len());

    let recorder = RunRecorder::new(client, EvalLog::new(&config.out_path));
    let records = recorder.run(&files).await?;

    println!("\nSaved {} result(s) to {}", records.len(), config.out_path.display());

    let score = gold.map(|gold| score_run(&records, &gold));
    if let Some(report) = &score {
        println!("\n📊 SCORE:\n{}", report);
    }

    Ok(RunStatus::Completed { records, score })
}

/// Score an existing results log against a gold set
pub async fn score(gold_path: &Path, log_path: &Path) -> Result<ScoreReport> {
    let gold = load_gold(gold_path).await?;
    let loaded = EvalLog::new(log_path).load().await?;

    if loaded.malformed > 0 {
        eprintln!("Skipped {} malformed line(s) in {}", loaded.malformed, log_path.display());
    }

    println!(
        "Scoring {} record(s) from {} against {} gold example(s)",
        loaded.records.len(),
        log_path.display(),
        gold.len()
    );
    let report = score_run(&loaded.records, &gold);
    println!("\n📊 SCORE:\n{}", report);
    Ok(report)
}
