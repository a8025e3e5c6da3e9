use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Harness settings, all overridable through the environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    pub review_url: String,
    pub out_path: PathBuf,
    pub eval_glob: String,
    pub timeout_secs: u64,
    pub retries: usize,
    pub retry_sleep_secs: f64,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            review_url: "http://127.0.0.1:8000/review".to_string(),
            out_path: PathBuf::from("data/eval/results.jsonl"),
            eval_glob: "data/eval/*.docx".to_string(),
            timeout_secs: 90,
            retries: 2,
            retry_sleep_secs: 2.0,
        }
    }
}

impl EvalConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("REVIEW_URL") {
            config.review_url = url;
        }
        if let Some(path) = lookup("EVAL_OUT") {
            config.out_path = PathBuf::from(path);
        }
        if let Some(pattern) = lookup("EVAL_GLOB") {
            config.eval_glob = pattern;
        }
        if let Some(raw) = lookup("EVAL_TIMEOUT") {
            config.timeout_secs = raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid EVAL_TIMEOUT: {}", raw))?;
        }
        if let Some(raw) = lookup("EVAL_RETRIES") {
            config.retries = raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid EVAL_RETRIES: {}", raw))?;
        }
        if let Some(raw) = lookup("EVAL_RETRY_SLEEP") {
            let secs: f64 = raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid EVAL_RETRY_SLEEP: {}", raw))?;
            if !secs.is_finite() || secs < 0.0 {
                anyhow::bail!("Invalid EVAL_RETRY_SLEEP: {} (must be a non-negative number)", raw);
            }
            config.retry_sleep_secs = secs;
        }

        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_sleep(&self) -> Duration {
        Duration::from_secs_f64(self.retry_sleep_secs)
    }
}
