use anyhow::{Context, Result};
use extract::Flag;
use extract::schema::truncate_chars;
use ingest::FileReader;
use reqwest::multipart::{Form, Part};
use serde_json::{Map, Value};
use std::path::Path;
use std::time::{Duration, Instant};

use crate::config::EvalConfig;
use crate::retry::RetryPolicy;

/// Normalized answer from the reviewing endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewOutcome {
    /// Body carried both `flags` and `summary`
    Structured {
        latency_ms: u64,
        flags: Vec<Flag>,
        summary: String,
        meta: Map<String, Value>,
    },
    /// Anything else that came back with a success status
    Raw { latency_ms: u64, body: Value },
    Failed { error: String },
}

impl ReviewOutcome {
    pub fn is_ok(&self) -> bool {
        !matches!(self, ReviewOutcome::Failed { .. })
    }

    /// Classify a success body
    pub fn from_body(body: Value, latency_ms: u64) -> Self {
        let mut object = match body {
            Value::Object(o) if o.contains_key("flags") && o.contains_key("summary") => o,
            other => return ReviewOutcome::Raw { latency_ms, body: other },
        };

        let flags = match object.remove("flags") {
            Some(Value::Array(items)) => items.iter().map(Flag::from_value).collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => vec![Flag::from_value(&other)],
        };
        let summary = match object.remove("summary") {
            Some(Value::String(s)) => s,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        let meta = match object.remove("meta") {
            Some(Value::Object(meta)) => meta,
            _ => Map::new(),
        };

        ReviewOutcome::Structured {
            latency_ms,
            flags,
            summary,
            meta,
        }
    }
}

pub struct ReviewClient {
    url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl ReviewClient {
    pub fn new(url: String, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { url, client, retry })
    }

    pub fn from_config(config: &EvalConfig) -> Result<Self> {
        Self::new(
            config.review_url.clone(),
            config.timeout(),
            RetryPolicy::new(config.retries, config.retry_sleep()),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Submit one document. Never fails: exhausted retries come back as
    /// `ReviewOutcome::Failed` carrying the last error.
    pub async fn submit(&self, path: &Path) -> ReviewOutcome {
        match self.retry.retry("review_submit", || self.attempt(path)).await {
            Ok(outcome) => outcome,
            Err(e) => ReviewOutcome::Failed {
                error: format!("{:#}", e),
            },
        }
    }

    async fn attempt(&self, path: &Path) -> Result<ReviewOutcome> {
        let bytes = FileReader::read_bytes(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/octet-stream")?;
        let form = Form::new().part("file", part);

        let start = Instant::now();
        let response = self.client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .context("Failed to send review request")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Review request failed: {} {}",
                status,
                truncate_chars(detail.trim(), 300)
            );
        }

        let text = response
            .text()
            .await
            .context("Failed to read review response")?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        let latency_ms = start.elapsed().as_millis() as u64;

        Ok(ReviewOutcome::from_body(body, latency_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedServer, write_doc};
    use serde_json::json;

    fn client(url: String, retries: usize) -> ReviewClient {
        ReviewClient::new(
            url,
            Duration::from_secs(5),
            RetryPolicy::new(retries, Duration::from_millis(5)),
        )
        .unwrap()
    }

    #[test]
    fn test_structured_body() {
        let outcome = ReviewOutcome::from_body(
            json!({
                "flags": ["A", {"issue": "Ratchet", "severity": "high"}],
                "summary": "ok",
                "meta": {"model_id": "llama3"}
            }),
            12,
        );
        match outcome {
            ReviewOutcome::Structured { latency_ms, flags, summary, meta } => {
                assert_eq!(latency_ms, 12);
                assert_eq!(flags.len(), 2);
                assert_eq!(flags[1].label(), "Ratchet");
                assert_eq!(summary, "ok");
                assert_eq!(meta["model_id"], "llama3");
            }
            other => panic!("expected structured, got {:?}", other),
        }
    }

    #[test]
    fn test_partial_body_is_raw() {
        let body = json!({"result": "flags: none"});
        assert_eq!(
            ReviewOutcome::from_body(body.clone(), 3),
            ReviewOutcome::Raw { latency_ms: 3, body }
        );

        let body = json!({"flags": []});
        assert!(matches!(
            ReviewOutcome::from_body(body, 3),
            ReviewOutcome::Raw { .. }
        ));
    }

    #[tokio::test]
    async fn test_recovers_after_failures() {
        let server = ScriptedServer::start(2).await;
        let dir = tempfile::tempdir().unwrap();
        let doc = write_doc(dir.path(), "seed.txt", "2x participating preferred");

        let outcome = client(server.url(), 2).submit(&doc).await;

        assert_eq!(server.attempts(), 3);
        match outcome {
            ReviewOutcome::Structured { flags, summary, .. } => {
                assert_eq!(flags, vec![Flag::plain("seed.txt")]);
                assert_eq!(summary, "2x participating preferred");
            }
            other => panic!("expected structured, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_exhausted_retries_fail_with_last_error() {
        let server = ScriptedServer::start(10).await;
        let dir = tempfile::tempdir().unwrap();
        let doc = write_doc(dir.path(), "seed.txt", "text");

        let outcome = client(server.url(), 1).submit(&doc).await;

        assert_eq!(server.attempts(), 2);
        match outcome {
            ReviewOutcome::Failed { error } => {
                assert!(error.contains("500"), "unexpected error: {}", error);
                assert!(error.contains("Model not loaded"), "unexpected error: {}", error);
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let doc = write_doc(dir.path(), "seed.txt", "text");

        let outcome = client("http://127.0.0.1:1/review".into(), 1).submit(&doc).await;
        assert!(!outcome.is_ok());
    }

    #[tokio::test]
    async fn test_missing_document_fails() {
        let server = ScriptedServer::start(0).await;
        let outcome = client(server.url(), 1)
            .submit(Path::new("/no/such/term_sheet.docx"))
            .await;

        assert!(matches!(outcome, ReviewOutcome::Failed { .. }));
        assert_eq!(server.attempts(), 0);
    }

    #[tokio::test]
    async fn test_non_json_body_is_raw_text() {
        let server = ScriptedServer::start_raw("model says hi").await;
        let dir = tempfile::tempdir().unwrap();
        let doc = write_doc(dir.path(), "seed.txt", "text");

        let outcome = client(server.url(), 0).submit(&doc).await;
        match outcome {
            ReviewOutcome::Raw { body, .. } => assert_eq!(body, json!("model says hi")),
            other => panic!("expected raw, got {:?}", other),
        }
    }
}
