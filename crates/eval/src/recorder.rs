use anyhow::Result;
use chrono::Utc;
use std::path::PathBuf;
use tracing::info;

use crate::client::ReviewClient;
use crate::record::EvalResult;
use crate::store::EvalLog;

/// Sends documents to the review endpoint one at a time and logs each result
pub struct RunRecorder {
    client: ReviewClient,
    log: EvalLog,
}

impl RunRecorder {
    pub fn new(client: ReviewClient, log: EvalLog) -> Self {
        Self { client, log }
    }

    pub fn log(&self) -> &EvalLog {
        &self.log
    }

    /// Evaluate `paths` in order. A failed document becomes a non-ok record;
    /// only a log write failure stops the run.
    pub async fn run(&self, paths: &[PathBuf]) -> Result<Vec<EvalResult>> {
        let mut records = Vec::with_capacity(paths.len());

        for path in paths {
            let outcome = self.client.submit(path).await;
            let record = EvalResult::from_outcome(path.clone(), outcome, Utc::now().timestamp());

            println!("{}", record);
            self.log.append(&record).await?;

            info!(
                file = %path.display(),
                ok = record.ok,
                latency_ms = ?record.latency_ms,
                "Document evaluated"
            );
            records.push(record);
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryPolicy;
    use crate::testing::{ScriptedServer, write_doc};
    use std::time::Duration;

    #[tokio::test]
    async fn test_every_document_gets_one_line() {
        // First two requests fail; with no retries, the first two documents fail
        let server = ScriptedServer::start(2).await;
        let dir = tempfile::tempdir().unwrap();
        let docs: Vec<PathBuf> = (0..4)
            .map(|i| write_doc(dir.path(), &format!("doc{}.txt", i), "board veto"))
            .collect();

        let client = ReviewClient::new(
            server.url(),
            Duration::from_secs(5),
            RetryPolicy::new(0, Duration::from_millis(1)),
        )
        .unwrap();
        let log_path = dir.path().join("out/results.jsonl");
        let recorder = RunRecorder::new(client, EvalLog::new(&log_path));

        let records = recorder.run(&docs).await.unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records.iter().filter(|r| r.ok).count(), 2);
        assert!(records[0].error.is_some());
        assert_eq!(records[3].flags[0].label(), "doc3.txt");

        let loaded = recorder.log().load().await.unwrap();
        assert_eq!(loaded.records.len(), 4);
        assert_eq!(loaded.malformed, 0);
        assert_eq!(loaded.records, records);

        // A second run accumulates instead of truncating
        recorder.run(&docs[..1]).await.unwrap();
        assert_eq!(recorder.log().load().await.unwrap().records.len(), 5);
    }
}
