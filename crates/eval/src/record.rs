use extract::Flag;
use extract::schema::truncate_chars;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;

use crate::client::ReviewOutcome;

const RAW_PREVIEW_CHARS: usize = 1500;

/// One evaluated document, as written to the results log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalResult {
    pub file: PathBuf,
    pub ok: bool,
    pub latency_ms: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub flags: Vec<Flag>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub meta: Map<String, Value>,
    pub raw: Option<Value>,
    pub error: Option<String>,
    #[serde(alias = "ts")]
    pub timestamp: i64,
}

/// Older log lines carry `null` for collections on failed records
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl EvalResult {
    pub fn from_outcome(file: PathBuf, outcome: ReviewOutcome, timestamp: i64) -> Self {
        let mut result = Self {
            file,
            ok: outcome.is_ok(),
            latency_ms: None,
            flags: Vec::new(),
            summary: String::new(),
            meta: Map::new(),
            raw: None,
            error: None,
            timestamp,
        };

        match outcome {
            ReviewOutcome::Structured {
                latency_ms,
                flags,
                summary,
                meta,
            } => {
                result.latency_ms = Some(latency_ms);
                result.flags = flags;
                result.summary = summary;
                result.meta = meta;
            }
            ReviewOutcome::Raw { latency_ms, body } => {
                result.latency_ms = Some(latency_ms);
                result.raw = Some(body);
            }
            ReviewOutcome::Failed { error } => result.error = Some(error),
        }

        result
    }
}

/// Human-readable block for one record
impl fmt::Display for EvalResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\n---\nFile: {}\n", self.file.display())?;

        if !self.ok {
            return write!(f, "❌ ERROR: {}", self.error.as_deref().unwrap_or("unknown error"));
        }

        match self.latency_ms {
            Some(ms) => write!(f, "✅ OK in {} ms", ms)?,
            None => write!(f, "✅ OK")?,
        }

        if !self.summary.is_empty() {
            write!(f, "\n\nSummary:\n {}", self.summary)?;
        }

        if !self.flags.is_empty() {
            write!(f, "\n\nFlags:")?;
            for (i, flag) in self.flags.iter().enumerate() {
                match flag {
                    Flag::Labeled { issue, severity } => write!(
                        f,
                        "\n  {}. {}  |  severity={}",
                        i + 1,
                        issue.as_deref().unwrap_or("(no issue)"),
                        severity.as_deref().unwrap_or("?")
                    )?,
                    Flag::Plain(text) => write!(f, "\n  {}. {}", i + 1, text)?,
                }
            }
        }

        if self.summary.is_empty() {
            if let Some(raw) = &self.raw {
                let pretty = serde_json::to_string_pretty(raw).unwrap_or_else(|_| raw.to_string());
                write!(
                    f,
                    "\n\nRaw server response:\n {} ...",
                    truncate_chars(&pretty, RAW_PREVIEW_CHARS)
                )?;
            }
        }

        Ok(())
    }
}
