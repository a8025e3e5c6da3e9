use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum number of flags kept from a structured model response
pub const MAX_FLAGS: usize = 20;
/// Maximum number of flags selected by the keyword fallback
pub const MAX_HEURISTIC_FLAGS: usize = 12;
pub const MAX_FLAG_CHARS: usize = 1000;
pub const MAX_SUMMARY_CHARS: usize = 4000;

/// One reviewer finding. Models emit either bare strings or small objects
/// such as `{"issue": "...", "severity": "high"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged, from = "Value")]
pub enum Flag {
    Labeled {
        // always written so an empty label still reads back as labeled
        issue: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        severity: Option<String>,
    },
    Plain(String),
}

impl Flag {
    pub fn plain(text: impl Into<String>) -> Self {
        Flag::Plain(text.into())
    }

    /// Classify an arbitrary JSON value
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => Flag::Plain(s.clone()),
            Value::Object(map) if map.contains_key("issue") || map.contains_key("severity") => {
                Flag::Labeled {
                    issue: map.get("issue").and_then(scalar_text),
                    severity: map.get("severity").and_then(scalar_text),
                }
            }
            other => Flag::Plain(other.to_string()),
        }
    }

    /// Text this flag is compared on when scoring
    pub fn label(&self) -> &str {
        match self {
            Flag::Plain(text) => text,
            Flag::Labeled { issue, .. } => issue.as_deref().unwrap_or(""),
        }
    }

    pub(crate) fn truncated(self, max_chars: usize) -> Self {
        match self {
            Flag::Plain(text) => Flag::Plain(truncate_chars(&text, max_chars)),
            Flag::Labeled { issue, severity } => Flag::Labeled {
                issue: issue.map(|i| truncate_chars(&i, max_chars)),
                severity,
            },
        }
    }
}

impl From<Value> for Flag {
    fn from(value: Value) -> Self {
        Flag::from_value(&value)
    }
}

/// The guaranteed output shape of a review
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub flags: Vec<Flag>,
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt: u64,
    pub completion: u64,
}

/// Diagnostics attached to every served review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewMeta {
    pub model_id: String,
    pub tokens: TokenUsage,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    #[serde(flatten)]
    pub record: ReviewRecord,
    pub meta: ReviewMeta,
}

/// Render a scalar the way it reads in text: strings unquoted, null as nothing
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
