use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::schema::{
    Flag, MAX_FLAG_CHARS, MAX_FLAGS, MAX_HEURISTIC_FLAGS, MAX_SUMMARY_CHARS, ReviewRecord,
    scalar_text, truncate_chars,
};

/// Terms that mark a line as a likely off-market clause
pub const KEYWORDS: &[&str] = &[
    "liquidation",
    "preference",
    "participating",
    "cap",
    "anti-dilution",
    "ratchet",
    "board",
    "veto",
    "drag",
    "tag",
    "rofr",
    "esop",
    "pool",
];

const SUMMARY_LINES: usize = 5;

/// Greedy: first `{` through last `}`
static OUTER_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("static block pattern"));

/// Which strategy produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Direct,
    Embedded,
    Heuristic,
}

/// Turn arbitrary model output into a `ReviewRecord`. Never fails.
pub fn coerce(raw: &str) -> ReviewRecord {
    coerce_with_tier(raw).0
}

pub fn coerce_with_tier(raw: &str) -> (ReviewRecord, Tier) {
    if let Some(record) = parse_structured(raw) {
        return (record, Tier::Direct);
    }

    if let Some(block) = OUTER_BLOCK.find(raw) {
        if let Some(record) = parse_structured(block.as_str()) {
            return (record, Tier::Embedded);
        }
    }

    (heuristic(raw), Tier::Heuristic)
}

/// Parse `text` as a JSON object with optional `flags` (array) and `summary`.
/// Anything else, including a non-array `flags`, is a miss.
fn parse_structured(text: &str) -> Option<ReviewRecord> {
    let value: Value = serde_json::from_str(text).ok()?;
    let object = value.as_object()?;

    let flags = match object.get("flags") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .take(MAX_FLAGS)
            .map(|item| Flag::from_value(item).truncated(MAX_FLAG_CHARS))
            .collect(),
        Some(_) => return None,
    };

    let summary = object
        .get("summary")
        .and_then(scalar_text)
        .map(|s| truncate_chars(&s, MAX_SUMMARY_CHARS))
        .unwrap_or_default();

    Some(ReviewRecord { flags, summary })
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0b}' | '\u{0c}' | '\u{1c}' | '\u{1d}' | '\u{1e}' | '\u{85}' | '\u{2028}'
            | '\u{2029}'
    )
}

fn heuristic(raw: &str) -> ReviewRecord {
    let lines: Vec<&str> = raw
        .split(is_line_break)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let flags = lines
        .iter()
        .filter(|line| {
            let lower = line.to_lowercase();
            KEYWORDS.iter().any(|k| lower.contains(k))
        })
        .take(MAX_HEURISTIC_FLAGS)
        .map(|line| Flag::plain(truncate_chars(line, MAX_FLAG_CHARS)))
        .collect();

    let head = lines
        .iter()
        .take(SUMMARY_LINES)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");

    ReviewRecord {
        flags,
        summary: truncate_chars(&head, MAX_SUMMARY_CHARS),
    }
}
