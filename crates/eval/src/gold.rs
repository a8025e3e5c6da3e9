use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Labeled reference: a document and the flags it should raise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldExample {
    pub input: String,
    pub expected_flags: Vec<String>,
}

/// Load a JSON Lines gold set. Blank lines are ignored; any malformed line
/// aborts the load.
pub async fn load_gold(path: &Path) -> Result<Vec<GoldExample>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read gold set: {:?}", path))?;

    parse_gold(&content).with_context(|| format!("Invalid gold set: {:?}", path))
}

pub fn parse_gold(content: &str) -> Result<Vec<GoldExample>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str::<GoldExample>(line)
                .with_context(|| format!("Malformed gold example on line {}", idx + 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gold() {
        let content = r#"{"input": "data/eval/a.docx", "expected_flags": ["Full ratchet", "2x preference"]}

{"input": "data/eval/b.docx", "expected_flags": []}
"#;
        let gold = parse_gold(content).unwrap();
        assert_eq!(gold.len(), 2);
        assert_eq!(gold[0].expected_flags, vec!["Full ratchet", "2x preference"]);
        assert!(gold[1].expected_flags.is_empty());
    }

    #[test]
    fn test_malformed_line_aborts() {
        let content = "{\"input\": \"a\", \"expected_flags\": []}\n{\"input\": 3}\n";
        let err = parse_gold(content).unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[tokio::test]
    async fn test_load_gold_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gold.jsonl");
        std::fs::write(&path, "{\"input\": \"a.docx\", \"expected_flags\": [\"veto\"]}\n").unwrap();

        let gold = load_gold(&path).await.unwrap();
        assert_eq!(gold[0].input, "a.docx");
    }
}
