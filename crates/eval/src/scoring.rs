use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::gold::GoldExample;
use crate::record::EvalResult;

const EPSILON: f64 = 1e-9;

/// Case-insensitive, whitespace-trimmed comparison key
pub fn normalize_flag(flag: &str) -> String {
    flag.trim().to_lowercase()
}

fn flag_set<I, S>(flags: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    flags
        .into_iter()
        .map(|f| normalize_flag(f.as_ref()))
        .filter(|f| !f.is_empty())
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreTally {
    pub true_positive: usize,
    pub false_positive: usize,
    pub false_negative: usize,
}

impl ScoreTally {
    /// Add one example's exact set overlap to the running tally
    pub fn add<P, G, S1, S2>(&mut self, predicted: P, gold: G)
    where
        P: IntoIterator<Item = S1>,
        G: IntoIterator<Item = S2>,
        S1: AsRef<str>,
        S2: AsRef<str>,
    {
        let predicted = flag_set(predicted);
        let gold = flag_set(gold);

        let hits = predicted.intersection(&gold).count();
        self.true_positive += hits;
        self.false_positive += predicted.len() - hits;
        self.false_negative += gold.len() - hits;
    }

    pub fn precision(&self) -> f64 {
        self.true_positive as f64 / ((self.true_positive + self.false_positive) as f64 + EPSILON)
    }

    pub fn recall(&self) -> f64 {
        self.true_positive as f64 / ((self.true_positive + self.false_negative) as f64 + EPSILON)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreReport {
    pub tally: ScoreTally,
    pub precision: f64,
    pub recall: f64,
    /// Gold examples that had a matching record
    pub scored: usize,
    /// Gold examples with no record for their input
    pub unmatched: usize,
}

impl ScoreReport {
    pub fn from_tally(tally: ScoreTally, scored: usize, unmatched: usize) -> Self {
        Self {
            precision: tally.precision(),
            recall: tally.recall(),
            tally,
            scored,
            unmatched,
        }
    }
}

impl fmt::Display for ScoreReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scored: {} example(s), unmatched: {}", self.scored, self.unmatched)?;
        writeln!(
            f,
            "  TP: {}  FP: {}  FN: {}",
            self.tally.true_positive, self.tally.false_positive, self.tally.false_negative
        )?;
        write!(f, "  Precision: {:.3}  Recall: {:.3}", self.precision, self.recall)
    }
}

/// Score records against a gold set. Each gold example is matched to the
/// latest record whose `file` equals its `input`.
pub fn score_run(records: &[EvalResult], gold: &[GoldExample]) -> ScoreReport {
    let latest: HashMap<String, &EvalResult> = records
        .iter()
        .map(|r| (r.file.to_string_lossy().to_string(), r))
        .collect();

    let mut tally = ScoreTally::default();
    let mut scored = 0;
    let mut unmatched = 0;

    for example in gold {
        match latest.get(&example.input) {
            Some(record) => {
                tally.add(record.flags.iter().map(|f| f.label()), &example.expected_flags);
                scored += 1;
            }
            None => unmatched += 1,
        }
    }

    ScoreReport::from_tally(tally, scored, unmatched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ReviewOutcome;
    use extract::Flag;
    use serde_json::Map;
    use std::path::PathBuf;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn record(file: &str, flags: &[&str], timestamp: i64) -> EvalResult {
        EvalResult::from_outcome(
            PathBuf::from(file),
            ReviewOutcome::Structured {
                latency_ms: 1,
                flags: flags.iter().map(|f| Flag::plain(*f)).collect(),
                summary: String::new(),
                meta: Map::new(),
            },
            timestamp,
        )
    }

    fn gold(input: &str, flags: &[&str]) -> GoldExample {
        GoldExample {
            input: input.into(),
            expected_flags: flags.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn test_case_insensitive_overlap() {
        let mut tally = ScoreTally::default();
        tally.add(["A", "b"], ["a", "C"]);

        assert_eq!(
            tally,
            ScoreTally {
                true_positive: 1,
                false_positive: 1,
                false_negative: 1,
            }
        );
        assert!(close(tally.precision(), 0.5));
        assert!(close(tally.recall(), 0.5));
    }

    #[test]
    fn test_trim_and_duplicates() {
        let mut tally = ScoreTally::default();
        tally.add(["  Veto ", "veto", ""], ["VETO"]);
        assert_eq!(tally.true_positive, 1);
        assert_eq!(tally.false_positive, 0);
        assert_eq!(tally.false_negative, 0);
    }

    #[test]
    fn test_empty_tally_has_zero_ratios() {
        let tally = ScoreTally::default();
        assert_eq!(tally.precision(), 0.0);
        assert_eq!(tally.recall(), 0.0);
    }

    #[test]
    fn test_accumulates_across_examples() {
        let mut tally = ScoreTally::default();
        tally.add(["x"], ["x"]);
        tally.add(Vec::<String>::new(), vec!["y".to_string(), "z".to_string()]);
        assert_eq!(tally.true_positive, 1);
        assert_eq!(tally.false_negative, 2);
        assert!(close(tally.precision(), 1.0));
        assert!(close(tally.recall(), 1.0 / 3.0));
    }

    #[test]
    fn test_score_run_matches_latest_record() {
        let records = vec![
            record("a.docx", &["stale"], 1),
            record("b.docx", &["Board control"], 2),
            record("a.docx", &["Full ratchet"], 3),
        ];
        let gold_set = vec![
            gold("a.docx", &["full ratchet"]),
            gold("b.docx", &["board control", "veto"]),
            gold("missing.docx", &["anything"]),
        ];

        let report = score_run(&records, &gold_set);
        assert_eq!(report.scored, 2);
        assert_eq!(report.unmatched, 1);
        assert_eq!(report.tally.true_positive, 2);
        assert_eq!(report.tally.false_positive, 0);
        assert_eq!(report.tally.false_negative, 1);
        assert!(report.to_string().contains("Precision: 1.000"));
    }

    #[test]
    fn test_labeled_flags_score_on_issue() {
        let mut rec = record("a.docx", &[], 1);
        rec.flags = vec![Flag::Labeled {
            issue: Some("ESOP too large".into()),
            severity: Some("medium".into()),
        }];
        let report = score_run(&[rec], &[gold("a.docx", &["esop too large"])]);
        assert_eq!(report.tally.true_positive, 1);
    }
}
