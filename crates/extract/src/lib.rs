pub mod coerce;
pub mod llm;
pub mod prompt;
pub mod schema;

pub use coerce::{Tier, coerce, coerce_with_tier};
pub use llm::{CompletionProvider, Completion, ModelCascade, OllamaClient, OllamaProvider, TextCompletion};
pub use schema::{Flag, Review, ReviewMeta, ReviewRecord, TokenUsage};

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Runs one document through prompt -> completion -> coerce
#[derive(Clone)]
pub struct Reviewer {
    completion: Arc<dyn TextCompletion>,
    max_output_chars: usize,
}

impl Reviewer {
    pub fn new(completion: Arc<dyn TextCompletion>, max_output_chars: usize) -> Self {
        Self {
            completion,
            max_output_chars,
        }
    }

    pub fn model_id(&self) -> &str {
        self.completion.model_id()
    }

    /// Review already-decoded document text
    pub async fn review(&self, document_text: &str) -> Result<Review> {
        let prompt = prompt::build_review_prompt(document_text);

        let start = Instant::now();
        let completion = self.completion
            .complete(&prompt, self.max_output_chars)
            .await
            .context("Text completion failed")?;

        let (record, tier) = coerce_with_tier(&completion.text);
        let latency_ms = start.elapsed().as_millis() as u64;

        debug!(
            model = self.model_id(),
            tier = ?tier,
            flags = record.flags.len(),
            latency_ms,
            "Review coerced"
        );

        Ok(Review {
            record,
            meta: ReviewMeta {
                model_id: self.model_id().to_string(),
                tokens: TokenUsage {
                    prompt: completion.prompt_tokens,
                    completion: completion.completion_tokens,
                },
                latency_ms,
            },
        })
    }
}
