use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::schema::truncate_chars;

/// Raw model text plus whatever usage counts the backend reported
#[derive(Debug, Clone, Default)]
pub struct Completion {
    pub text: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// A loaded text-generation capability
#[async_trait]
pub trait TextCompletion: Send + Sync {
    fn model_id(&self) -> &str;

    /// Complete `prompt`; the returned text is at most `max_chars` characters
    async fn complete(&self, prompt: &str, max_chars: usize) -> Result<Completion>;
}

/// Something that can produce a `TextCompletion`, e.g. by loading a model
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn initialize(&self) -> Result<Arc<dyn TextCompletion>>;
}

#[derive(Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    num_predict: usize,
    temperature: f32,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
    #[serde(default)]
    prompt_eval_count: u64,
    #[serde(default)]
    eval_count: u64,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            base_url,
            model,
            client: reqwest::Client::new(),
        }
    }

    pub async fn generate(&self, prompt: &str, max_chars: usize) -> Result<Completion> {
        let url = format!("{}/api/generate", self.base_url);

        // ~4 characters per token
        let request = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: OllamaOptions {
                num_predict: (max_chars / 4).max(16),
                temperature: 0.0,
            },
        };

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Ollama")?;

        if !response.status().is_success() {
            anyhow::bail!("Ollama request failed: {}", response.status());
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        Ok(Completion {
            text: truncate_chars(&ollama_response.response, max_chars),
            prompt_tokens: ollama_response.prompt_eval_count,
            completion_tokens: ollama_response.eval_count,
        })
    }
}

#[async_trait]
impl TextCompletion for OllamaClient {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, max_chars: usize) -> Result<Completion> {
        self.generate(prompt, max_chars).await
    }
}

/// Loads one Ollama model and proves it answers before handing it out
pub struct OllamaProvider {
    base_url: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl CompletionProvider for OllamaProvider {
    fn name(&self) -> &str {
        &self.model
    }

    async fn initialize(&self) -> Result<Arc<dyn TextCompletion>> {
        let client = OllamaClient::new(self.base_url.clone(), self.model.clone());
        client
            .generate("Summarize:\nHello", 64)
            .await
            .with_context(|| format!("Warm-up failed for model {}", self.model))?;
        Ok(Arc::new(client))
    }
}

/// Ordered fallback over candidate providers; the first one that initializes wins
pub struct ModelCascade {
    providers: Vec<Box<dyn CompletionProvider>>,
}

impl ModelCascade {
    pub fn new(providers: Vec<Box<dyn CompletionProvider>>) -> Self {
        Self { providers }
    }

    pub fn ollama(base_url: &str, models: &[String]) -> Self {
        Self::new(
            models
                .iter()
                .map(|m| Box::new(OllamaProvider::new(base_url, m.as_str())) as Box<dyn CompletionProvider>)
                .collect(),
        )
    }

    pub async fn initialize(&self) -> Result<Arc<dyn TextCompletion>> {
        let mut last_error = None;

        for provider in &self.providers {
            match provider.initialize().await {
                Ok(completion) => {
                    info!(model = provider.name(), "Model loaded");
                    return Ok(completion);
                }
                Err(e) => {
                    warn!(model = provider.name(), error = %e, "Model failed to load");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e.context("Failed to load any model")),
            None => anyhow::bail!("No model candidates configured"),
        }
    }
}
