use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub ollama_url: String,
    /// Candidate models in priority order
    pub models: Vec<String>,
    pub max_input_chars: usize,
    pub max_output_chars: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            models: vec![
                "llama3".to_string(),
                "mistral".to_string(),
                "tinyllama".to_string(),
                "qwen2.5:0.5b".to_string(),
            ],
            max_input_chars: 3000,
            max_output_chars: 1024,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(url) = lookup("OLLAMA_URL") {
            config.ollama_url = url.trim_end_matches('/').to_string();
        }

        let fallbacks = match lookup("FALLBACK_MODELS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(String::from)
                .collect(),
            None => config.models[1..].to_vec(),
        };
        let base = lookup("BASE_MODEL").unwrap_or_else(|| config.models[0].clone());
        config.models = std::iter::once(base)
            .chain(fallbacks)
            .fold(Vec::new(), |mut models, m| {
                if !models.contains(&m) {
                    models.push(m);
                }
                models
            });

        if let Some(raw) = lookup("MAX_INPUT_CHARS") {
            config.max_input_chars = raw
                .parse()
                .with_context(|| format!("Invalid MAX_INPUT_CHARS: {}", raw))?;
        }
        if let Some(raw) = lookup("MAX_OUTPUT_CHARS") {
            config.max_output_chars = raw
                .parse()
                .with_context(|| format!("Invalid MAX_OUTPUT_CHARS: {}", raw))?;
        }

        Ok(config)
    }
}
