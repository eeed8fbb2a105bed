//! LLM integration.
//!
//! Supports any OpenAI-compatible chat completions endpoint. The scoring
//! orchestrator depends only on the `LlmProvider` trait.

mod openai;
pub mod provider;

pub use openai::OpenAiProvider;
pub use provider::*;

use std::sync::Arc;
use std::time::Duration;

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    OpenAi,
}

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub api_key: secrecy::SecretString,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Arc<dyn LlmProvider> {
    match config.backend {
        LlmBackend::OpenAi => {
            tracing::info!("Using OpenAI-compatible API (model: {})", config.model);
            Arc::new(OpenAiProvider::new(
                config.api_key.clone(),
                &config.base_url,
                &config.model,
                config.timeout,
            ))
        }
    }
}
