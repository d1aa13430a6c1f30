//! Generation model adapters
//!
//! This module provides chat-completion backends behind one trait:
//! - Local GGUF-quantized Llama model running on Candle
//! - Ollama daemon over HTTP

pub mod local;
pub mod ollama;
pub mod types;

// Re-export key types for convenience
pub use local::LocalLlamaGenerator;
pub use ollama::OllamaGenerator;
pub use types::{ChatMessage, GenerationParams, Role};

use crate::config::{GenerationBackend, GenerationConfig};
use crate::errors::Result;
use tracing::info;

/// Chat-style text generation
pub trait Generator: Send + Sync {
    /// Complete a conversation and return the first candidate's text
    fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Build the configured backend
pub fn from_config(config: &GenerationConfig) -> Result<Box<dyn Generator>> {
    let params = GenerationParams::from(config);
    match config.backend {
        GenerationBackend::Local => Ok(Box::new(LocalLlamaGenerator::load(
            &config.model_path,
            &config.tokenizer_path,
            config.context_size,
            config.threads,
            params,
        )?)),
        GenerationBackend::Ollama => {
            let generator =
                OllamaGenerator::new(&config.ollama_url, &config.ollama_model, config.threads, params)?;
            info!(model = generator.model(), url = generator.base_url(), "Using Ollama backend");
            Ok(Box::new(generator))
        }
    }
}
