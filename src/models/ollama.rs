//! Ollama chat backend
//!
//! Non-streaming `POST /api/chat` with fixed decoding options. Both
//! construction and calls use reqwest's blocking client, which panics on an
//! async worker thread; create and call the generator from
//! `spawn_blocking` or a plain thread.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::types::{ChatMessage, GenerationParams};
use super::Generator;
use crate::errors::{RagError, Result};

/// Blocking client for an Ollama daemon
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    client: Client,
    base_url: String,
    model: String,
    threads: usize,
    params: GenerationParams,
}

impl OllamaGenerator {
    pub fn new(base_url: &str, model: &str, threads: usize, params: GenerationParams) -> Result<Self> {
        // Requests run to completion; no client-side timeout
        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(RagError::HttpError)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            threads,
            params,
        })
    }

    /// Get current model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request<'a>(&'a self, messages: &'a [ChatMessage]) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages,
            stream: false,
            options: ChatOptions {
                temperature: self.params.temperature,
                num_predict: self.params.max_tokens,
                num_thread: self.threads,
                seed: self.params.seed,
            },
        }
    }
}

impl Generator for OllamaGenerator {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        debug!(model = %self.model, messages = messages.len(), "Sending chat request");

        let response = self
            .client
            .post(&url)
            .json(&self.request(messages))
            .send()
            .map_err(|e| RagError::OllamaApiError(format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RagError::OllamaApiError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body: ChatResponse = response
            .json()
            .map_err(|e| RagError::OllamaApiError(format!("Failed to parse response: {}", e)))?;

        Ok(body.message.content)
    }
}

/// Ollama chat request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f64,
    num_predict: usize,
    num_thread: usize,
    seed: u64,
}

/// Ollama chat response
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}
