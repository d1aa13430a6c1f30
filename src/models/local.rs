//! In-process generation with a GGUF-quantized Llama model
//!
//! Weights are loaded once and cloned per request (tensors are reference
//! counted), so every completion runs with its own KV cache and no lock is
//! taken on the shared model.

use candle_core::quantized::gguf_file;
use candle_core::{Device, Tensor};
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::quantized_llama::ModelWeights;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::fs::File;
use std::path::Path;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use super::types::{ChatMessage, GenerationParams, Role};
use super::Generator;
use crate::errors::{RagError, Result};

const BEGIN_OF_TEXT: &str = "<|begin_of_text|>";
const END_OF_TURN: &str = "<|eot_id|>";
const END_OF_TEXT: &str = "<|end_of_text|>";

/// Local Llama chat model
pub struct LocalLlamaGenerator {
    weights: ModelWeights,
    tokenizer: Tokenizer,
    device: Device,
    pool: ThreadPool,
    context_size: usize,
    params: GenerationParams,
    stop_tokens: Vec<u32>,
}

impl LocalLlamaGenerator {
    /// Load GGUF weights and the matching `tokenizer.json`
    pub fn load(
        model_path: &Path,
        tokenizer_path: &Path,
        context_size: usize,
        threads: usize,
        params: GenerationParams,
    ) -> Result<Self> {
        let device = Device::Cpu;

        let mut file = File::open(model_path)?;
        let content = gguf_file::Content::read(&mut file).map_err(|e| e.with_path(model_path))?;
        let weights = ModelWeights::from_gguf(content, &mut file, &device)?;

        let tokenizer = Tokenizer::from_file(tokenizer_path).map_err(|e| {
            RagError::GenerationError(format!(
                "Failed to load tokenizer {}: {}",
                tokenizer_path.display(),
                e
            ))
        })?;

        let stop_tokens: Vec<u32> = [END_OF_TURN, END_OF_TEXT]
            .iter()
            .filter_map(|t| tokenizer.token_to_id(t))
            .collect();
        if stop_tokens.is_empty() {
            return Err(RagError::GenerationError(
                "Tokenizer defines no end-of-turn token".to_string(),
            ));
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("llama-{}", i))
            .build()
            .map_err(|e| RagError::GenerationError(format!("Failed to build thread pool: {}", e)))?;

        info!(
            model = %model_path.display(),
            context_size,
            threads,
            "Loaded generation model"
        );

        Ok(Self {
            weights,
            tokenizer,
            device,
            pool,
            context_size,
            params,
            stop_tokens,
        })
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        let encoding = self
            .tokenizer
            .encode(prompt, false)
            .map_err(|e| RagError::GenerationError(format!("Tokenization failed: {}", e)))?;
        let prompt_tokens = encoding.get_ids();
        let budget = completion_budget(prompt_tokens.len(), self.context_size, self.params.max_tokens)?;
        debug!(prompt_tokens = prompt_tokens.len(), budget, "Generating completion");

        let mut model = self.weights.clone();
        let mut sampler = LogitsProcessor::new(self.params.seed, Some(self.params.temperature), None);

        let input = Tensor::new(prompt_tokens, &self.device)?.unsqueeze(0)?;
        let logits = model.forward(&input, 0)?.squeeze(0)?;
        let mut next = sampler.sample(&logits)?;
        let mut index_pos = prompt_tokens.len();

        let mut generated = Vec::with_capacity(budget);
        while !self.stop_tokens.contains(&next) {
            generated.push(next);
            if generated.len() >= budget {
                break;
            }
            let input = Tensor::new(&[next], &self.device)?.unsqueeze(0)?;
            let logits = model.forward(&input, index_pos)?.squeeze(0)?;
            index_pos += 1;
            next = sampler.sample(&logits)?;
        }

        debug!(completion_tokens = generated.len(), "Completion finished");
        self.tokenizer
            .decode(&generated, true)
            .map_err(|e| RagError::GenerationError(format!("Detokenization failed: {}", e)))
    }
}

impl Generator for LocalLlamaGenerator {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let prompt = render_llama3_prompt(messages);
        self.pool.install(|| self.generate(&prompt))
    }
}

/// Render messages with the Llama 3 chat template, leaving the assistant turn open
pub fn render_llama3_prompt(messages: &[ChatMessage]) -> String {
    let mut prompt = String::from(BEGIN_OF_TEXT);
    for message in messages {
        push_header(&mut prompt, message.role);
        prompt.push_str(message.content.trim());
        prompt.push_str(END_OF_TURN);
    }
    push_header(&mut prompt, Role::Assistant);
    prompt
}

fn push_header(prompt: &mut String, role: Role) {
    prompt.push_str("<|start_header_id|>");
    prompt.push_str(role.as_str());
    prompt.push_str("<|end_header_id|>\n\n");
}

/// Tokens available for the completion. A prompt that fills the whole
/// context window is an error; otherwise the request is clipped to fit.
pub fn completion_budget(prompt_len: usize, context_size: usize, max_tokens: usize) -> Result<usize> {
    if prompt_len >= context_size {
        return Err(RagError::GenerationError(format!(
            "Requested tokens ({}) exceed context window of {}",
            prompt_len, context_size
        )));
    }
    Ok(max_tokens.min(context_size - prompt_len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_MODEL_PATH, DEFAULT_TOKENIZER_PATH};

    #[test]
    fn test_render_llama3_prompt() {
        let prompt = render_llama3_prompt(&[
            ChatMessage::system("Be concise."),
            ChatMessage::user("What is olivine?"),
        ]);
        assert_eq!(
            prompt,
            "<|begin_of_text|><|start_header_id|>system<|end_header_id|>\n\nBe concise.<|eot_id|>\
             <|start_header_id|>user<|end_header_id|>\n\nWhat is olivine?<|eot_id|>\
             <|start_header_id|>assistant<|end_header_id|>\n\n"
        );
    }

    #[test]
    fn test_completion_budget_full_request_fits() {
        assert_eq!(completion_budget(500, 2048, 300).unwrap(), 300);
    }

    #[test]
    fn test_completion_budget_clipped_near_limit() {
        assert_eq!(completion_budget(1900, 2048, 300).unwrap(), 148);
    }

    #[test]
    fn test_completion_budget_prompt_overflows() {
        assert!(completion_budget(2048, 2048, 300).is_err());
    }

    #[test]
    #[ignore] // Integration test - requires the GGUF model on disk
    fn test_local_completion() {
        let generator = LocalLlamaGenerator::load(
            Path::new(DEFAULT_MODEL_PATH),
            Path::new(DEFAULT_TOKENIZER_PATH),
            2048,
            2,
            GenerationParams::default(),
        )
        .expect("Failed to load model");
        let answer = generator
            .complete(&[ChatMessage::user("Name one lunar mineral.")])
            .expect("Completion failed");
        assert!(!answer.trim().is_empty());
    }
}
