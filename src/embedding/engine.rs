// Sentence embeddings via a BERT-family model running on Candle
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use hf_hub::{api::sync::Api, Repo, RepoType};
use serde::Deserialize;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

use super::{l2_normalize, Embedder};
use crate::errors::{RagError, Result};

/// Subset of the model config needed to report the output dimension
#[derive(Debug, Deserialize)]
struct ModelDims {
    hidden_size: usize,
}

/// Mean-pooled, normalized sentence embeddings (all-MiniLM-L6-v2 by default)
pub struct MiniLmEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    model_id: String,
    dimension: usize,
}

impl MiniLmEmbedder {
    /// Load the model from the Hugging Face Hub (cached after first download)
    pub fn new(model_id: &str, max_length: usize) -> Result<Self> {
        let device = Device::Cpu;

        let api = Api::new().map_err(|e| {
            RagError::EmbeddingError(format!("Failed to create HuggingFace API client: {}", e))
        })?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let fetch = |file: &str| {
            repo.get(file).map_err(|e| {
                RagError::EmbeddingError(format!("Failed to download {} for {}: {}", file, model_id, e))
            })
        };
        let config_path = fetch("config.json")?;
        let tokenizer_path = fetch("tokenizer.json")?;
        let weights_path = fetch("model.safetensors")?;

        let config_contents = std::fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_contents)?;
        let dims: ModelDims = serde_json::from_str(&config_contents)?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| RagError::EmbeddingError(format!("Failed to load tokenizer: {}", e)))?;
        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| RagError::EmbeddingError(format!("Failed to configure truncation: {}", e)))?;

        // SAFETY: the safetensors file is owned by the hub cache and not mutated while mapped
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)? };
        let model = BertModel::load(vb, &config)?;

        info!(model = model_id, dimension = dims.hidden_size, "Loaded embedding model");

        Ok(Self {
            model,
            tokenizer,
            device,
            model_id: model_id.to_string(),
            dimension: dims.hidden_size,
        })
    }

    /// Mean pooling with attention mask
    fn mean_pool(embeddings: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let mask = attention_mask.to_dtype(embeddings.dtype())?.unsqueeze(2)?;

        let sum_embeddings = embeddings.broadcast_mul(&mask)?.sum(1)?;
        let sum_mask = mask.sum(1)?.clamp(1e-9, f64::MAX)?;

        Ok(sum_embeddings.broadcast_div(&sum_mask)?)
    }
}

impl Embedder for MiniLmEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| RagError::EmbeddingError(format!("Tokenization failed: {}", e)))?;
        debug!(tokens = encoding.get_ids().len(), "Encoding query");

        let token_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = token_ids.zeros_like()?;

        let hidden = self
            .model
            .forward(&token_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = Self::mean_pool(&hidden, &attention_mask)?;

        let mut vector = pooled.squeeze(0)?.to_vec1::<f32>()?;
        l2_normalize(&mut vector);
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_EMBEDDING_MODEL;

    #[test]
    fn test_mean_pool_ignores_masked_tokens() {
        let device = Device::Cpu;
        let embeddings = Tensor::new(&[[[1.0f32, 2.0], [3.0, 4.0], [100.0, 100.0]]], &device).unwrap();
        let mask = Tensor::new(&[[1u32, 1, 0]], &device).unwrap();

        let pooled = MiniLmEmbedder::mean_pool(&embeddings, &mask).unwrap();
        assert_eq!(pooled.to_vec2::<f32>().unwrap(), vec![vec![2.0, 3.0]]);
    }

    #[test]
    #[ignore] // Integration test - requires model download
    fn test_embedding_dimension() {
        let engine = MiniLmEmbedder::new(DEFAULT_EMBEDDING_MODEL, 256).expect("Failed to create engine");
        assert_eq!(engine.dimension(), 384);
    }

    #[test]
    #[ignore] // Integration test - requires model download
    fn test_embed_is_normalized() {
        let engine = MiniLmEmbedder::new(DEFAULT_EMBEDDING_MODEL, 256).expect("Failed to create engine");
        let embedding = engine.embed("What is olivine?").expect("Failed to embed");
        assert_eq!(embedding.len(), 384);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    #[ignore] // Integration test - requires model download
    fn test_related_text_scores_higher() {
        let engine = MiniLmEmbedder::new(DEFAULT_EMBEDDING_MODEL, 256).expect("Failed to create engine");
        let query = engine.embed("What is olivine?").unwrap();
        let olivine = engine.embed("Olivine is a magnesium iron silicate.").unwrap();
        let pyroxene = engine.embed("Pyroxene forms under high pressure.").unwrap();
        let dot = |a: &[f32], b: &[f32]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
        assert!(dot(&query, &olivine) > dot(&query, &pyroxene));
    }
}
