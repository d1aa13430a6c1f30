//! Process-wide application context
//!
//! Corpus, index, embedder and generator are loaded once at startup and
//! shared read-only by every request.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::corpus::Corpus;
use crate::embedding::MiniLmEmbedder;
use crate::index::{FlatIndex, VectorIndex};
use crate::models;
use crate::rag::{PromptBuilder, RagPipeline, Retriever};

/// Immutable state shared across request handlers
pub struct AppContext {
    title: String,
    pipeline: RagPipeline,
}

impl AppContext {
    pub fn new(title: impl Into<String>, pipeline: RagPipeline) -> Self {
        Self {
            title: title.into(),
            pipeline,
        }
    }

    /// Load every collaborator named by the configuration. Blocking; any
    /// failure aborts startup.
    pub fn load(config: &Config) -> Result<Self> {
        let index = FlatIndex::load(&config.data.index_path).with_context(|| {
            format!("Failed to load vector index {}", config.data.index_path.display())
        })?;

        let corpus = Corpus::load(&config.data.docs_path).with_context(|| {
            format!("Failed to load corpus {}", config.data.docs_path.display())
        })?;
        let metric = index.metric();
        if corpus.len() != index.len() {
            // Out-of-range hits are skipped at query time
            tracing::warn!(
                documents = corpus.len(),
                vectors = index.len(),
                "Corpus and index sizes differ"
            );
        }

        let embedder = MiniLmEmbedder::new(&config.embedding.model_id, config.embedding.max_length)
            .with_context(|| format!("Failed to load embedding model {}", config.embedding.model_id))?;

        let retriever = Retriever::new(Arc::new(embedder), Arc::new(index), Arc::new(corpus));
        retriever
            .ensure_compatible()
            .context("Embedding model does not match the vector index")?;

        let generator = models::from_config(&config.generation)
            .context("Failed to initialize generation model")?;

        let pipeline = RagPipeline::new(
            retriever,
            PromptBuilder::new(config.system_prompt.clone()),
            Arc::from(generator),
        )
        .with_top_k(config.retrieval.top_k);

        info!(backend = ?config.generation.backend, ?metric, "Application context ready");
        Ok(Self::new(config.title.clone(), pipeline))
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn pipeline(&self) -> &RagPipeline {
        &self.pipeline
    }
}
