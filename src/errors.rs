//! Error types for Planetary AI
//!
//! Library components return [`RagError`]; the binary wraps startup
//! failures with `anyhow` context before reporting them.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the retrieval and generation pipeline
#[derive(Error, Debug)]
pub enum RagError {
    /// Corpus line could not be decoded as a document record
    #[error("Corpus parse error at {path:?} line {line}: {source}")]
    CorpusParse {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },

    /// Vector index file is malformed or uses an unsupported layout
    #[error("Invalid vector index: {0}")]
    IndexFormat(String),

    /// Query vector does not match the index dimension
    #[error("Dimension mismatch: index expects {expected}, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Embedding model errors (tokenizer, weights, forward pass)
    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    /// Generation model errors
    #[error("Generation error: {0}")]
    GenerationError(String),

    /// Ollama API errors
    #[error("Ollama API error: {0}")]
    OllamaApiError(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Candle tensor errors
    #[error("Tensor error: {0}")]
    TensorError(#[from] candle_core::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic errors with context
    #[error("Pipeline error: {0}")]
    Generic(String),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, RagError>;

/// Convert anyhow errors to RagError
impl From<anyhow::Error> for RagError {
    fn from(err: anyhow::Error) -> Self {
        RagError::Generic(format!("{:#}", err))
    }
}
