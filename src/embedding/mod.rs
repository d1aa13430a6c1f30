//! Embedding adapter
//!
//! Maps text to fixed-length, unit-normalized vectors so inner-product search
//! behaves like cosine similarity.

pub mod engine;

pub use engine::MiniLmEmbedder;

use crate::errors::Result;

/// Text embedding model
pub trait Embedder: Send + Sync {
    /// Embed a single text into a unit-length vector
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Get embedding dimension
    fn dimension(&self) -> usize;

    /// Get model identifier
    fn model_id(&self) -> &str;
}

/// Scale a vector to unit L2 norm in place. Zero vectors are left untouched.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}
