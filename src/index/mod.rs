//! Vector index adapter
//!
//! Exposes k-nearest-neighbor lookup over a pre-built index. Results follow
//! FAISS conventions: exactly `k` slots, nearest first, with id `-1` filling
//! slots the index cannot populate.

pub mod flat;

pub use flat::FlatIndex;

use crate::errors::Result;

/// Sentinel id for unfilled result slots
pub const MISSING_ID: i64 = -1;

/// Similarity metric stored with the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Inner product, higher is closer
    InnerProduct,
    /// Squared euclidean distance, lower is closer
    L2,
}

impl Metric {
    /// Score assigned to padding slots
    pub fn worst_score(self) -> f32 {
        match self {
            Metric::InnerProduct => f32::NEG_INFINITY,
            Metric::L2 => f32::INFINITY,
        }
    }
}

/// One search hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Position of the vector in the index, or [`MISSING_ID`]
    pub id: i64,
    /// Similarity or distance under the index metric
    pub distance: f32,
}

impl Neighbor {
    pub fn is_missing(&self) -> bool {
        self.id < 0
    }
}

/// Nearest-neighbor search over stored vectors
pub trait VectorIndex: Send + Sync {
    /// Vector dimension
    fn dimension(&self) -> usize;

    /// Number of stored vectors
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return `k` slots ordered nearest first
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>>;
}
