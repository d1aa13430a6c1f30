// Retriever: embeds a query and maps index hits back to corpus records
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::corpus::{Corpus, DocumentRecord};
use crate::embedding::Embedder;
use crate::errors::{RagError, Result};
use crate::index::VectorIndex;

/// Number of passages retrieved per query
pub const DEFAULT_TOP_K: usize = 4;

/// Semantic search over the corpus
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    corpus: Arc<Corpus>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>, corpus: Arc<Corpus>) -> Self {
        Self {
            embedder,
            index,
            corpus,
        }
    }

    /// Return up to `k` records, nearest first.
    ///
    /// Hits whose id does not address a corpus record (the `-1` padding of a
    /// short index, or an index larger than the corpus) are skipped.
    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<&DocumentRecord>> {
        let vector = self.embedder.embed(query)?;
        let neighbors = self.index.search(&vector, k)?;

        let records: Vec<&DocumentRecord> = neighbors
            .iter()
            .filter_map(|n| self.corpus.get(n.id))
            .collect();

        debug!(hits = neighbors.len(), records = records.len(), "Retrieved contexts");
        Ok(records)
    }

    /// Fail when the embedding model cannot produce vectors the index accepts
    pub fn ensure_compatible(&self) -> Result<()> {
        let embedded = self.embedder.dimension();
        let indexed = self.index.dimension();
        if embedded != indexed {
            return Err(RagError::ConfigError(format!(
                "embedding model {} produces {}-dimensional vectors but the index stores {}",
                self.embedder.model_id(),
                embedded,
                indexed
            )));
        }
        Ok(())
    }
}
