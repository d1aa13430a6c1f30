// Retrieval-augmented answering
//
// Components:
// - Retriever: query -> embedding -> nearest corpus records
// - Prompt Builder: contexts + query -> chat messages
// - Pipeline: retrieve -> prompt -> generate -> cite

pub mod pipeline;
pub mod prompt;
pub mod retrieval;

// Re-export key types
pub use pipeline::{Answer, Citation, RagPipeline, CITATION_EXCERPT_CHARS};
pub use prompt::PromptBuilder;
pub use retrieval::{Retriever, DEFAULT_TOP_K};
