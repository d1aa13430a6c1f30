//! Planetary AI - Lunar Mineralogy question answering
//!
//! Retrieval-augmented generation over a fixed corpus: a query is embedded,
//! matched against a pre-built vector index, and the nearest passages are
//! handed to a chat model that answers with numbered citations.
//!
//! # Architecture
//!
//! - **corpus / index / embedding**: read-only collaborators loaded at startup
//! - **rag**: retriever, prompt builder and request pipeline
//! - **models**: generation backends (local GGUF, Ollama)
//! - **server**: `GET /` and `POST /ask`

pub mod errors;
pub mod config;
pub mod corpus;
pub mod index;
pub mod embedding;
pub mod models;
pub mod rag;

// Re-export commonly used types
pub use errors::{RagError, Result};
pub use rag::{Answer, Citation, RagPipeline};

// Application shell
pub mod app;
pub mod cli;
pub mod server;
pub mod telemetry;
