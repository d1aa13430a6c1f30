// End-to-end pipeline: retrieve -> build prompt -> generate -> cite
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::corpus::DocumentRecord;
use crate::errors::Result;
use crate::models::Generator;
use crate::rag::prompt::PromptBuilder;
use crate::rag::retrieval::{Retriever, DEFAULT_TOP_K};

/// Maximum characters of passage text quoted in a citation
pub const CITATION_EXCERPT_CHARS: usize = 200;

/// Reference from the answer back to a prompt passage; `n` matches the `[n]` marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub n: usize,
    pub source: String,
    pub text: String,
}

impl Citation {
    fn from_context(position: usize, doc: &DocumentRecord) -> Self {
        Self {
            n: position + 1,
            source: doc.source.clone(),
            text: doc.text.chars().take(CITATION_EXCERPT_CHARS).collect(),
        }
    }
}

/// Generated answer with its citations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub citations: Vec<Citation>,
}

/// Request handler shared by the HTTP server and the CLI
pub struct RagPipeline {
    retriever: Retriever,
    prompt_builder: PromptBuilder,
    generator: Arc<dyn Generator>,
    top_k: usize,
}

impl RagPipeline {
    pub fn new(retriever: Retriever, prompt_builder: PromptBuilder, generator: Arc<dyn Generator>) -> Self {
        Self {
            retriever,
            prompt_builder,
            generator,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Answer a query with the default number of passages
    pub fn answer(&self, query: &str) -> Result<Answer> {
        self.answer_with_k(query, self.top_k)
    }

    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub fn answer_with_k(&self, query: &str, k: usize) -> Result<Answer> {
        let contexts = self.retriever.retrieve(query, k)?;
        let messages = self.prompt_builder.build_messages(query, &contexts);
        let answer = self.generator.complete(&messages)?;

        let citations = contexts
            .iter()
            .enumerate()
            .map(|(i, doc)| Citation::from_context(i, doc))
            .collect::<Vec<_>>();

        debug!(citations = citations.len(), answer_len = answer.len(), "Answer ready");
        Ok(Answer { answer, citations })
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }
}
