//! Shared fixtures: deterministic embedder, scripted generator, on-disk corpus/index

#![allow(dead_code)]

use planetary_ai::corpus::{Corpus, DocumentRecord};
use planetary_ai::embedding::{l2_normalize, Embedder};
use planetary_ai::errors::{RagError, Result};
use planetary_ai::index::{FlatIndex, Metric};
use planetary_ai::models::{ChatMessage, Generator};
use planetary_ai::rag::{PromptBuilder, RagPipeline, Retriever};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const VOCABULARY: &[&str] = &[
    "olivine", "pyroxene", "plagioclase", "ilmenite", "silicate", "pressure", "magnesium", "basalt",
];

/// Bag-of-keywords embedder; a constant bias keeps every vector non-zero
pub struct KeywordEmbedder;

impl Embedder for KeywordEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let lower = text.to_lowercase();
        let mut v: Vec<f32> = VOCABULARY
            .iter()
            .map(|w| lower.matches(w).count() as f32)
            .collect();
        v.push(0.05);
        l2_normalize(&mut v);
        Ok(v)
    }

    fn dimension(&self) -> usize {
        VOCABULARY.len() + 1
    }

    fn model_id(&self) -> &str {
        "keyword-test"
    }
}

/// Records every prompt and replies with a fixed answer
pub struct ScriptedGenerator {
    pub reply: String,
    pub prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn last_user_message(&self) -> String {
        self.prompts.lock().unwrap().last().unwrap()[1].content.clone()
    }
}

impl Generator for ScriptedGenerator {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        Ok(self.reply.clone())
    }
}

pub struct BrokenGenerator;

impl Generator for BrokenGenerator {
    fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
        Err(RagError::GenerationError("model unavailable".to_string()))
    }
}

pub fn mineral_docs() -> Vec<DocumentRecord> {
    vec![
        DocumentRecord::new("Olivine is a magnesium iron silicate.", "doc1"),
        DocumentRecord::new("Pyroxene forms under high pressure.", "doc2"),
    ]
}

/// Corpus JSONL and FAISS-layout index written to a temp dir
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    /// Write `docs` as JSONL lines and index `index_texts` (one vector each)
    pub fn write(docs_jsonl: &[&str], index_texts: &[&str]) -> Self {
        let dir = TempDir::new().unwrap();

        let mut docs = std::fs::File::create(dir.path().join("docs.jsonl")).unwrap();
        for line in docs_jsonl {
            writeln!(docs, "{}", line).unwrap();
        }

        let embedder = KeywordEmbedder;
        let vectors: Vec<f32> = index_texts
            .iter()
            .flat_map(|t| embedder.embed(t).unwrap())
            .collect();
        FlatIndex::from_vectors(embedder.dimension(), Metric::InnerProduct, vectors)
            .unwrap()
            .save(&dir.path().join("index.faiss"))
            .unwrap();

        Self { dir }
    }

    pub fn minerals() -> Self {
        Self::write(
            &[
                r#"{"text":"Olivine is a magnesium iron silicate.","source":"doc1"}"#,
                r#"{"text":"Pyroxene forms under high pressure.","source":"doc2"}"#,
            ],
            &[
                "Olivine is a magnesium iron silicate.",
                "Pyroxene forms under high pressure.",
            ],
        )
    }

    pub fn pipeline(&self, generator: Arc<dyn Generator>) -> RagPipeline {
        let index = FlatIndex::load(&self.dir.path().join("index.faiss")).unwrap();
        let corpus = Corpus::load(&self.dir.path().join("docs.jsonl")).unwrap();
        let retriever = Retriever::new(Arc::new(KeywordEmbedder), Arc::new(index), Arc::new(corpus));
        RagPipeline::new(retriever, PromptBuilder::default(), generator)
    }
}

/// In-memory pipeline over `docs`, each indexed by its own text
pub fn memory_pipeline(docs: Vec<DocumentRecord>, generator: Arc<dyn Generator>) -> RagPipeline {
    let embedder = KeywordEmbedder;
    let vectors: Vec<f32> = docs
        .iter()
        .flat_map(|d| embedder.embed(&d.text).unwrap())
        .collect();
    let index = FlatIndex::from_vectors(embedder.dimension(), Metric::InnerProduct, vectors).unwrap();
    let retriever = Retriever::new(Arc::new(KeywordEmbedder), Arc::new(index), Arc::new(Corpus::new(docs)));
    RagPipeline::new(retriever, PromptBuilder::default(), generator)
}
