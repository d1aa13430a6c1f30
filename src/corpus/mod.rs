//! Corpus store
//!
//! Ordered, immutable sequence of document records loaded once from a
//! newline-delimited JSON file. A record's identity is its position.

use serde::{Deserialize, Deserializer, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

use crate::errors::{RagError, Result};

/// A single corpus passage. Unknown JSON fields are ignored; missing or
/// `null` text and source read as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl DocumentRecord {
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
        }
    }
}

/// Read-only document collection addressed by position
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    docs: Vec<DocumentRecord>,
}

impl Corpus {
    pub fn new(docs: Vec<DocumentRecord>) -> Self {
        Self { docs }
    }

    /// Load a JSONL corpus. Blank lines are skipped; a malformed line fails
    /// with its 1-based line number.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let corpus = Self::from_reader(BufReader::new(file), path)?;
        info!(path = %path.display(), documents = corpus.len(), "Loaded corpus");
        Ok(corpus)
    }

    fn from_reader<R: BufRead>(reader: R, path: &Path) -> Result<Self> {
        let mut docs = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: DocumentRecord =
                serde_json::from_str(&line).map_err(|source| RagError::CorpusParse {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    source,
                })?;
            docs.push(record);
        }
        Ok(Self { docs })
    }

    /// Look up a record by index identifier. Negative or out-of-range ids
    /// yield `None`.
    pub fn get(&self, id: i64) -> Option<&DocumentRecord> {
        usize::try_from(id).ok().and_then(|i| self.docs.get(i))
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

}
