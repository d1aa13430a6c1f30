use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Service title reported by `GET /`
pub const APP_TITLE: &str = "Planetary AI – Lunar Mineralogy Demo";

pub const DEFAULT_INDEX_PATH: &str = "data/index.faiss";
pub const DEFAULT_DOCS_PATH: &str = "data/docs.jsonl";
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const DEFAULT_MODEL_PATH: &str = "models/llama-3.1-3b-instruct-q4_k_m.gguf";
pub const DEFAULT_TOKENIZER_PATH: &str = "models/tokenizer.json";
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2:3b-instruct-q4_K_M";

/// Environment variable controlling generation thread count
pub const THREADS_ENV: &str = "LLAMA_THREADS";

/// Fixed instruction sent as the first chat message
pub const SYSTEM_PROMPT: &str = "You are a lunar mineralogy tutor focused on petrography and geochemistry. \
Answer only using the provided context. \
If the answer is not in the context, say you do not know. \
Be concise and factual.";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub title: String,
    pub system_prompt: String,
    pub server: ServerConfig,
    pub data: DataConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub index_path: PathBuf,
    pub docs_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Hugging Face model repository
    pub model_id: String,
    /// Maximum tokens per encoded query
    pub max_length: usize,
}

/// Which runtime serves chat completions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationBackend {
    /// In-process GGUF model
    Local,
    /// Ollama daemon over HTTP
    Ollama,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub backend: GenerationBackend,
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
    /// Context window in tokens (prompt + completion)
    pub context_size: usize,
    pub threads: usize,
    pub temperature: f64,
    pub max_tokens: usize,
    pub seed: u64,
    pub ollama_url: String,
    pub ollama_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            title: APP_TITLE.to_string(),
            system_prompt: SYSTEM_PROMPT.to_string(),
            server: ServerConfig::default(),
            data: DataConfig::default(),
            embedding: EmbeddingConfig::default(),
            generation: GenerationConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from(DEFAULT_INDEX_PATH),
            docs_path: PathBuf::from(DEFAULT_DOCS_PATH),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_EMBEDDING_MODEL.to_string(),
            max_length: 256,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            backend: GenerationBackend::Local,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            tokenizer_path: PathBuf::from(DEFAULT_TOKENIZER_PATH),
            context_size: 2048,
            threads: 2,
            temperature: 0.2,
            max_tokens: 300,
            seed: 299_792_458,
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            ollama_model: DEFAULT_OLLAMA_MODEL.to_string(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 4 }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the per-user file is read
    /// when present, otherwise built-in defaults apply. `LLAMA_THREADS` is
    /// applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::user_config_path() {
                Some(user_path) if user_path.exists() => Self::from_file(&user_path)?,
                _ => Config::default(),
            },
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    /// Apply environment overrides using the given lookup
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(THREADS_ENV) {
            self.generation.threads = raw
                .trim()
                .parse()
                .with_context(|| format!("{} must be a positive integer, got {:?}", THREADS_ENV, raw))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.generation.threads == 0 {
            bail!("generation.threads must be at least 1");
        }
        if self.generation.max_tokens >= self.generation.context_size {
            bail!(
                "generation.max_tokens ({}) must be smaller than generation.context_size ({})",
                self.generation.max_tokens,
                self.generation.context_size
            );
        }
        if self.retrieval.top_k == 0 {
            bail!("retrieval.top_k must be at least 1");
        }
        Ok(())
    }

    /// Per-user configuration file location
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".planetary-ai").join("config.toml"))
    }

    /// Socket address string for the HTTP server
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.title, APP_TITLE);
        assert_eq!(config.generation.threads, 2);
        assert_eq!(config.generation.temperature, 0.2);
        assert_eq!(config.generation.max_tokens, 300);
        assert_eq!(config.generation.context_size, 2048);
        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.data.index_path, PathBuf::from("data/index.faiss"));
        assert_eq!(config.data.docs_path, PathBuf::from("data/docs.jsonl"));
        assert_eq!(config.generation.backend, GenerationBackend::Local);
    }

    #[test]
    fn test_threads_env_override() {
        let mut config = Config::default();
        config
            .apply_env_overrides(|key| (key == THREADS_ENV).then(|| "8".to_string()))
            .unwrap();
        assert_eq!(config.generation.threads, 8);
    }

    #[test]
    fn test_threads_env_absent_keeps_default() {
        let mut config = Config::default();
        config.apply_env_overrides(|_| None).unwrap();
        assert_eq!(config.generation.threads, 2);
    }

    #[test]
    fn test_threads_env_invalid() {
        let mut config = Config::default();
        let result = config.apply_env_overrides(|_| Some("many".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nport = 9000\n\n[generation]\nbackend = \"ollama\"\nollama_model = \"llama3.1:8b\""
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.generation.backend, GenerationBackend::Ollama);
        assert_eq!(config.generation.ollama_model, "llama3.1:8b");
        assert_eq!(config.generation.max_tokens, 300);
        assert_eq!(config.title, APP_TITLE);
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let result = Config::load(Some(Path::new("/nonexistent/planetary.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_completion() {
        let mut config = Config::default();
        config.generation.max_tokens = 4096;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_string = toml::to_string(&config).unwrap();
        assert!(toml_string.contains("all-MiniLM-L6-v2"));

        let deserialized: Config = toml::from_str(&toml_string).unwrap();
        assert_eq!(deserialized.generation.model_path, config.generation.model_path);
    }
}
