use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::llm::SamplingConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Preprocessed book text, one corpus line per text line
    pub corpus: PathBuf,
    /// Directory holding the fine-tuned model weights and tokenizer
    pub finetuned_model: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            corpus: PathBuf::from("data/processed/book_text.txt"),
            finetuned_model: PathBuf::from("models/finetuned/litcode_model"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub max_context_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_context_chars: default_max_context_chars(),
        }
    }
}

pub(crate) fn default_max_context_chars() -> usize {
    200
}

/// Which inference engine backs both the specialized and the generic model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// In-process inference over safetensors weights
    #[default]
    Local,
    /// Ollama-compatible HTTP server
    Ollama,
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Ollama => write!(f, "ollama"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub engine: Engine,
    /// Pretrained model used when the fine-tuned artifact cannot be loaded
    pub generic_model: String,
    pub temperature: f64,
    pub top_p: f64,
    pub max_input_tokens: usize,
    pub max_new_tokens: usize,
    /// Fixed sampling seed; random per request when unset
    pub seed: Option<u64>,
    pub timeout_secs: u64,
    pub load_timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            engine: Engine::default(),
            generic_model: default_generic_model(),
            temperature: 0.5,
            top_p: 0.95,
            max_input_tokens: 512,
            max_new_tokens: 400,
            seed: None,
            timeout_secs: 120,
            load_timeout_secs: 600,
        }
    }
}

fn default_generic_model() -> String {
    "TinyLlama/TinyLlama-1.1B-Chat-v1.0".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub endpoint: String,
    /// Tag under which the fine-tuned model is served
    pub finetuned_model: String,
    /// Tag of the pretrained fallback model
    pub generic_model: String,
    pub request_timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            finetuned_model: "litcode".to_string(),
            generic_model: "llama3.2:1b".to_string(),
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub backtrace: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            backtrace: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub retrieval: RetrievalConfig,
    pub generation: GenerationConfig,
    pub ollama: OllamaConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default config file path
    pub fn load() -> crate::Result<Self> {
        // Try to load from config.toml first, then fall back to config.example.toml
        if Path::new("config.toml").exists() {
            Self::from_file("config.toml")
        } else if Path::new("config.example.toml").exists() {
            tracing::warn!(
                "Using config.example.toml. Please create config.toml for production use."
            );
            Self::from_file("config.example.toml")
        } else {
            Err(crate::LitCodeError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No config file found. Please create config.toml or config.example.toml",
            )))
        }
    }

    /// Load configuration, using built-in defaults when no file is present
    pub fn load_or_default() -> crate::Result<Self> {
        match Self::load() {
            Ok(config) => Ok(config),
            Err(crate::LitCodeError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("No config file found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        let generation = &self.generation;
        if !(generation.temperature > 0.0) {
            return Err(crate::LitCodeError::ConfigError(format!(
                "generation.temperature must be positive, got {}",
                generation.temperature
            )));
        }
        if !(generation.top_p > 0.0 && generation.top_p <= 1.0) {
            return Err(crate::LitCodeError::ConfigError(format!(
                "generation.top_p must be in (0, 1], got {}",
                generation.top_p
            )));
        }
        if generation.max_input_tokens == 0 || generation.max_new_tokens == 0 {
            return Err(crate::LitCodeError::ConfigError(
                "generation token budgets must be non-zero".to_string(),
            ));
        }
        if generation.timeout_secs == 0 || generation.load_timeout_secs == 0 {
            return Err(crate::LitCodeError::ConfigError(
                "generation timeouts must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml_string(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Get corpus path
    pub fn corpus_path(&self) -> &Path {
        &self.paths.corpus
    }

    /// Get fine-tuned model artifact directory
    pub fn finetuned_model_path(&self) -> &Path {
        &self.paths.finetuned_model
    }

    /// Get retrieval context budget
    pub fn max_context_chars(&self) -> usize {
        self.retrieval.max_context_chars
    }

    /// Sampling parameters for a generation call
    pub fn sampling(&self) -> SamplingConfig {
        SamplingConfig {
            temperature: self.generation.temperature,
            top_p: self.generation.top_p,
            max_input_tokens: self.generation.max_input_tokens,
            max_new_tokens: self.generation.max_new_tokens,
            seed: self.generation.seed,
        }
    }

    /// Upper bound for a single generation call
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation.timeout_secs)
    }

    /// Upper bound for cold-start backend construction
    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.generation.load_timeout_secs)
    }
}
