use thiserror::Error;

#[derive(Error, Debug)]
pub enum LitCodeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Corpus not available: {0}")]
    MissingCorpus(String),

    #[error("Model load failed: {0}")]
    ModelLoad(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Generation timed out after {0}s")]
    GenerationTimeout(u64),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[cfg(feature = "local-model")]
    #[error("Tensor error: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Custom(String),
}

pub type Result<T> = std::result::Result<T, LitCodeError>;
