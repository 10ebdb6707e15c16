//! In-process inference for Llama-family causal models
//!
//! The specialized model is read from the fine-tuned artifact directory
//! (`config.json`, `tokenizer.json`, `*.safetensors`); the generic model is
//! fetched from the Hugging Face hub cache.
//!
//! Inference is only available when the `local-model` feature is enabled.

use std::path::Path;
use std::path::PathBuf;

#[cfg(feature = "local-model")]
use candle_core::DType;
#[cfg(feature = "local-model")]
use candle_core::Device;
#[cfg(feature = "local-model")]
use candle_core::Tensor;
#[cfg(feature = "local-model")]
use candle_nn::VarBuilder;
#[cfg(feature = "local-model")]
use candle_transformers::generation::LogitsProcessor;
#[cfg(feature = "local-model")]
use candle_transformers::models::llama::Cache;
#[cfg(feature = "local-model")]
use candle_transformers::models::llama::Config;
#[cfg(feature = "local-model")]
use candle_transformers::models::llama::Llama;
#[cfg(feature = "local-model")]
use candle_transformers::models::llama::LlamaConfig;
#[cfg(feature = "local-model")]
use candle_transformers::models::llama::LlamaEosToks;
#[cfg(feature = "local-model")]
use tokenizers::Tokenizer;
use tracing::debug;
#[cfg(feature = "local-model")]
use tracing::info;
#[cfg(feature = "local-model")]
use tracing::warn;

use crate::errors::LitCodeError;
use crate::errors::Result;
use crate::llm::BackendKind;
use crate::llm::GenerationBackend;
use crate::llm::SamplingConfig;

pub const CONFIG_FILE: &str = "config.json";
pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const WEIGHTS_FILE: &str = "model.safetensors";

/// Files making up one model artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: Vec<PathBuf>,
}

impl ModelFiles {
    /// Locate the artifact files in a fine-tuned model directory
    pub fn from_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(LitCodeError::ModelLoad(format!(
                "model directory not found: {}",
                dir.display()
            )));
        }

        let config = dir.join(CONFIG_FILE);
        let tokenizer = dir.join(TOKENIZER_FILE);
        for required in [&config, &tokenizer] {
            if !required.is_file() {
                return Err(LitCodeError::ModelLoad(format!(
                    "missing {}",
                    required.display()
                )));
            }
        }

        let mut weights: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "safetensors"))
            .collect();
        if weights.is_empty() {
            return Err(LitCodeError::ModelLoad(format!(
                "no .safetensors weights in {}",
                dir.display()
            )));
        }
        // shards load in name order
        weights.sort();

        debug!("Found {} weight file(s) in {}", weights.len(), dir.display());
        Ok(Self {
            config,
            tokenizer,
            weights,
        })
    }

    /// Fetch the artifact files of a hub model, using the local cache when present
    #[cfg(feature = "local-model")]
    pub fn from_hub(model_id: &str) -> Result<Self> {
        let api = hf_hub::api::sync::Api::new()
            .map_err(|e| LitCodeError::ModelLoad(format!("hub client: {e}")))?;
        let repo = api.model(model_id.to_string());
        let fetch = |file: &str| {
            repo.get(file)
                .map_err(|e| LitCodeError::ModelLoad(format!("{model_id}/{file}: {e}")))
        };

        Ok(Self {
            config: fetch(CONFIG_FILE)?,
            tokenizer: fetch(TOKENIZER_FILE)?,
            weights: vec![fetch(WEIGHTS_FILE)?],
        })
    }
}

/// Llama-family model, tokenizer and device loaded into memory
#[cfg(feature = "local-model")]
pub struct LocalModelBackend {
    kind: BackendKind,
    model_id: String,
    model: Llama,
    config: Config,
    tokenizer: Tokenizer,
    eos_token_ids: Vec<u32>,
    device: Device,
}

#[cfg(feature = "local-model")]
impl LocalModelBackend {
    /// Load the fine-tuned model from its artifact directory
    pub fn specialized(artifact_dir: &Path) -> Result<Self> {
        let files = ModelFiles::from_dir(artifact_dir)?;
        Self::load(
            BackendKind::Specialized,
            artifact_dir.display().to_string(),
            &files,
        )
    }

    /// Load a pretrained model from the hub
    pub fn generic(model_id: &str) -> Result<Self> {
        let files = ModelFiles::from_hub(model_id)?;
        Self::load(BackendKind::Generic, model_id.to_string(), &files)
    }

    fn load(kind: BackendKind, model_id: String, files: &ModelFiles) -> Result<Self> {
        info!("Loading {} model from {}", kind, model_id);

        let device = Device::cuda_if_available(0)?;
        debug!("Using device: {:?}", device);

        let tokenizer = Tokenizer::from_file(&files.tokenizer).map_err(|e| {
            LitCodeError::Tokenizer(format!("{}: {e}", files.tokenizer.display()))
        })?;

        let raw_config = std::fs::read(&files.config)?;
        let llama_config: LlamaConfig = serde_json::from_slice(&raw_config)?;
        let config = llama_config.into_config(false);

        // SAFETY: weight files are not modified while mapped
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&files.weights, DType::F32, &device)? };
        let model = Llama::load(vb, &config)?;

        let mut eos_token_ids = match &config.eos_token_id {
            Some(LlamaEosToks::Single(id)) => vec![*id],
            Some(LlamaEosToks::Multiple(ids)) => ids.clone(),
            None => Vec::new(),
        };
        for marker in ["</s>", "<|endoftext|>"] {
            if let Some(id) = tokenizer.token_to_id(marker) {
                if !eos_token_ids.contains(&id) {
                    eos_token_ids.push(id);
                }
            }
        }

        info!("Model {} loaded", model_id);
        Ok(Self {
            kind,
            model_id,
            model,
            config,
            tokenizer,
            eos_token_ids,
            device,
        })
    }

    fn encode_prompt(&self, prompt: &str, max_input_tokens: usize) -> Result<Vec<u32>> {
        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| LitCodeError::Tokenizer(format!("encoding failed: {e}")))?;

        let mut tokens = encoding.get_ids().to_vec();
        if tokens.len() > max_input_tokens {
            warn!(
                "Prompt has {} tokens, truncating to {}",
                tokens.len(),
                max_input_tokens
            );
            tokens.truncate(max_input_tokens);
        }
        Ok(tokens)
    }
}

#[cfg(feature = "local-model")]
impl GenerationBackend for LocalModelBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn generate(&self, prompt: &str, sampling: &SamplingConfig) -> Result<String> {
        let mut tokens = self.encode_prompt(prompt, sampling.max_input_tokens)?;
        let prompt_len = tokens.len();
        if prompt_len == 0 {
            return Err(LitCodeError::Generation("empty prompt".to_string()));
        }

        let seed = sampling.seed.unwrap_or_else(rand::random);
        let mut logits_processor =
            LogitsProcessor::new(seed, Some(sampling.temperature), Some(sampling.top_p));
        let mut cache = Cache::new(true, DType::F32, &self.config, &self.device)?;

        let mut index_pos = 0;
        for index in 0..sampling.max_new_tokens {
            // the whole prompt first, then one token at a time against the kv cache
            let context_size = if index > 0 { 1 } else { tokens.len() };
            let ctxt = &tokens[tokens.len().saturating_sub(context_size)..];
            let input = Tensor::new(ctxt, &self.device)?.unsqueeze(0)?;
            let logits = self.model.forward(&input, index_pos, &mut cache)?;
            let logits = logits.squeeze(0)?;
            index_pos += ctxt.len();

            let next_token = logits_processor.sample(&logits)?;
            tokens.push(next_token);
            if self.eos_token_ids.contains(&next_token) {
                break;
            }
        }

        debug!("Generated {} tokens", tokens.len() - prompt_len);
        let text = self
            .tokenizer
            .decode(&tokens[prompt_len..], true)
            .map_err(|e| LitCodeError::Tokenizer(format!("decoding failed: {e}")))?;

        Ok(crate::llm::text::strip_control_tokens(&text))
    }
}

// Stub implementation when local-model feature is disabled
#[cfg(not(feature = "local-model"))]
pub struct LocalModelBackend {
    _private: (),
}

#[cfg(not(feature = "local-model"))]
impl LocalModelBackend {
    pub fn specialized(artifact_dir: &Path) -> Result<Self> {
        ModelFiles::from_dir(artifact_dir)?;
        Err(Self::not_compiled())
    }

    pub fn generic(_model_id: &str) -> Result<Self> {
        Err(Self::not_compiled())
    }

    fn not_compiled() -> LitCodeError {
        LitCodeError::ModelLoad(
            "Local inference not compiled. Enable the 'local-model' feature.".to_string(),
        )
    }
}

#[cfg(not(feature = "local-model"))]
impl GenerationBackend for LocalModelBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Generic
    }

    fn model_id(&self) -> &str {
        ""
    }

    fn generate(&self, _prompt: &str, _sampling: &SamplingConfig) -> Result<String> {
        Err(Self::not_compiled())
    }
}
