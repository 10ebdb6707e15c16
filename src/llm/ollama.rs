//! Ollama-compatible HTTP engine
//!
//! The fine-tuned model is expected to be served under its own tag
//! (`ollama.finetuned_model`), the pretrained fallback under
//! `ollama.generic_model`. Loading only checks that the tag is available.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;

use crate::config::OllamaConfig;
use crate::errors::LitCodeError;
use crate::errors::Result;
use crate::llm::text::char_budget;
use crate::llm::text::strip_control_tokens;
use crate::llm::text::truncate_on_word_boundary;
use crate::llm::BackendKind;
use crate::llm::GenerationBackend;
use crate::llm::SamplingConfig;

#[derive(Debug, Serialize)]
struct ShowRequest<'a> {
    model: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    /// Skip the server-side chat template; the prompt is already complete
    raw: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
    top_p: f64,
    num_predict: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Model served by an Ollama-compatible server
pub struct OllamaBackend {
    kind: BackendKind,
    model: String,
    endpoint: String,
    client: Client,
}

impl OllamaBackend {
    /// Connect to the model tag for `kind` and verify the server has it
    pub fn connect(config: &OllamaConfig, kind: BackendKind) -> Result<Self> {
        let model = match kind {
            BackendKind::Specialized => config.finetuned_model.clone(),
            BackendKind::Generic => config.generic_model.clone(),
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let backend = Self {
            kind,
            model,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            client,
        };
        backend.ensure_model_available()?;
        info!("Using {} model '{}' at {}", kind, backend.model, backend.endpoint);
        Ok(backend)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.endpoint)
    }

    fn ensure_model_available(&self) -> Result<()> {
        let response = self
            .client
            .post(self.url("/api/show"))
            .json(&ShowRequest { model: &self.model })
            .send()
            .map_err(|e| {
                LitCodeError::ModelLoad(format!("server {} unreachable: {e}", self.endpoint))
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(LitCodeError::ModelLoad(format!(
                "model '{}' not available at {} (HTTP {})",
                self.model,
                self.endpoint,
                response.status()
            )))
        }
    }

    fn request_body<'a>(&'a self, prompt: &'a str, sampling: &SamplingConfig) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            raw: true,
            options: GenerateOptions {
                temperature: sampling.temperature,
                top_p: sampling.top_p,
                num_predict: sampling.max_new_tokens,
                seed: sampling.seed,
            },
        }
    }
}

impl GenerationBackend for OllamaBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    fn generate(&self, prompt: &str, sampling: &SamplingConfig) -> Result<String> {
        let prompt = truncate_on_word_boundary(prompt, char_budget(sampling.max_input_tokens));
        debug!("Requesting completion from '{}'", self.model);

        let response: GenerateResponse = self
            .client
            .post(self.url("/api/generate"))
            .json(&self.request_body(&prompt, sampling))
            .send()?
            .error_for_status()?
            .json()?;

        Ok(strip_control_tokens(&response.response))
    }
}
