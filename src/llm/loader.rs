//! Backend selection: fine-tuned model first, pretrained model as fallback

use tracing::error;
use tracing::info;
use tracing::warn;

use crate::config::AppConfig;
use crate::config::Engine;
use crate::errors::Result;
use crate::llm::BackendHandle;
use crate::llm::BackendKind;
use crate::llm::LocalModelBackend;
use crate::llm::OllamaBackend;

/// Outcome of the two-step backend load
#[derive(Debug)]
pub enum BackendSelection {
    /// Fine-tuned model loaded
    Specialized(BackendHandle),
    /// Fine-tuned model failed, pretrained model loaded instead
    Generic {
        handle: BackendHandle,
        specialized_error: String,
    },
    /// Neither model could be loaded
    Unavailable {
        specialized_error: String,
        generic_error: String,
    },
}

impl BackendSelection {
    #[must_use]
    pub fn handle(&self) -> Option<&BackendHandle> {
        match self {
            Self::Specialized(handle) | Self::Generic { handle, .. } => Some(handle),
            Self::Unavailable { .. } => None,
        }
    }

    #[must_use]
    pub fn into_handle(self) -> Option<BackendHandle> {
        match self {
            Self::Specialized(handle) | Self::Generic { handle, .. } => Some(handle),
            Self::Unavailable { .. } => None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> Option<BackendKind> {
        self.handle().map(BackendHandle::kind)
    }
}

/// Try the specialized loader, then the generic one
///
/// The generic loader only runs when the specialized one fails.
pub fn select_backend<S, G>(load_specialized: S, load_generic: G) -> BackendSelection
where
    S: FnOnce() -> Result<BackendHandle>,
    G: FnOnce() -> Result<BackendHandle>,
{
    let specialized_error = match load_specialized() {
        Ok(handle) => {
            info!("Loaded fine-tuned model from {}", handle.model_id());
            return BackendSelection::Specialized(handle);
        }
        Err(e) => e.to_string(),
    };

    warn!("Failed to load fine-tuned model: {specialized_error}. Using pre-trained model.");
    match load_generic() {
        Ok(handle) => {
            info!("Loaded pre-trained model {}", handle.model_id());
            BackendSelection::Generic {
                handle,
                specialized_error,
            }
        }
        Err(e) => {
            error!("Failed to load pre-trained model: {e}. Answers will use fallback templates.");
            BackendSelection::Unavailable {
                specialized_error,
                generic_error: e.to_string(),
            }
        }
    }
}

/// Load the backend for the configured engine
///
/// Blocking: reads model weights or contacts the inference server.
pub fn load_backend(config: &AppConfig) -> BackendSelection {
    match config.generation.engine {
        Engine::Local => select_backend(
            || LocalModelBackend::specialized(config.finetuned_model_path()).map(BackendHandle::new),
            || LocalModelBackend::generic(&config.generation.generic_model).map(BackendHandle::new),
        ),
        Engine::Ollama => select_backend(
            || OllamaBackend::connect(&config.ollama, BackendKind::Specialized).map(BackendHandle::new),
            || OllamaBackend::connect(&config.ollama, BackendKind::Generic).map(BackendHandle::new),
        ),
    }
}
