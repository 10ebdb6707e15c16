//! Text generation backends
//!
//! Two model variants sit behind [`GenerationBackend`]: the fine-tuned
//! (specialized) model and a generic pretrained fallback. Either can run on
//! the in-process engine ([`local`]) or an Ollama-compatible server
//! ([`ollama`]). The selected backend is loaded once and shared through a
//! [`BackendHandle`]; inference on one handle is serialized.

pub mod loader;
pub mod local;
pub mod ollama;
pub mod text;

use std::fmt;
use std::panic;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::Once;
use std::sync::PoisonError;
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;
use tracing::error;
use tracing::warn;

pub use loader::load_backend;
pub use loader::select_backend;
pub use loader::BackendSelection;
pub use local::LocalModelBackend;
pub use ollama::OllamaBackend;

use crate::errors::LitCodeError;
use crate::errors::Result;

/// Which model variant a backend serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Fine-tuned on the reference corpus
    Specialized,
    /// Standard pretrained model
    Generic,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Specialized => write!(f, "specialized"),
            Self::Generic => write!(f, "generic"),
        }
    }
}

/// Sampling parameters for one generation call
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingConfig {
    pub temperature: f64,
    /// Nucleus sampling mass
    pub top_p: f64,
    /// Prompt budget; longer prompts are cut before inference
    pub max_input_tokens: usize,
    pub max_new_tokens: usize,
    /// Fixed seed for reproducible sampling
    pub seed: Option<u64>,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            top_p: 0.95,
            max_input_tokens: 512,
            max_new_tokens: 400,
            seed: None,
        }
    }
}

impl SamplingConfig {
    /// Same parameters with a fixed seed
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// A loaded model that turns a prompt into text
///
/// `generate` is blocking and may take seconds; callers go through
/// [`BackendHandle::generate`], which runs it on the blocking pool.
pub trait GenerationBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Artifact path or model tag the backend was loaded from
    fn model_id(&self) -> &str;

    /// Generate a continuation of `prompt` with special tokens removed
    fn generate(&self, prompt: &str, sampling: &SamplingConfig) -> Result<String>;
}

/// Shared handle to the process-wide backend
#[derive(Clone)]
pub struct BackendHandle {
    backend: Arc<dyn GenerationBackend>,
    // one inference at a time per loaded model
    gate: Arc<Mutex<()>>,
}

impl fmt::Debug for BackendHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendHandle")
            .field("kind", &self.kind())
            .field("model_id", &self.model_id())
            .finish()
    }
}

impl BackendHandle {
    pub fn new(backend: impl GenerationBackend + 'static) -> Self {
        Self::from_boxed(Box::new(backend))
    }

    pub fn from_boxed(backend: Box<dyn GenerationBackend>) -> Self {
        Self {
            backend: Arc::from(backend),
            gate: Arc::new(Mutex::new(())),
        }
    }

    #[must_use]
    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    #[must_use]
    pub fn model_id(&self) -> &str {
        self.backend.model_id()
    }

    /// Run inference on the current thread, waiting for any call in flight
    pub fn generate_blocking(&self, prompt: &str, sampling: &SamplingConfig) -> Result<String> {
        let _guard = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        self.backend.generate(prompt, sampling)
    }

    /// Run inference on the blocking pool, giving up after `timeout`
    ///
    /// A call already running when the caller gives up finishes in the
    /// background and its output is discarded. A call still queued behind
    /// another inference is skipped.
    pub async fn generate(
        &self,
        prompt: String,
        sampling: SamplingConfig,
        timeout: Duration,
    ) -> Result<String> {
        let handle = self.clone();
        let abandoned = Arc::new(AtomicBool::new(false));
        let task_abandoned = Arc::clone(&abandoned);
        let task = tokio::task::spawn_blocking(move || {
            handle.generate_unless_abandoned(&prompt, &sampling, &task_abandoned)
        });

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(LitCodeError::Generation(format!("inference task failed: {e}"))),
            Err(_) => {
                abandoned.store(true, Ordering::Release);
                Err(LitCodeError::GenerationTimeout(timeout.as_secs()))
            }
        }
    }

    fn generate_unless_abandoned(
        &self,
        prompt: &str,
        sampling: &SamplingConfig,
        abandoned: &AtomicBool,
    ) -> Result<String> {
        let _guard = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        if abandoned.load(Ordering::Acquire) {
            debug!("Skipping inference for a request that already timed out");
            return Err(LitCodeError::Generation("request abandoned".to_string()));
        }
        self.backend.generate(prompt, sampling)
    }
}

type Loader = dyn Fn() -> Option<BackendHandle> + Send + Sync;

/// `None` while the load is running; `Some(None)` when no model could be loaded
type LoadState = Option<Option<BackendHandle>>;

/// Backend constructed on first use and kept for the process lifetime
///
/// The loader runs at most once, on the blocking pool. Callers wait up to
/// `load_timeout` for it; a caller that times out leaves the load running
/// and the next caller waits on the same load. A completed load is final,
/// even when neither model variant was usable.
pub struct LazyBackend {
    loader: Arc<Loader>,
    load_timeout: Duration,
    started: Once,
    state: Arc<watch::Sender<LoadState>>,
}

impl LazyBackend {
    pub fn new(
        loader: impl Fn() -> Option<BackendHandle> + Send + Sync + 'static,
        load_timeout: Duration,
    ) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            loader: Arc::new(loader),
            load_timeout,
            started: Once::new(),
            state: Arc::new(state),
        }
    }

    /// Already-loaded backend
    #[must_use]
    pub fn ready(handle: BackendHandle) -> Self {
        let (state, _) = watch::channel(Some(Some(handle)));
        Self {
            loader: Arc::new(|| -> Option<BackendHandle> { None }),
            load_timeout: Duration::ZERO,
            started: Once::new(),
            state: Arc::new(state),
        }
    }

    /// Whether the load has completed
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// The shared backend, starting the load if nobody has yet
    ///
    /// `Ok(None)` means both model variants failed to load.
    pub async fn get(&self) -> Result<Option<BackendHandle>> {
        let current = self.state.borrow().clone();
        if let Some(loaded) = current {
            return Ok(loaded);
        }

        self.start_load();
        let mut receiver = self.state.subscribe();
        let result = match tokio::time::timeout(self.load_timeout, receiver.wait_for(Option::is_some)).await {
            Ok(Ok(state)) => Ok(state.clone().flatten()),
            Ok(Err(e)) => Err(LitCodeError::ModelLoad(format!("backend load abandoned: {e}"))),
            Err(_) => {
                warn!(
                    "Backend still loading after {}s, continuing in the background",
                    self.load_timeout.as_secs()
                );
                Err(LitCodeError::GenerationTimeout(self.load_timeout.as_secs()))
            }
        };
        result
    }

    fn start_load(&self) {
        self.started.call_once(|| {
            let loader = Arc::clone(&self.loader);
            let state = Arc::clone(&self.state);
            debug!("Loading generation backend");
            tokio::task::spawn_blocking(move || {
                let loaded = panic::catch_unwind(AssertUnwindSafe(|| (*loader)()))
                    .unwrap_or_else(|_| {
                        error!("Backend loader panicked");
                        None
                    });
                state.send_replace(Some(loaded));
            });
        });
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Backends with scripted behavior for pipeline tests

    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use super::*;

    pub struct ScriptedBackend {
        pub kind: BackendKind,
        pub output: std::result::Result<String, String>,
        pub delay: Duration,
        pub calls: Arc<AtomicUsize>,
    }

    impl ScriptedBackend {
        pub fn replying(output: &str) -> Self {
            Self {
                kind: BackendKind::Specialized,
                output: Ok(output.to_string()),
                delay: Duration::ZERO,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                output: Err(message.to_string()),
                ..Self::replying("")
            }
        }
    }

    impl GenerationBackend for ScriptedBackend {
        fn kind(&self) -> BackendKind {
            self.kind
        }

        fn model_id(&self) -> &str {
            "scripted"
        }

        fn generate(&self, _prompt: &str, _sampling: &SamplingConfig) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            self.output.clone().map_err(LitCodeError::Generation)
        }
    }
}
