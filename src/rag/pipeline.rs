//! Complete pipeline: Retrieve -> Compose -> Generate -> Validate

use std::sync::Arc;

use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;
use tracing::Instrument;

use crate::config::AppConfig;
use crate::errors::LitCodeError;
use crate::errors::Result;
use crate::llm::load_backend;
use crate::llm::BackendHandle;
use crate::llm::BackendKind;
use crate::llm::LazyBackend;
use crate::rag::compose_prompt;
use crate::rag::Retrieval;
use crate::rag::Retriever;
use crate::rag::ValidatedResponse;

/// Code-answer service shared by every request of a process
pub struct CodeAssistant {
    config: AppConfig,
    retriever: Retriever,
    backend: Arc<LazyBackend>,
}

impl CodeAssistant {
    /// Create a service whose backend is loaded on the first generation
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        let loader_config = config.clone();
        let load_timeout = config.load_timeout();
        let backend = LazyBackend::new(
            move || load_backend(&loader_config).into_handle(),
            load_timeout,
        );
        Self::with_lazy_backend(config, Arc::new(backend))
    }

    /// Create a service around an already-loaded backend
    #[must_use]
    pub fn with_backend(config: AppConfig, handle: BackendHandle) -> Self {
        Self::with_lazy_backend(config, Arc::new(LazyBackend::ready(handle)))
    }

    /// Create from an existing (possibly shared) lazy backend
    #[must_use]
    pub fn with_lazy_backend(config: AppConfig, backend: Arc<LazyBackend>) -> Self {
        let retriever = Retriever::new(config.corpus_path());
        Self {
            config,
            retriever,
            backend,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub const fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    #[must_use]
    pub fn backend(&self) -> &Arc<LazyBackend> {
        &self.backend
    }

    /// Retrieve the corpus context for `query`
    ///
    /// Always returns text: the section, or a sentinel when the corpus is
    /// missing or nothing matches.
    #[must_use]
    pub fn retrieve_section(&self, query: &str, max_context_chars: usize) -> String {
        self.retriever.retrieve_section(query, max_context_chars)
    }

    /// Answer `query` with a code example and explanation
    ///
    /// Never fails: backend errors, timeouts and invalid output all end in
    /// a fallback template.
    pub async fn generate_code_solution(&self, query: &str) -> String {
        self.answer(query).await.into_text()
    }

    /// Answer `query`, keeping the intermediate results
    pub async fn answer(&self, query: &str) -> CodeAnswer {
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("code_answer", %request_id);
        self.answer_inner(query).instrument(span).await
    }

    async fn answer_inner(&self, query: &str) -> CodeAnswer {
        info!("Processing query: {}", query);

        // Step 1: Retrieve context
        debug!("Step 1: Retrieving context");
        let retrieval = self.retriever.retrieve(query);
        match &retrieval {
            Retrieval::Section(window) => info!(
                "Retrieved section for query '{}' with score {}",
                query, window.score
            ),
            Retrieval::NoMatch => info!("No relevant section for query '{}'", query),
            Retrieval::NoContent => error!("No corpus text loaded for retrieval"),
        }
        let context = retrieval.render(self.config.max_context_chars());

        // Step 2: Compose prompt
        debug!("Step 2: Composing prompt");
        let prompt = compose_prompt(query, &context);

        // Step 3: Generate
        debug!("Step 3: Generating answer");
        let (raw, backend) = match self.run_generation(prompt).await {
            Ok((raw, kind)) => {
                if raw.trim().is_empty() {
                    warn!("{} backend returned empty output", kind);
                }
                (raw, Some(kind))
            }
            Err(e) => {
                error!("Generation failed: {}", e);
                (String::new(), None)
            }
        };

        // Step 4: Validate
        debug!("Step 4: Validating answer");
        let response = ValidatedResponse::from_generated(raw, query);
        if let ValidatedResponse::Fallback { intent, report } = &response {
            warn!(
                "Generated answer rejected ({}), using {} template",
                report.failures().join(", "),
                intent
            );
        }

        info!("Generated code for query: {}", query);
        CodeAnswer {
            query: query.to_string(),
            retrieval,
            context,
            backend,
            response,
        }
    }

    async fn run_generation(&self, prompt: String) -> Result<(String, BackendKind)> {
        let handle = self.backend.get().await?.ok_or_else(|| {
            LitCodeError::Generation("no generation backend available".to_string())
        })?;

        let raw = handle
            .generate(
                prompt,
                self.config.sampling(),
                self.config.generation_timeout(),
            )
            .await?;
        Ok((raw, handle.kind()))
    }
}

/// Final answer with the intermediate results that produced it
#[derive(Debug, Clone)]
pub struct CodeAnswer {
    pub query: String,
    pub retrieval: Retrieval,
    /// Context text embedded in the prompt
    pub context: String,
    /// Backend that produced the raw output, if generation succeeded
    pub backend: Option<BackendKind>,
    pub response: ValidatedResponse,
}

impl CodeAnswer {
    #[must_use]
    pub fn text(&self) -> &str {
        self.response.text()
    }

    #[must_use]
    pub fn into_text(self) -> String {
        self.response.into_text()
    }

    #[must_use]
    pub const fn used_fallback(&self) -> bool {
        self.response.is_fallback()
    }

    /// Get a formatted string representation
    #[must_use]
    pub fn format(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("Query: {}\n\n", self.query));
        output.push_str(&format!("Answer:\n{}\n", self.text()));

        let backend = self
            .backend
            .map_or_else(|| "none".to_string(), |kind| kind.to_string());
        let source = match &self.response {
            ValidatedResponse::Valid(_) => "generated".to_string(),
            ValidatedResponse::Fallback { intent, .. } => format!("fallback ({intent})"),
        };
        output.push_str(&format!("Backend: {backend} | Source: {source}\n"));

        if let Some(window) = self.retrieval.window() {
            output.push_str(&format!(
                "Context: lines {}-{} (score {})\n",
                window.start_index,
                window.end_index - 1,
                window.score
            ));
        }

        output
    }
}
