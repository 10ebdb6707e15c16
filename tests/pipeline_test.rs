//! End-to-end tests for the code-answer pipeline
//!
//! Generation runs against stub backends; no model weights or server needed.

use std::io::Write;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use litcode::config::AppConfig;
use litcode::llm::BackendHandle;
use litcode::llm::BackendKind;
use litcode::llm::GenerationBackend;
use litcode::llm::LazyBackend;
use litcode::llm::SamplingConfig;
use litcode::rag::Intent;
use litcode::rag::Retrieval;
use litcode::CodeAssistant;
use litcode::LitCodeError;
use litcode::Result;
use tempfile::NamedTempFile;

const BOOK_EXCERPT: &str = "\
Chapter 3. Data Manipulation with Pandas
Pandas is a package built on top of NumPy.
It provides an efficient implementation of a DataFrame.
Boolean masks filter a pandas DataFrame by condition.
data[data['population'] > 1000000]
The groupby operation splits data into groups.
Aggregation then combines each group with sum or mean.
df.groupby('key').sum()
Matplotlib handles plotting.
Plots are drawn on figures and axes.
";

/// Stub backend returning fixed text and recording the prompts it saw
struct StubBackend {
    kind: BackendKind,
    reply: std::result::Result<String, String>,
    delay: Duration,
    prompts: Arc<std::sync::Mutex<Vec<String>>>,
}

impl StubBackend {
    fn replying(reply: &str) -> Self {
        Self {
            kind: BackendKind::Specialized,
            reply: Ok(reply.to_string()),
            delay: Duration::ZERO,
            prompts: Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }
}

impl GenerationBackend for StubBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn model_id(&self) -> &str {
        "stub"
    }

    fn generate(&self, prompt: &str, _sampling: &SamplingConfig) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        std::thread::sleep(self.delay);
        self.reply.clone().map_err(LitCodeError::Generation)
    }
}

fn write_corpus(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

fn config_for(corpus: &NamedTempFile) -> AppConfig {
    let mut config = AppConfig::default();
    config.paths.corpus = corpus.path().to_path_buf();
    config
}

fn assistant_with(corpus: &NamedTempFile, backend: StubBackend) -> CodeAssistant {
    CodeAssistant::with_backend(config_for(corpus), BackendHandle::new(backend))
}

#[tokio::test]
async fn test_empty_output_uses_filter_dataframe_template() {
    let corpus = write_corpus(BOOK_EXCERPT);
    let assistant = assistant_with(&corpus, StubBackend::replying(""));

    let answer = assistant
        .generate_code_solution("How do I filter a DataFrame?")
        .await;
    assert_eq!(answer, Intent::FilterDataframe.fallback_template());
}

#[tokio::test]
async fn test_output_without_anchor_uses_groupby_template() {
    let corpus = write_corpus(BOOK_EXCERPT);
    let reply = "```python\nimport numpy as np\nnp.sum([1, 2])\n```\n# Explanation:\n# - Sums.";
    let assistant = assistant_with(&corpus, StubBackend::replying(reply));

    let answer = assistant
        .generate_code_solution("Explain groupby aggregation")
        .await;
    assert_eq!(answer, Intent::Groupby.fallback_template());
}

#[tokio::test]
async fn test_placeholder_output_uses_generic_template() {
    let corpus = write_corpus(BOOK_EXCERPT);
    let reply = "```python\nimport pandas as pd\n[Insert code here]\n```";
    let assistant = assistant_with(&corpus, StubBackend::replying(reply));

    let answer = assistant.generate_code_solution("How do I plot data?").await;
    assert_eq!(answer, Intent::Generic.fallback_template());
}

#[tokio::test]
async fn test_valid_output_returned_unchanged() {
    let corpus = write_corpus(BOOK_EXCERPT);
    let reply = "```python\nimport pandas as pd\ndf = pd.DataFrame({'a': [1, 2]})\nprint(df[df['a'] > 1])\n```\n# Explanation:\n# - Keeps rows where a > 1.";
    let assistant = assistant_with(&corpus, StubBackend::replying(reply));

    let answer = assistant.generate_code_solution("How do I filter a DataFrame?").await;
    assert_eq!(answer, reply);
}

#[tokio::test]
async fn test_prompt_embeds_query_and_retrieved_context() {
    let corpus = write_corpus(BOOK_EXCERPT);
    let backend = StubBackend::replying("");
    let prompts = Arc::clone(&backend.prompts);
    let assistant = assistant_with(&corpus, backend);

    let answer = assistant.answer("Explain groupby aggregation").await;

    let prompts = prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Explain groupby aggregation"));
    assert!(prompts[0].contains(&answer.context));
    match &answer.retrieval {
        // lines 5, 6 and 7 each match one word; the first one wins
        Retrieval::Section(window) => {
            assert_eq!(window.center_index, 5);
            assert_eq!(window.score, 1);
        }
        other => panic!("expected a section, got {other:?}"),
    }
    // default budget of 200 characters plus the marker
    assert_eq!(answer.context.chars().count(), 203);
    assert!(answer.context.ends_with("..."));
}

#[tokio::test]
async fn test_backend_error_still_returns_code() {
    let corpus = write_corpus(BOOK_EXCERPT);
    let backend = StubBackend {
        reply: Err("CUDA out of memory".to_string()),
        ..StubBackend::replying("")
    };
    let assistant = assistant_with(&corpus, backend);

    let answer = assistant.answer("How do I filter a DataFrame?").await;
    assert!(answer.used_fallback());
    assert!(answer.text().contains("```python"));
    assert_eq!(answer.backend, None);
}

#[tokio::test]
async fn test_generation_timeout_falls_back() {
    let corpus = write_corpus(BOOK_EXCERPT);
    let mut config = config_for(&corpus);
    config.generation.timeout_secs = 1;
    let backend = StubBackend {
        delay: Duration::from_secs(2),
        ..StubBackend::replying("```python\nimport pandas\n```")
    };
    let assistant = CodeAssistant::with_backend(config, BackendHandle::new(backend));

    let answer = assistant.generate_code_solution("Explain groupby").await;
    assert_eq!(answer, Intent::Groupby.fallback_template());
}

#[tokio::test]
async fn test_no_backend_available_falls_back() {
    let corpus = write_corpus(BOOK_EXCERPT);
    let lazy = Arc::new(LazyBackend::new(|| None, Duration::from_secs(5)));
    let assistant = CodeAssistant::with_lazy_backend(config_for(&corpus), lazy);

    let answer = assistant.answer("Plot a histogram").await;
    assert_eq!(answer.text(), Intent::Generic.fallback_template());
    assert!(assistant.backend().is_loaded());
}

#[tokio::test]
async fn test_backend_loaded_once_for_many_requests() {
    let corpus = write_corpus(BOOK_EXCERPT);
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&loads);
    let lazy = Arc::new(LazyBackend::new(
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Some(BackendHandle::new(StubBackend::replying("")))
        },
        Duration::from_secs(5),
    ));
    let assistant = Arc::new(CodeAssistant::with_lazy_backend(config_for(&corpus), lazy));

    let mut tasks = Vec::new();
    for i in 0..4 {
        let assistant = Arc::clone(&assistant);
        tasks.push(tokio::spawn(async move {
            assistant
                .generate_code_solution(&format!("question {i} about pandas"))
                .await
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap(), Intent::Generic.fallback_template());
    }
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_missing_corpus_uses_no_content_sentinel() {
    let mut config = AppConfig::default();
    config.paths.corpus = "/definitely/not/here/book_text.txt".into();
    let backend = StubBackend::replying("");
    let prompts = Arc::clone(&backend.prompts);
    let assistant = CodeAssistant::with_backend(config, BackendHandle::new(backend));

    assert_eq!(
        assistant.retrieve_section("pandas", 200),
        "No content available."
    );
    let answer = assistant.generate_code_solution("pandas").await;
    assert_eq!(answer, Intent::Generic.fallback_template());
    assert!(prompts.lock().unwrap()[0].contains("No content available."));
}

#[test]
fn test_retrieve_section_no_match() {
    let corpus = write_corpus("x\ny\nz");
    let assistant = assistant_with(&corpus, StubBackend::replying(""));

    assert_eq!(
        assistant.retrieve_section("nonexistent term", 200),
        "Couldn't find a relevant section."
    );
}

#[test]
fn test_retrieve_section_whole_window_without_truncation() {
    let corpus = write_corpus(
        "alpha pandas line\nbeta numpy line\ngamma pandas filter dataframe line",
    );
    let assistant = assistant_with(&corpus, StubBackend::replying(""));

    let first = assistant.retrieve_section("pandas filter dataframe", 200);
    assert_eq!(
        first,
        "alpha pandas line\nbeta numpy line\ngamma pandas filter dataframe line"
    );
    assert_eq!(assistant.retrieve_section("pandas filter dataframe", 200), first);
}
