//! Lexical retrieval over the reference corpus
//!
//! Every corpus line is scored by how many query words occur inside it as
//! substrings. The first line holding the maximum score becomes the center of
//! the context window handed to the prompt composer.

use std::path::Path;

use tracing::debug;
use tracing::info;

use crate::corpus::load_corpus_text;
use crate::rag::context::ContextWindow;

/// Returned when no corpus line shares a word with the query
pub const NO_MATCH_SENTINEL: &str = "Couldn't find a relevant section.";

/// Returned when the corpus is missing or empty
pub const NO_CONTENT_SENTINEL: &str = "No content available.";

/// Outcome of a retrieval over one corpus snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retrieval {
    /// Best-scoring window
    Section(ContextWindow),
    /// No line scored above zero
    NoMatch,
    /// Corpus absent or empty
    NoContent,
}

impl Retrieval {
    /// Text handed to the prompt composer
    #[must_use]
    pub fn render(&self, max_context_chars: usize) -> String {
        match self {
            Self::Section(window) => window.render(max_context_chars),
            Self::NoMatch => NO_MATCH_SENTINEL.to_string(),
            Self::NoContent => NO_CONTENT_SENTINEL.to_string(),
        }
    }

    #[must_use]
    pub fn window(&self) -> Option<&ContextWindow> {
        match self {
            Self::Section(window) => Some(window),
            _ => None,
        }
    }
}

/// Lowercased whitespace-separated query words, duplicates kept
#[must_use]
pub fn query_words(query: &str) -> Vec<String> {
    query.to_lowercase().split_whitespace().map(str::to_string).collect()
}

/// Number of query words contained in `line`
///
/// A word is counted once per occurrence in the query, regardless of how
/// often it appears in the line.
#[must_use]
pub fn score_line(words: &[String], line: &str) -> usize {
    let line_lower = line.to_lowercase();
    words
        .iter()
        .filter(|word| line_lower.contains(word.as_str()))
        .count()
}

/// Score every line and pick the best window
#[must_use]
pub fn find_best_window(query: &str, corpus_text: &str) -> Retrieval {
    if corpus_text.is_empty() {
        return Retrieval::NoContent;
    }

    let words = query_words(query);
    let lines: Vec<&str> = corpus_text.split('\n').collect();

    let mut best: Option<(usize, usize)> = None;
    let mut best_score = 0;
    for (idx, line) in lines.iter().enumerate() {
        let score = score_line(&words, line);
        // strictly greater: the earliest line wins a tie
        if score > best_score {
            best_score = score;
            best = Some((idx, score));
        }
    }

    match best {
        Some((idx, score)) => {
            debug!("Best line {} with score {}", idx, score);
            Retrieval::Section(ContextWindow::around(&lines, idx, score))
        }
        None => Retrieval::NoMatch,
    }
}

/// Retrieve the context for `query` from already-loaded corpus text
#[must_use]
pub fn retrieve_section(query: &str, corpus_text: &str, max_context_chars: usize) -> String {
    let retrieval = find_best_window(query, corpus_text);
    match &retrieval {
        Retrieval::Section(window) => info!(
            "Retrieved section for query '{}' with score {}",
            query, window.score
        ),
        Retrieval::NoMatch => info!("No relevant section for query '{}'", query),
        Retrieval::NoContent => tracing::error!("No corpus text loaded for retrieval"),
    }
    retrieval.render(max_context_chars)
}

/// Keyword retriever bound to a corpus file
///
/// The file is re-read on every call so upstream rewrites are picked up.
#[derive(Debug, Clone)]
pub struct Retriever {
    corpus_path: std::path::PathBuf,
}

impl Retriever {
    /// Create a new retriever
    pub fn new(corpus_path: impl AsRef<Path>) -> Self {
        Self {
            corpus_path: corpus_path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn corpus_path(&self) -> &Path {
        &self.corpus_path
    }

    /// Load the corpus and find the best window
    ///
    /// Load failures are already logged by the corpus loader and surface as
    /// `Retrieval::NoContent`.
    #[must_use]
    pub fn retrieve(&self, query: &str) -> Retrieval {
        match load_corpus_text(&self.corpus_path) {
            Ok(text) => find_best_window(query, &text),
            Err(_) => Retrieval::NoContent,
        }
    }

    /// Load the corpus and render the context for `query`
    #[must_use]
    pub fn retrieve_section(&self, query: &str, max_context_chars: usize) -> String {
        match load_corpus_text(&self.corpus_path) {
            Ok(text) => retrieve_section(query, &text, max_context_chars),
            Err(_) => NO_CONTENT_SENTINEL.to_string(),
        }
    }
}
