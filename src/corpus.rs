//! Reference corpus access
//!
//! The corpus is the preprocessed book text produced upstream: plain UTF-8,
//! one line per text line, with code regions fenced as ```python blocks.
//! It is read fresh for every retrieval and never cached here.

use std::path::Path;

use tracing::debug;
use tracing::error;
use tracing::info;

use crate::errors::LitCodeError;
use crate::errors::Result;

/// Read the corpus text from disk
///
/// A missing, unreadable or empty file is reported as `MissingCorpus`.
pub fn load_corpus_text(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    if !path.exists() {
        error!("Corpus file not found: {}", path.display());
        return Err(LitCodeError::MissingCorpus(format!(
            "file not found: {}",
            path.display()
        )));
    }

    let text = std::fs::read_to_string(path).map_err(|e| {
        error!("Error loading corpus {}: {}", path.display(), e);
        LitCodeError::MissingCorpus(format!("{}: {e}", path.display()))
    })?;

    if text.is_empty() {
        error!("Corpus file is empty: {}", path.display());
        return Err(LitCodeError::MissingCorpus(format!(
            "empty file: {}",
            path.display()
        )));
    }

    info!(
        "Loaded corpus from {} (length: {} characters)",
        path.display(),
        text.chars().count()
    );
    debug!("Corpus has {} lines", text.split('\n').count());
    Ok(text)
}
