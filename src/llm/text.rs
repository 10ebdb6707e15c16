//! Prompt budgeting and output cleanup shared by the engines

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

/// Rough characters-per-token ratio for engines without a local tokenizer
pub const APPROX_CHARS_PER_TOKEN: usize = 4;

static CONTROL_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<\|[A-Za-z0-9_\-]*\|>|</?s>|\[/?INST\]").expect("control token pattern is valid")
});

/// Cut `text` to at most `max_len` characters, backing off to the last space
#[must_use]
pub fn truncate_on_word_boundary(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }

    let head: String = text.chars().take(max_len).collect();
    let truncated = match head.rfind(' ') {
        Some(idx) => head[..idx].to_string(),
        None => head,
    };
    warn!(
        "Truncated text from {} to {} characters",
        text.chars().count(),
        truncated.chars().count()
    );
    truncated
}

/// Character budget matching a token budget
#[must_use]
pub const fn char_budget(max_tokens: usize) -> usize {
    max_tokens.saturating_mul(APPROX_CHARS_PER_TOKEN)
}

/// Remove special/control tokens left in decoded model output
#[must_use]
pub fn strip_control_tokens(text: &str) -> String {
    CONTROL_TOKEN.replace_all(text, "").into_owned()
}
