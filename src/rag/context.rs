//! Context window assembly around the best-matching corpus line

/// Lines of padding kept on each side of the matched line
pub const WINDOW_PADDING: usize = 5;

/// Marker appended when the window text is cut to the context budget
pub const TRUNCATION_MARKER: &str = "...";

/// Bounded slice of corpus lines surrounding the best-scoring match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextWindow {
    pub center_index: usize,
    /// Inclusive
    pub start_index: usize,
    /// Exclusive
    pub end_index: usize,
    pub text: String,
    pub score: usize,
}

impl ContextWindow {
    /// Build the window centered on `center_index`, clipped to the corpus bounds
    #[must_use]
    pub fn around(lines: &[&str], center_index: usize, score: usize) -> Self {
        let start_index = center_index.saturating_sub(WINDOW_PADDING);
        let end_index = lines.len().min(center_index + WINDOW_PADDING + 1);
        let text = lines[start_index..end_index].join("\n");

        Self {
            center_index,
            start_index,
            end_index,
            text,
            score,
        }
    }

    /// Number of corpus lines in the window
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.end_index - self.start_index
    }

    /// Window text limited to `max_chars` characters
    ///
    /// Longer text is cut to exactly `max_chars` characters followed by `...`.
    #[must_use]
    pub fn render(&self, max_chars: usize) -> String {
        truncate_context(&self.text, max_chars)
    }
}

/// Cut `text` to `max_chars` characters and mark the cut
#[must_use]
pub fn truncate_context(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}{TRUNCATION_MARKER}")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("line {i}")).collect()
    }

    #[test]
    fn test_window_in_middle() {
        let lines = corpus(20);
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let window = ContextWindow::around(&refs, 10, 2);

        assert_eq!(window.start_index, 5);
        assert_eq!(window.end_index, 16);
        assert_eq!(window.line_count(), 11);
        assert!(window.text.starts_with("line 5\n"));
        assert!(window.text.ends_with("\nline 15"));
    }

    #[test]
    fn test_window_clipped_at_start() {
        let lines = corpus(20);
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let window = ContextWindow::around(&refs, 2, 1);

        assert_eq!(window.start_index, 0);
        assert_eq!(window.end_index, 8);
    }

    #[test]
    fn test_window_clipped_at_end() {
        let lines = corpus(8);
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let window = ContextWindow::around(&refs, 7, 1);

        assert_eq!(window.start_index, 2);
        assert_eq!(window.end_index, 8);
        assert!(window.text.ends_with("line 7"));
    }

    #[test]
    fn test_truncate_context_exact_length() {
        let text = "a".repeat(50);
        let truncated = truncate_context(&text, 20);
        assert_eq!(truncated.chars().count(), 23);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_truncate_context_at_limit_is_untouched() {
        let text = "a".repeat(20);
        assert_eq!(truncate_context(&text, 20), text);
    }

    #[test]
    fn test_truncate_context_counts_characters() {
        // multi-byte characters must not be split
        let text = "données ".repeat(10);
        let truncated = truncate_context(&text, 9);
        assert_eq!(truncated, "données d...");
    }
}
