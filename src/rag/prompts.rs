//! Prompt template for code answers
//!
//! The markers below are shared with the response validator: a generated
//! answer is only accepted when it keeps the fence and the anchor library and
//! has no placeholder left over from the template.

/// Opening fence the answer must contain
pub const CODE_FENCE: &str = "```python";

/// Library every answer is anchored on (matched case-insensitively)
pub const ANCHOR_LIBRARY: &str = "pandas";

/// Start of every unfilled slot in the template
pub const PLACEHOLDER_MARKER: &str = "[Insert";

/// Prefix of the explanation lines after the code block
pub const COMMENT_PREFIX: &str = "# ";

/// Title of the reference book the corpus was extracted from
pub const REFERENCE_TITLE: &str = "Python Data Science Handbook";

/// Build the generation prompt for `query` with the retrieved `context`
#[must_use]
pub fn compose_prompt(query: &str, context: &str) -> String {
    format!(
        "Using '{REFERENCE_TITLE}', generate a concise Python code solution with an explanation.\n\
         Question: {query}\n\
         Context: {context}\n\
         Return only this format, filling in with a relevant {ANCHOR_LIBRARY} example:\n\
         {CODE_FENCE}\n\
         import {ANCHOR_LIBRARY} as pd\n\
         {PLACEHOLDER_MARKER} a complete code example here using {ANCHOR_LIBRARY}]\n\
         ```\n\
         {COMMENT_PREFIX}Explanation:\n\
         {COMMENT_PREFIX}{PLACEHOLDER_MARKER} a concise explanation of how the code works]\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_query_and_context() {
        let context = "df.groupby('key').sum()\nSplit-apply-combine...";
        let prompt = compose_prompt("How does groupby work?", context);

        assert!(prompt.contains("Question: How does groupby work?\n"));
        assert!(prompt.contains(&format!("Context: {context}\n")));
    }

    #[test]
    fn test_prompt_layout() {
        let prompt = compose_prompt("q", "c");
        let lines: Vec<&str> = prompt.lines().collect();

        assert_eq!(
            lines[0],
            "Using 'Python Data Science Handbook', generate a concise Python code solution with an explanation."
        );
        assert_eq!(lines[4], "```python");
        assert_eq!(lines[5], "import pandas as pd");
        assert_eq!(lines[6], "[Insert a complete code example here using pandas]");
        assert_eq!(lines[7], "```");
        assert_eq!(lines[8], "# Explanation:");
        assert!(lines[9].starts_with("# [Insert"));
    }

    #[test]
    fn test_prompt_carries_validator_markers() {
        let prompt = compose_prompt("q", "c");
        assert!(prompt.contains(CODE_FENCE));
        assert!(prompt.contains(ANCHOR_LIBRARY));
        assert!(prompt.contains(PLACEHOLDER_MARKER));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        assert_eq!(compose_prompt("a", "b"), compose_prompt("a", "b"));
    }
}
