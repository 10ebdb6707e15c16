//! Structural validation of generated answers and canned fallbacks
//!
//! A generated answer is `Valid` when it has the python fence, mentions the
//! anchor library and has no unfilled placeholder. Anything else is replaced
//! wholesale by the fallback template matching the query's intent; the raw
//! output is never patched.

use std::fmt;

use crate::rag::prompts::ANCHOR_LIBRARY;
use crate::rag::prompts::CODE_FENCE;
use crate::rag::prompts::PLACEHOLDER_MARKER;

const FILTER_DATAFRAME_TEMPLATE: &str = "```python
import pandas as pd
data = {'Name': ['Alice', 'Bob', 'Charlie'], 'Age': [25, 30, 35]}
df = pd.DataFrame(data)
filtered = df[df['Age'] > 28]
print(filtered)
```
# Explanation:
# - Creates a DataFrame with sample data.
# - Filters rows where Age > 28 using boolean indexing.
";

const GROUPBY_TEMPLATE: &str = "```python
import pandas as pd
data = {'Department': ['Sales', 'Sales', 'HR', 'HR', 'IT', 'IT'],
        'Employee': ['Alice', 'Bob', 'Charlie', 'David', 'Eve', 'Frank'],
        'Salary': [50000, 55000, 60000, 58000, 75000, 72000]}
df = pd.DataFrame(data)
grouped = df.groupby('Department')['Salary'].mean()
print(grouped)
```
# Explanation:
# - groupby('Department') splits the DataFrame into groups based on unique Department values.
# - .mean() computes the average Salary for each group.
";

const GENERIC_TEMPLATE: &str = "```python
import pandas as pd
df = pd.DataFrame({'A': [1, 2, 3], 'B': [4, 5, 6]})
print(df)
```
# Explanation:
# - Creates a simple DataFrame with pandas.
# - Prints the DataFrame to display its contents.
";

/// Query intent used to pick a fallback template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    FilterDataframe,
    Groupby,
    Generic,
}

impl Intent {
    /// Classify a query by keyword presence, most specific first
    #[must_use]
    pub fn classify(query: &str) -> Self {
        let query = query.to_lowercase();
        if query.contains("filter") && query.contains("dataframe") {
            Self::FilterDataframe
        } else if query.contains("groupby") {
            Self::Groupby
        } else {
            Self::Generic
        }
    }

    /// Intent tag
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::FilterDataframe => "filter_dataframe",
            Self::Groupby => "groupby",
            Self::Generic => "generic",
        }
    }

    /// Canned code and explanation for this intent
    #[must_use]
    pub const fn fallback_template(self) -> &'static str {
        match self {
            Self::FilterDataframe => FILTER_DATAFRAME_TEMPLATE,
            Self::Groupby => GROUPBY_TEMPLATE,
            Self::Generic => GENERIC_TEMPLATE,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Result of the three structural checks on a raw answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationReport {
    pub has_code_fence: bool,
    pub has_anchor: bool,
    pub has_placeholder: bool,
}

impl ValidationReport {
    #[must_use]
    pub fn check(raw: &str) -> Self {
        Self {
            has_code_fence: raw.contains(CODE_FENCE),
            has_anchor: raw.to_lowercase().contains(ANCHOR_LIBRARY),
            has_placeholder: raw.contains(PLACEHOLDER_MARKER),
        }
    }

    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.has_code_fence && self.has_anchor && !self.has_placeholder
    }

    /// Names of the failed checks, for logging
    #[must_use]
    pub fn failures(&self) -> Vec<&'static str> {
        let mut failed = Vec::new();
        if !self.has_code_fence {
            failed.push("missing code fence");
        }
        if !self.has_anchor {
            failed.push("missing anchor library");
        }
        if self.has_placeholder {
            failed.push("unfilled placeholder");
        }
        failed
    }
}

/// Final answer after validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedResponse {
    /// Raw backend output, unchanged
    Valid(String),
    /// Canned template substituted for an invalid output
    Fallback {
        intent: Intent,
        report: ValidationReport,
    },
}

impl ValidatedResponse {
    /// Validate `raw` and fall back on the intent of `query` if needed
    #[must_use]
    pub fn from_generated(raw: String, query: &str) -> Self {
        let report = ValidationReport::check(&raw);
        if report.is_valid() {
            Self::Valid(raw)
        } else {
            Self::Fallback {
                intent: Intent::classify(query),
                report,
            }
        }
    }

    /// Fallback used when the backend produced nothing at all
    #[must_use]
    pub fn generation_failed(query: &str) -> Self {
        Self::from_generated(String::new(), query)
    }

    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Valid(raw) => raw,
            Self::Fallback { intent, .. } => intent.fallback_template(),
        }
    }

    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Valid(raw) => raw,
            Self::Fallback { intent, .. } => intent.fallback_template().to_string(),
        }
    }
}

/// Validate a generated answer, substituting a fallback on failure
#[must_use]
pub fn validate_response(raw: &str, query: &str) -> String {
    ValidatedResponse::from_generated(raw.to_string(), query).into_text()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_ANSWER: &str = "```python\nimport pandas as pd\ns = pd.Series([1, 2])\n```\n# Explanation:\n# - Builds a Series.\n";

    #[test]
    fn test_valid_answer_passes_unchanged() {
        assert_eq!(validate_response(VALID_ANSWER, "anything"), VALID_ANSWER);
    }

    #[test]
    fn test_anchor_is_case_insensitive() {
        let answer = VALID_ANSWER.replace("import pandas as pd", "import Pandas as pd")
            .replace("pd.Series", "PANDAS_SERIES");
        let response = ValidatedResponse::from_generated(answer.clone(), "q");
        assert_eq!(response, ValidatedResponse::Valid(answer));
    }

    #[test]
    fn test_missing_fence_falls_back() {
        let answer = "import pandas as pd\nprint('hi')";
        assert_eq!(validate_response(answer, "plot a chart"), GENERIC_TEMPLATE);
    }

    #[test]
    fn test_missing_anchor_falls_back() {
        let answer = "```python\nimport numpy as np\n```";
        let response = ValidatedResponse::from_generated(answer.to_string(), "Explain groupby aggregation");

        match &response {
            ValidatedResponse::Fallback { intent, report } => {
                assert_eq!(*intent, Intent::Groupby);
                assert_eq!(report.failures(), vec!["missing anchor library"]);
            }
            ValidatedResponse::Valid(_) => panic!("expected fallback"),
        }
        assert_eq!(response.text(), GROUPBY_TEMPLATE);
    }

    #[test]
    fn test_placeholder_falls_back() {
        let answer = "```python\nimport pandas as pd\n[Insert a complete code example here using pandas]\n```";
        let response = ValidatedResponse::from_generated(answer.to_string(), "filter my dataframe");
        assert!(response.is_fallback());
        assert_eq!(response.into_text(), FILTER_DATAFRAME_TEMPLATE);
    }

    #[test]
    fn test_empty_output_fails_every_check() {
        let report = ValidationReport::check("");
        assert_eq!(report.failures(), vec!["missing code fence", "missing anchor library"]);
        assert!(!report.is_valid());
        assert!(ValidatedResponse::generation_failed("q").is_fallback());
    }

    #[test]
    fn test_intent_priority() {
        assert_eq!(Intent::classify("How do I filter a DataFrame?"), Intent::FilterDataframe);
        // filter+dataframe outranks groupby
        assert_eq!(
            Intent::classify("filter a dataframe after groupby"),
            Intent::FilterDataframe
        );
        assert_eq!(Intent::classify("filter a list"), Intent::Generic);
        assert_eq!(Intent::classify("Explain GroupBy aggregation"), Intent::Groupby);
        assert_eq!(Intent::classify("plot a histogram"), Intent::Generic);
    }

    #[test]
    fn test_intent_tags() {
        assert_eq!(Intent::FilterDataframe.to_string(), "filter_dataframe");
        assert_eq!(Intent::Groupby.tag(), "groupby");
        assert_eq!(Intent::Generic.tag(), "generic");
    }

    #[test]
    fn test_every_template_is_itself_valid() {
        for intent in [Intent::FilterDataframe, Intent::Groupby, Intent::Generic] {
            assert!(ValidationReport::check(intent.fallback_template()).is_valid());
        }
    }
}
