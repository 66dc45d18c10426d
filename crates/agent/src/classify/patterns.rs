//! Keyword patterns driving the rule-based complexity score.
//!
//! Patterns are plain lower-case substrings. A query "matches" a pattern when
//! the pattern occurs anywhere in the lower-cased query; each pattern counts
//! at most once no matter how often it occurs.

use serde::{Deserialize, Serialize};

/// A named group of complexity patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternCategory {
    pub name: String,
    pub patterns: Vec<String>,
}

impl PatternCategory {
    pub fn new(name: impl Into<String>, patterns: &[&str]) -> Self {
        Self {
            name: name.into(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Number of this category's patterns found in `query_lower`.
    pub fn matches(&self, query_lower: &str) -> usize {
        self.patterns
            .iter()
            .filter(|p| query_lower.contains(p.as_str()))
            .count()
    }
}

/// Complexity categories plus the "basic information" patterns that mark a
/// question as broad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSet {
    pub categories: Vec<PatternCategory>,
    pub basic_info: Vec<String>,
}

impl PatternSet {
    /// The built-in vaccine pattern set.
    pub fn vaccine_default() -> Self {
        Self {
            categories: vec![
                PatternCategory::new(
                    "comparison",
                    &[
                        "compare",
                        "comparison",
                        "versus",
                        " vs ",
                        "difference between",
                        "better than",
                        "which is better",
                        "pros and cons",
                    ],
                ),
                PatternCategory::new(
                    "medical_condition",
                    &[
                        "pregnan",
                        "breastfeeding",
                        "immunocompromised",
                        "autoimmune",
                        "allerg",
                        "chronic",
                        "diabetes",
                        "cancer",
                        "chemotherapy",
                        "medical condition",
                    ],
                ),
                PatternCategory::new(
                    "timing",
                    &[
                        "how long",
                        "interval",
                        "between doses",
                        "how soon",
                        "wait",
                        "timing",
                        "schedule",
                    ],
                ),
                PatternCategory::new(
                    "mechanism",
                    &[
                        "how does",
                        "how do",
                        "mechanism",
                        "immune response",
                        "antibod",
                        "mrna",
                    ],
                ),
                PatternCategory::new(
                    "evidence",
                    &[
                        "study",
                        "studies",
                        "research",
                        "evidence",
                        "clinical trial",
                        "statistic",
                    ],
                ),
            ],
            basic_info: [
                "what is",
                "what are",
                "is the vaccine",
                "safe for",
                "is it safe",
                "side effects",
                "where can i",
                "who can get",
                "how much does",
            ]
            .iter()
            .map(|p| p.to_string())
            .collect(),
        }
    }

    /// Total complex-pattern matches across all categories.
    pub fn complex_matches(&self, query_lower: &str) -> usize {
        self.categories.iter().map(|c| c.matches(query_lower)).sum()
    }

    /// Per-category match counts, skipping categories with no match.
    pub fn category_hits<'a>(&'a self, query_lower: &str) -> Vec<(&'a str, usize)> {
        self.categories
            .iter()
            .map(|c| (c.name.as_str(), c.matches(query_lower)))
            .filter(|(_, n)| *n > 0)
            .collect()
    }

    /// Whether any basic-info pattern occurs.
    pub fn is_broad(&self, query_lower: &str) -> bool {
        self.basic_info
            .iter()
            .any(|p| query_lower.contains(p.as_str()))
    }
}

impl Default for PatternSet {
    fn default() -> Self {
        Self::vaccine_default()
    }
}
