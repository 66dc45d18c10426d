//! Classification value objects: complexity verdicts and tag sets.

use serde::{Deserialize, Serialize};

use crate::taxonomy::TagTaxonomy;

/// Coarse query type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryType {
    /// A general, information-level question.
    Broad,
    /// A question needing multi-factor or comparative reasoning.
    Complex,
}

impl QueryType {
    /// Parse `"BROAD"` / `"COMPLEX"` case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BROAD" => Some(Self::Broad),
            "COMPLEX" => Some(Self::Complex),
            _ => None,
        }
    }
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Broad => write!(f, "BROAD"),
            Self::Complex => write!(f, "COMPLEX"),
        }
    }
}

/// The `{type, complexity}` verdict produced by the complexity classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationVerdict {
    #[serde(rename = "type")]
    pub query_type: QueryType,
    /// Bounded score in `1..=5`.
    pub complexity: u8,
}

impl ClassificationVerdict {
    pub const MIN_COMPLEXITY: u8 = 1;
    pub const MAX_COMPLEXITY: u8 = 5;

    pub fn new(query_type: QueryType, complexity: u8) -> Self {
        Self {
            query_type,
            complexity,
        }
    }

    pub fn broad(complexity: u8) -> Self {
        Self::new(QueryType::Broad, complexity)
    }

    pub fn complex(complexity: u8) -> Self {
        Self::new(QueryType::Complex, complexity)
    }

    /// Validate an untrusted JSON value against the verdict shape.
    ///
    /// Requires a `type` of BROAD/COMPLEX and an integer `complexity` in `1..=5`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        let query_type = QueryType::parse(value.get("type")?.as_str()?)?;
        let complexity = value.get("complexity")?.as_u64()?;
        if !(Self::MIN_COMPLEXITY as u64..=Self::MAX_COMPLEXITY as u64).contains(&complexity) {
            return None;
        }
        Some(Self::new(query_type, complexity as u8))
    }
}

/// An ordered set of at most five taxonomy labels, or the singleton `["other"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(Vec<String>);

impl TagSet {
    pub const OTHER: &'static str = "other";
    pub const MAX_TAGS: usize = 5;

    /// The fallback set `["other"]`.
    pub fn other() -> Self {
        Self(vec![Self::OTHER.to_string()])
    }

    /// Build a tag set from untrusted labels.
    ///
    /// Keeps taxonomy members only, in order, without duplicates, capped at
    /// [`Self::MAX_TAGS`]. Falls back to `["other"]` when nothing survives.
    pub fn from_labels<I, S>(labels: I, taxonomy: &TagTaxonomy) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tags: Vec<String> = Vec::new();
        for label in labels {
            let label = label.as_ref().trim();
            if tags.len() == Self::MAX_TAGS {
                break;
            }
            if taxonomy.contains(label) && !tags.iter().any(|t| t == label) {
                tags.push(label.to_string());
            }
        }
        if tags.is_empty() {
            Self::other()
        } else {
            Self(tags)
        }
    }

    pub fn is_other(&self) -> bool {
        self.0.len() == 1 && self.0[0] == Self::OTHER
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false: a tag set holds at least `"other"`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn verdict_serializes_with_type_key() {
        let json = serde_json::to_value(ClassificationVerdict::broad(1)).unwrap();
        assert_eq!(json, json!({"type": "BROAD", "complexity": 1}));
    }

    #[test]
    fn verdict_from_json_accepts_valid_shape() {
        let v = ClassificationVerdict::from_json(&json!({"type": "complex", "complexity": 4}));
        assert_eq!(v, Some(ClassificationVerdict::complex(4)));
    }

    #[test]
    fn verdict_from_json_rejects_bad_shapes() {
        assert!(ClassificationVerdict::from_json(&json!({"type": "BROAD"})).is_none());
        assert!(ClassificationVerdict::from_json(&json!({"type": "MEDIUM", "complexity": 2})).is_none());
        assert!(ClassificationVerdict::from_json(&json!({"type": "BROAD", "complexity": 0})).is_none());
        assert!(ClassificationVerdict::from_json(&json!({"type": "BROAD", "complexity": 9})).is_none());
        assert!(ClassificationVerdict::from_json(&json!({"type": "BROAD", "complexity": "2"})).is_none());
        assert!(ClassificationVerdict::from_json(&json!(["BROAD", 1])).is_none());
    }

    #[test]
    fn tag_set_filters_to_taxonomy() {
        let taxonomy = TagTaxonomy::vaccine();
        let tags = TagSet::from_labels(["safety", "made up", "booster shots", "safety"], &taxonomy);
        assert_eq!(tags.as_slice(), &["safety".to_string(), "booster shots".to_string()]);
    }

    #[test]
    fn tag_set_caps_at_five() {
        let taxonomy = TagTaxonomy::vaccine();
        let labels = taxonomy.labels().iter().take(8).copied().collect::<Vec<_>>();
        let tags = TagSet::from_labels(labels, &taxonomy);
        assert_eq!(tags.len(), TagSet::MAX_TAGS);
    }

    #[test]
    fn tag_set_falls_back_to_other() {
        let taxonomy = TagTaxonomy::vaccine();
        assert!(TagSet::from_labels(Vec::<String>::new(), &taxonomy).is_other());
        assert!(TagSet::from_labels(["weather"], &taxonomy).is_other());
    }

    #[test]
    fn other_never_co_occurs_with_labels() {
        let taxonomy = TagTaxonomy::vaccine();
        let tags = TagSet::from_labels(["other", "efficacy"], &taxonomy);
        assert_eq!(tags.as_slice(), &["efficacy".to_string()]);
    }
}
