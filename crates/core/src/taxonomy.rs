//! The closed set of labels a question may be tagged with.

/// Vaccine question labels, in prompt order.
pub const VACCINE_TAGS: &[&str] = &[
    "safety",
    "children safety",
    "pregnant safety",
    "elderly safety",
    "long-term safety",
    "vaccine testing",
    "approval safety",
    "necessity",
    "personal eligibility",
    "public health",
    "herd immunity",
    "efficacy",
    "infection prevention",
    "severe illness prevention",
    "variant protection",
    "waning immunity",
    "booster shots",
    "side effects",
    "mild side effects",
    "serious side effects",
    "allergic reactions",
    "autoimmune response",
    "rare side effects",
    "long-term effects",
    "general eligibility",
    "children eligibility",
    "pregnant eligibility",
    "elderly eligibility",
    "chronic illness",
    "special populations",
    "vaccine contraindications",
    "vaccine types",
    "mRNA vaccines",
    "adenovirus vaccines",
    "inactivated vaccines",
    "protein subunit vaccines",
    "viral vector vaccines",
    "nasal spray vaccines",
    "vaccination process",
    "doses",
    "dose interval",
    "vaccination schedule",
    "vaccination sites",
    "booster schedule",
    "missed doses",
    "availability",
    "distribution",
    "scheduling",
    "shortage",
    "priority groups",
    "regional availability",
    "regulation",
    "emergency use authorization",
    "full approval",
    "clinical trials",
    "manufacturing quality",
    "lot recalls",
    "production monitoring",
    "vaccine myths",
    "misinformation",
    "conspiracy theories",
    "anti-vaccine movements",
    "scientific evidence",
    "debunking myths",
    "data and studies",
    "real-world studies",
    "comparative studies",
    "variant effectiveness",
    "study updates",
    "peer-reviewed research",
    "travel requirements",
    "workplace mandates",
    "vaccine passports",
    "international travel",
    "entry restrictions",
    "vaccine ethics",
    "mandatory vaccination",
    "vaccine equity",
    "anti-vaccine concerns",
    "informed consent",
    "immunity comparison",
    "co-administration",
    "pregnancy and breastfeeding",
    "timing post-infection",
    "global initiatives",
];

/// A fixed, ordered, read-only label set.
#[derive(Debug, Clone, Copy)]
pub struct TagTaxonomy {
    labels: &'static [&'static str],
}

impl TagTaxonomy {
    /// Wrap a static label list. Labels must be unique and must not include `"other"`.
    pub const fn new(labels: &'static [&'static str]) -> Self {
        Self { labels }
    }

    /// The vaccine taxonomy.
    pub const fn vaccine() -> Self {
        Self::new(VACCINE_TAGS)
    }

    pub fn labels(&self) -> &'static [&'static str] {
        self.labels
    }

    /// Exact, case-sensitive membership.
    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(&label)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// The literal JSON array embedded in classification prompts.
    pub fn to_json_array(&self) -> String {
        serde_json::to_string(self.labels).unwrap_or_else(|_| "[]".into())
    }
}

impl Default for TagTaxonomy {
    fn default() -> Self {
        Self::vaccine()
    }
}
