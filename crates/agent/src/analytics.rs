//! Tag frequency and daily volume over recorded questions.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use vaxchecker_core::record::QuestionRecord;

/// How many tags a summary shows.
pub const TOP_TAGS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// Tag counts and per-day question volume for a set of records.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TagSummary {
    pub questions: usize,
    /// Most frequent first; ties ordered by tag.
    pub tags: Vec<TagCount>,
    pub per_day: BTreeMap<NaiveDate, usize>,
}

impl TagSummary {
    pub fn from_records(records: &[QuestionRecord]) -> Self {
        let mut per_day = BTreeMap::new();
        for record in records {
            *per_day.entry(record.timestamp.date_naive()).or_insert(0) += 1;
        }
        Self {
            questions: records.len(),
            tags: tag_counts(records),
            per_day,
        }
    }

    /// The `n` most frequent tags.
    pub fn top(&self, n: usize) -> &[TagCount] {
        &self.tags[..n.min(self.tags.len())]
    }

    /// Number of distinct tags seen.
    pub fn distinct_tags(&self) -> usize {
        self.tags.len()
    }
}

/// Count every tag occurrence, `"other"` included.
pub fn tag_counts(records: &[QuestionRecord]) -> Vec<TagCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for tag in records.iter().flat_map(|r| r.tags.as_slice()) {
        *counts.entry(tag.as_str()).or_insert(0) += 1;
    }

    let mut tags: Vec<TagCount> = counts
        .into_iter()
        .map(|(tag, count)| TagCount { tag: tag.to_string(), count })
        .collect();
    // Stable sort: ties stay in tag order.
    tags.sort_by(|a, b| b.count.cmp(&a.count));
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use vaxchecker_core::classification::TagSet;
    use vaxchecker_core::taxonomy::TagTaxonomy;

    fn record(tags: &[&str], day: u32) -> QuestionRecord {
        let at = Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap();
        QuestionRecord::at("q", TagSet::from_labels(tags, &TagTaxonomy::vaccine()), at)
    }

    fn labels() -> &'static [&'static str] {
        TagTaxonomy::vaccine().labels()
    }

    #[test]
    fn counts_are_ordered_by_frequency_then_tag() {
        let (a, b, c) = (labels()[0], labels()[1], labels()[2]);
        let records = vec![
            record(&[b, a], 1),
            record(&[b], 1),
            record(&[c, a], 2),
            record(&[b], 3),
            record(&["not a label"], 3),
        ];

        let counts = tag_counts(&records);

        assert_eq!(counts.len(), 4);
        assert_eq!(counts[0], TagCount { tag: b.to_string(), count: 3 });
        assert_eq!(counts[1], TagCount { tag: a.to_string(), count: 2 });
        let mut singles = vec![c.to_string(), TagSet::OTHER.to_string()];
        singles.sort();
        let tail: Vec<String> = counts[2..].iter().map(|t| t.tag.clone()).collect();
        assert_eq!(tail, singles);
        assert!(counts[2..].iter().all(|t| t.count == 1));
    }

    #[test]
    fn summary_keeps_top_ten_and_daily_volume() {
        let records: Vec<QuestionRecord> = labels()
            .iter()
            .take(12)
            .enumerate()
            .flat_map(|(i, label)| (0..=i).map(move |_| record(&[*label], 1 + (i as u32 % 3))))
            .collect();

        let summary = TagSummary::from_records(&records);

        assert_eq!(summary.questions, records.len());
        assert_eq!(summary.distinct_tags(), 12);
        let top = summary.top(TOP_TAGS);
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].tag, labels()[11]);
        assert_eq!(top[0].count, 12);
        assert_eq!(top[9].count, 3);
        assert_eq!(summary.per_day.len(), 3);
        assert_eq!(summary.per_day.values().sum::<usize>(), records.len());
    }

    #[test]
    fn empty_records_give_empty_summary() {
        let summary = TagSummary::from_records(&[]);
        assert_eq!(summary.questions, 0);
        assert!(summary.top(TOP_TAGS).is_empty());
        assert!(summary.per_day.is_empty());
    }
}
