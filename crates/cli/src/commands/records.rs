//! `vaxchecker records`: List recently recorded questions, or summarize them by tag.

use std::fmt::Write;

use vaxchecker_agent::{TOP_TAGS, TagSummary, open_record_store};
use vaxchecker_config::AppConfig;

pub async fn run(limit: usize, stats: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let store = open_record_store(&config).await?;
    let records = store.list(if stats { usize::MAX } else { limit }).await?;

    if records.is_empty() {
        println!("No questions recorded ({} backend).", store.name());
        return Ok(());
    }

    if stats {
        print!("{}", render_stats(&TagSummary::from_records(&records)));
        return Ok(());
    }

    for record in &records {
        println!(
            "{}  {}  [{}]",
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.question,
            record.tags.as_slice().join(", ")
        );
    }
    Ok(())
}

fn render_stats(summary: &TagSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} questions, {} distinct tags. Top {}:",
        summary.questions,
        summary.distinct_tags(),
        TOP_TAGS.min(summary.distinct_tags())
    );
    for entry in summary.top(TOP_TAGS) {
        let _ = writeln!(out, "  {:>5}  {}", entry.count, entry.tag);
    }
    let _ = writeln!(out, "Questions per day:");
    for (day, count) in &summary.per_day {
        let _ = writeln!(out, "  {day}  {count}");
    }
    out
}
