//! `vaxchecker tags`: Tag a question and record it.

use serde_json::json;

use super::load_checker;

pub async fn run(query: String) -> Result<(), Box<dyn std::error::Error>> {
    let checker = load_checker().await?;
    let tags = checker.classify_tags(&query).await;
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({ "tags": tags, "question": query }))?
    );
    Ok(())
}
