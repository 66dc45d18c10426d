//! `vaxchecker classify`: Print a question's type and complexity.

use super::load_checker;

pub async fn run(query: String) -> Result<(), Box<dyn std::error::Error>> {
    let checker = load_checker().await?;
    let verdict = checker.classify_complexity(&query).await;
    println!("{}", serde_json::to_string(&verdict)?);
    Ok(())
}
