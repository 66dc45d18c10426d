//! `vaxchecker onboard`: First-time setup.

use vaxchecker_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("VaxChecker First-Time Setup");
    println!("===========================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("\nConfig already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("Created config.toml at: {}", config_path.display());
        println!("\nNext steps:");
        println!("   1. Set knowledge_base_id and model_arn (or KNOWLEDGE_BASE_ID / FM_ARN)");
        println!("   2. Export VAXCHECKER_API_KEY or AWS_BEARER_TOKEN_BEDROCK");
        println!("   3. Run: vaxchecker ask \"Is the vaccine safe for children?\"\n");
    }

    Ok(())
}
