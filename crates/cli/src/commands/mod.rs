pub mod ask;
pub mod chat;
pub mod classify;
pub mod envelope;
pub mod onboard;
pub mod records;
pub mod tags;

use vaxchecker_agent::{VaxChecker, open_context_store, open_record_store};
use vaxchecker_config::AppConfig;
use vaxchecker_core::Error;

/// Load configuration and wire a ready service.
pub async fn load_checker() -> Result<VaxChecker, Error> {
    let config = AppConfig::load()?;
    let services = vaxchecker_providers::build_from_config(&config)?;
    let records = open_record_store(&config).await?;
    let checker = VaxChecker::from_config(&config, services, records)?;
    Ok(match open_context_store(&config).await? {
        Some(store) => checker.with_context_store(store),
        None => checker,
    })
}

/// Fresh session id for commands that were not given one.
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
