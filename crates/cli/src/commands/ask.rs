//! `vaxchecker ask`: Answer one question and print a JSON envelope.

use super::{envelope, load_checker, new_session_id};

pub async fn run(
    query: String,
    session: Option<String>,
    clear_session: bool,
    context: Option<String>,
    trace: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let session_id = session.unwrap_or_else(new_session_id);

    let result = match load_checker().await {
        Ok(checker) => {
            let answer = checker
                .answer(&session_id, &query, clear_session, context.as_deref())
                .await;
            if trace {
                for t in checker.telemetry().traces_for_session(&session_id) {
                    eprintln!("{}", checker.telemetry().export_trace(&t.id)?);
                }
            }
            answer
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&envelope::success(&outcome))?);
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Request failed");
            println!("{}", serde_json::to_string_pretty(&envelope::failure(&e))?);
            std::process::exit(1);
        }
    }
}
