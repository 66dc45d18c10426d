//! `vaxchecker chat`: Interactive conversation within one session.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use super::{load_checker, new_session_id};

pub async fn run(session: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let checker = load_checker().await?;
    let session_id = session.unwrap_or_else(new_session_id);

    println!("VaxChecker interactive mode (session {session_id})");
    println!("   Type /clear to start over, /exit to quit.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut clear_next = false;

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        match input {
            "" => continue,
            "/exit" | "/quit" => break,
            "/clear" => {
                clear_next = true;
                println!("History will be cleared before the next question.\n");
                continue;
            }
            _ => {}
        }

        match checker.answer(&session_id, input, clear_next, None).await {
            Ok(outcome) => {
                println!("\n{}\n", outcome.generation.text);
                let primary = &outcome.generation.primary;
                if !primary.resolved_url.is_empty() {
                    println!("Source: {}\n", primary.resolved_url);
                } else if !primary.source_uri.is_empty() {
                    println!("Source: {}\n", primary.source_uri);
                }
            }
            Err(e) => eprintln!("Error: {e}\n"),
        }
        clear_next = false;
    }

    checker.end_session(&session_id).await;
    println!("Goodbye!");
    Ok(())
}
