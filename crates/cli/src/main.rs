//! VaxChecker CLI: the main entry point.
//!
//! Commands:
//! - `ask`: Answer one question and print a JSON envelope
//! - `chat`: Interactive conversation within one session
//! - `classify`: Print a question's type and complexity
//! - `tags`: Tag a question and record it
//! - `records`: List recently recorded questions
//! - `onboard`: Write the default configuration file

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "vaxchecker",
    about = "VaxChecker: vaccine question answering",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Onboard,

    /// Answer a single question
    Ask {
        query: String,

        /// Session to continue (a fresh one is created when omitted)
        #[arg(short, long)]
        session: Option<String>,

        /// Drop the session's history before answering
        #[arg(long)]
        clear_session: bool,

        /// Extra context appended to the question
        #[arg(short, long)]
        context: Option<String>,

        /// Print the request's timing trace to stderr
        #[arg(long)]
        trace: bool,
    },

    /// Chat interactively
    Chat {
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Classify a question's type and complexity
    Classify { query: String },

    /// Tag a question with taxonomy labels
    Tags { query: String },

    /// List recently recorded questions
    Records {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
        /// Show the most frequent tags and questions per day instead
        #[arg(long)]
        stats: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Ask {
            query,
            session,
            clear_session,
            context,
            trace,
        } => commands::ask::run(query, session, clear_session, context, trace).await?,
        Commands::Chat { session } => commands::chat::run(session).await?,
        Commands::Classify { query } => commands::classify::run(query).await?,
        Commands::Tags { query } => commands::tags::run(query).await?,
        Commands::Records { limit, stats } => commands::records::run(limit, stats).await?,
    }

    Ok(())
}
