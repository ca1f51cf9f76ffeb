use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Parley - webhook-backed chat sessions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a message through a session (a new session is created when none is given)
    Send {
        /// The message text
        message: String,
        /// Session id to send through
        #[arg(long)]
        session: Option<String>,
        /// Chat mode for a newly created session (chat, research, report)
        #[arg(long, default_value = "chat")]
        mode: String,
    },
    /// Manage stored sessions
    Sessions {
        #[command(subcommand)]
        action: SessionsAction,
    },
    /// Toggle the chat mode on a session
    Mode {
        /// Mode to toggle (research, report, or none)
        mode: String,
        /// Session id to operate on
        #[arg(long)]
        session: String,
    },
}

#[derive(Subcommand)]
enum SessionsAction {
    /// List visible sessions
    List,
    /// Delete one session
    Delete {
        /// Id of the session to delete
        id: String,
    },
    /// Delete every session
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let app = commands::bootstrap().await?;

    match cli.command {
        Commands::Send {
            message,
            session,
            mode,
        } => commands::send::run(&app, &message, session.as_deref(), &mode).await?,
        Commands::Sessions { action } => match action {
            SessionsAction::List => commands::sessions::list(&app).await,
            SessionsAction::Delete { id } => commands::sessions::delete(&app, &id).await,
            SessionsAction::Clear => commands::sessions::clear(&app).await,
        },
        Commands::Mode { mode, session } => commands::mode::run(&app, &mode, &session).await?,
    }

    Ok(())
}
