//! # Docent CLI (`docent`)
//!
//! ## Usage
//!
//! ```bash
//! docent --config ./config/docent.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docent init` | Create the SQLite database and run schema migrations |
//! | `docent register` | Create an account |
//! | `docent upload <file>` | Index a PDF or text file as the active document |
//! | `docent search "<query>"` | Show the best-matching chunks |
//! | `docent ask "<question>"` | Ask the assistant one question |
//! | `docent chat` | Interactive question loop |
//! | `docent history` | Print the conversation log |

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use docent::{accounts, config, migrate, session};

/// Docent: ask questions about your own documents.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/docent.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "docent",
    about = "Docent: a document-grounded question answering assistant",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/docent.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Credentials {
    /// Account email.
    #[arg(long)]
    email: String,
    /// Account password.
    #[arg(long)]
    password: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Create a new account.
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
    },

    /// Upload a document (.pdf or .txt). It replaces the previous one.
    Upload {
        file: PathBuf,
        #[command(flatten)]
        credentials: Credentials,
    },

    /// Rank chunks of the active document against a query.
    Search {
        query: String,
        /// Number of results (defaults to `retrieval.top_k`).
        #[arg(long)]
        top_k: Option<usize>,
        #[command(flatten)]
        credentials: Credentials,
    },

    /// Ask one question and print the answer.
    Ask {
        question: String,
        #[command(flatten)]
        credentials: Credentials,
    },

    /// Start an interactive chat session.
    ///
    /// Inside the session: `:upload <path>`, `:history`, `:quit`.
    Chat {
        #[command(flatten)]
        credentials: Credentials,
    },

    /// Print the most recent conversation turns.
    History {
        /// Number of turns, at least 1.
        #[arg(long, default_value = "20", value_parser = clap::value_parser!(u32).range(1..))]
        limit: u32,
        #[command(flatten)]
        credentials: Credentials,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Register {
            email,
            name,
            password,
        } => {
            accounts::run_register(&cfg, &email, &name, &password).await?;
        }
        Commands::Upload { file, credentials } => {
            session::run_upload(&cfg, &file, &credentials.email, &credentials.password).await?;
        }
        Commands::Search {
            query,
            top_k,
            credentials,
        } => {
            session::run_search(
                &cfg,
                &query,
                top_k,
                &credentials.email,
                &credentials.password,
            )
            .await?;
        }
        Commands::Ask {
            question,
            credentials,
        } => {
            session::run_ask(&cfg, &question, &credentials.email, &credentials.password).await?;
        }
        Commands::Chat { credentials } => {
            session::run_chat(&cfg, &credentials.email, &credentials.password).await?;
        }
        Commands::History { limit, credentials } => {
            session::run_history(&cfg, limit, &credentials.email, &credentials.password).await?;
        }
    }

    Ok(())
}
