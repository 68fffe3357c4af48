//! # Cardlink CLI
//!
//! The `cardlink` binary manages a local card database and keeps card
//! references and backlinks in sync.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `cardlink init` | Create the SQLite database and run schema migrations |
//! | `cardlink new <title>` | Create a card |
//! | `cardlink cards` | List cards in a project |
//! | `cardlink show <id>` | Print a card's content |
//! | `cardlink save <id> --file <path>` | Save text onto a card, synchronizing references |
//! | `cardlink check --file <path>` | Validate reference annotations in a file without repairing |
//! | `cardlink backlinks <id>` | List cards that reference a card |
//!
//! ## Examples
//!
//! ```bash
//! cardlink init
//! cardlink new "Target"
//! cardlink new "Source"
//! echo 'see [[Target]](go there)' > note.md
//! cardlink save 2 --file note.md
//! cardlink backlinks 1
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use cardlink::backlinks::backlinks_for_card;
use cardlink::cards;
use cardlink::config::load_config;
use cardlink::sqlite_store::SqliteCardStore;
use cardlink::{db, migrate, parse_references};

/// Cardlink — reference annotation and backlink synchronization for
/// card-based notes.
#[derive(Parser)]
#[command(
    name = "cardlink",
    about = "Keep card references and backlinks in sync",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/cardlink.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file, all required tables, and a
    /// default project. Idempotent.
    Init,

    /// Create a card.
    New {
        /// Card title. References resolve against titles, so keep them
        /// unique within a project.
        title: String,

        /// Project the card belongs to.
        #[arg(long, default_value_t = 1)]
        project: i64,

        /// Optional one-line summary.
        #[arg(long)]
        summary: Option<String>,
    },

    /// List cards in a project.
    Cards {
        #[arg(long, default_value_t = 1)]
        project: i64,
    },

    /// Print a card's content.
    Show {
        /// Card id.
        id: i64,
    },

    /// Save text onto a card.
    ///
    /// Runs the reference synchronizer: assigns stable ids to new
    /// references, reconciles backlink tags, and persists the normalized
    /// text as the card's content.
    Save {
        /// Card id.
        id: i64,

        /// File containing the card's new text.
        #[arg(long)]
        file: PathBuf,
    },

    /// Validate a file's reference annotations without repairing.
    ///
    /// Fails on a reference with no ref id or on an orphaned ref comment.
    Check {
        /// File to validate.
        #[arg(long)]
        file: PathBuf,
    },

    /// List cards that reference the given card.
    Backlinks {
        /// Target card id.
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // `check` is pure text validation and needs no database.
    if let Commands::Check { file } = &cli.command {
        let text = std::fs::read_to_string(file)?;
        return match parse_references(&text, false) {
            Ok(outcome) => {
                println!("ok: {} reference(s)", outcome.tokens.len());
                Ok(())
            }
            Err(err) => {
                eprintln!("invalid: {err}");
                std::process::exit(1);
            }
        };
    }

    let config = load_config(&cli.config)?;
    let pool = db::connect(&config).await?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&pool).await?;
            println!("Database initialized at {}", config.db.path.display());
        }
        Commands::New {
            title,
            project,
            summary,
        } => {
            let id = cards::create_card(&pool, project, &title, summary.as_deref()).await?;
            println!("Created card {id}: {title}");
        }
        Commands::Cards { project } => {
            for card in cards::list_cards(&pool, project).await? {
                match card.summary {
                    Some(summary) => println!("{:>6}  {}  — {}", card.id, card.title, summary),
                    None => println!("{:>6}  {}", card.id, card.title),
                }
            }
        }
        Commands::Show { id } => match cards::get_card(&pool, id).await? {
            Some(card) => {
                println!("# {}\n", card.title);
                println!("{}", card.content);
            }
            None => {
                eprintln!("no such card: {id}");
                std::process::exit(1);
            }
        },
        Commands::Save { id, file } => {
            let text = std::fs::read_to_string(&file)?;
            let store = SqliteCardStore::new(pool.clone());
            let outcome = cards::save_card(&store, id, &text).await?;
            println!(
                "Saved card {id}: {} reference(s) synchronized",
                outcome.tokens.len()
            );
        }
        Commands::Check { .. } => unreachable!("handled above"),
        Commands::Backlinks { id } => {
            let links = backlinks_for_card(&pool, id).await?;
            if links.is_empty() {
                println!("No backlinks.");
            }
            for link in links {
                println!(
                    "{:>6}  {}  ({})",
                    link.source_card_id, link.source_title, link.placeholder
                );
            }
        }
    }

    Ok(())
}
