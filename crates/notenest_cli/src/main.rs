//! `notenest` command-line front end.
//!
//! # Responsibility
//! - Resolve configuration from flags and an optional config file.
//! - Drive `notenest_core` sessions for one-shot commands and the
//!   interactive shell.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use notenest_core::{
    init_logging, NoteDraft, NoteId, NoteRepository, NotesConfig, NotesSession, SaveOutcome,
    SystemClock,
};
use std::path::PathBuf;
use std::sync::Arc;

mod shell;

#[derive(Parser)]
#[command(name = "notenest")]
#[command(version)]
#[command(about = "Keep short local notes with undoable deletes")]
#[command(after_help = "EXAMPLES:\n    \
    notenest add --title Groceries --content \"milk, eggs\"\n    \
    notenest list --json\n    \
    notenest edit 3 --title Groceries --content \"milk\"\n    \
    notenest delete 3\n    \
    notenest shell                Interactive mode with undo")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// SQLite file holding the notes (overrides the config file)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    /// JSON config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a note
    Add {
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
    },
    /// Replace the title and content of an existing note
    Edit {
        id: i64,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
    },
    /// List notes, most recently touched first
    List {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a note immediately
    Delete { id: i64 },
    /// Interactive session with undoable deletes
    Shell,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    if let Some(log_dir) = config.log_dir.as_ref() {
        init_logging(&config.log_level, log_dir).context("failed to initialize logging")?;
    }

    let mut session = NotesSession::open(&config, Arc::new(SystemClock))
        .with_context(|| format!("failed to open `{}`", config.db_path.display()))?;

    match cli.command {
        Commands::Add { title, content } => {
            let report = session.save(&NoteDraft::new(title, content))?;
            match report.outcome {
                SaveOutcome::Created(id) => println!("Created note {id}."),
                _ => bail!("note could not be saved"),
            }
        }
        Commands::Edit { id, title, content } => {
            let report = session.save(&NoteDraft::edit(NoteId::new(id), title, content))?;
            match report.outcome {
                SaveOutcome::Updated(id) => println!("Updated note {id}."),
                _ => bail!("no note with id {id}. Run 'notenest list' to see ids."),
            }
        }
        Commands::List { json } => {
            let notes = session.store().list_all()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&notes)?);
            } else if notes.is_empty() {
                println!("No notes.");
            } else {
                for note in &notes {
                    println!("{:>5}  {}  {}", note.id, note.timestamp, note.title);
                }
            }
        }
        Commands::Delete { id } => {
            session.refresh()?;
            session.delete_ids(&[NoteId::new(id)])?;
            let report = session.confirm_delete()?;
            if report.is_clean() {
                println!("Deleted note {id}.");
            } else {
                bail!("note {id} could not be deleted");
            }
        }
        Commands::Shell => shell::run(session, config.grace_period_ms)?,
    }

    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<NotesConfig> {
    let mut config = match cli.config.as_ref() {
        Some(path) => NotesConfig::load(path)?,
        None => NotesConfig::default(),
    };
    if let Some(db) = cli.db.as_ref() {
        config.db_path = db.clone();
    }
    if let Some(level) = cli.log_level.as_ref() {
        config.log_level = level.clone();
    }
    if let Some(dir) = cli.log_dir.as_ref() {
        config.log_dir = Some(dir.clone());
    }
    Ok(config.validate()?)
}
