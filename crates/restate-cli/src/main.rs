//! restate CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use uuid::Uuid;

mod commands;

#[derive(Parser)]
#[command(
    name = "restate",
    version,
    about = "Score restatements of a text and keep a versioned history of attempts"
)]
struct Cli {
    /// SQLite database path (overrides config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a restatement against an original text
    Submit {
        /// Original text
        #[arg(long)]
        original: Option<String>,

        /// Source file whose text is appended to the original
        #[arg(long)]
        attach: Option<PathBuf>,

        /// Your restatement
        #[arg(long, conflicts_with = "user_file")]
        user: Option<String>,

        /// Read the restatement from a file
        #[arg(long)]
        user_file: Option<PathBuf>,

        /// Owner id; without it the score is shown but nothing is saved
        #[arg(long)]
        owner: Option<i64>,

        /// Owner display name, used by owner searches
        #[arg(long)]
        name: Option<String>,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one record
    Show {
        id: i64,

        /// Print the record as JSON
        #[arg(long)]
        json: bool,

        /// Write the uploaded source file to this path
        #[arg(long, value_name = "PATH")]
        save_attachment: Option<PathBuf>,
    },

    /// Re-open an original text for a fresh attempt
    Reset { id: i64 },

    /// Toggle the important flag of a record
    Important { id: i64 },

    /// Hide a record (scheduled for deletion after 30 days)
    Hide { id: i64 },

    /// Restore a hidden record
    Restore { id: i64 },

    /// List an owner's visible records
    List {
        #[arg(long)]
        owner: i64,

        #[command(flatten)]
        paging: commands::Paging,
    },

    /// List an owner's hidden records
    Hidden {
        #[arg(long)]
        owner: i64,

        #[command(flatten)]
        paging: commands::Paging,
    },

    /// Latest attempt per original text, newest first
    Latest {
        /// Restrict to one owner
        #[arg(long)]
        owner: Option<i64>,

        /// Substring to search for
        #[arg(long)]
        keyword: Option<String>,

        /// What the keyword matches: owner or subject
        #[arg(long, default_value = "subject")]
        search_type: restate_core::model::SearchKind,

        #[command(flatten)]
        paging: commands::Paging,
    },

    /// Other attempts at the same original text as a record
    Related {
        id: i64,

        #[command(flatten)]
        paging: commands::Paging,
    },

    /// An owner's attempts at one original text, by version
    Trend {
        #[arg(long)]
        owner: i64,

        /// Content hash of the original
        #[arg(long, required_unless_present = "record")]
        hash: Option<String>,

        /// Take the content hash from this record
        #[arg(long, conflicts_with = "hash")]
        record: Option<i64>,
    },

    /// Manage study notes on records
    Note {
        #[command(subcommand)]
        action: NoteAction,
    },

    /// Create a starter config file
    Init,
}

#[derive(Subcommand)]
enum NoteAction {
    /// Attach a note to a record
    Add { record_id: i64, content: String },

    /// List a record's notes, newest first
    List { record_id: i64 },

    /// Delete a note
    Delete { note_id: Uuid },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("restate=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        db,
        config,
        command,
    } = cli;
    let open = move || commands::Session::open(db, config);

    match command {
        Commands::Submit {
            original,
            attach,
            user,
            user_file,
            owner,
            name,
            json,
        } => {
            let args = commands::submit::SubmitArgs {
                original,
                attach,
                user,
                user_file,
                owner,
                name,
                json,
            };
            commands::submit::execute(&open()?, args).await
        }
        Commands::Show {
            id,
            json,
            save_attachment,
        } => commands::show::execute(&open()?, id, json, save_attachment.as_deref()).await,
        Commands::Reset { id } => commands::reset::execute(&open()?, id).await,
        Commands::Important { id } => commands::flags::important(&open()?, id).await,
        Commands::Hide { id } => commands::flags::hide(&open()?, id).await,
        Commands::Restore { id } => commands::flags::restore(&open()?, id).await,
        Commands::List { owner, paging } => commands::list::visible(&open()?, owner, paging).await,
        Commands::Hidden { owner, paging } => commands::list::hidden(&open()?, owner, paging).await,
        Commands::Latest {
            owner,
            keyword,
            search_type,
            paging,
        } => commands::list::latest(&open()?, owner, keyword, search_type, paging).await,
        Commands::Related { id, paging } => commands::list::related(&open()?, id, paging).await,
        Commands::Trend {
            owner,
            hash,
            record,
        } => commands::list::trend(&open()?, owner, hash, record).await,
        Commands::Note { action } => match action {
            NoteAction::Add { record_id, content } => {
                commands::note::add(&open()?, record_id, &content).await
            }
            NoteAction::List { record_id } => commands::note::list(&open()?, record_id).await,
            NoteAction::Delete { note_id } => commands::note::delete(&open()?, note_id).await,
        },
        Commands::Init => commands::init::execute(),
    }
}
