//! Subcommand implementations and the helpers they share.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use comfy_table::{Cell, Table};

use restate_core::model::{AnalysisRecord, PageRequest, RecordSummary};
use restate_core::service::AnalysisService;
use restate_providers::config::{create_engine, load_config_from, RestateConfig};
use restate_store::SqliteStore;

pub mod flags;
pub mod init;
pub mod list;
pub mod note;
pub mod reset;
pub mod show;
pub mod submit;

/// Loaded configuration plus the service wired to the configured engine
/// and database.
pub struct Session {
    pub service: AnalysisService,
    pub config: RestateConfig,
}

impl Session {
    pub fn open(db: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<Self> {
        let mut config = load_config_from(config_path.as_deref())?;
        if let Some(db) = db {
            config.database_path = db;
        }

        let engine = create_engine(&config.scorer)?;
        let store = SqliteStore::open(&config.database_path)?;
        tracing::debug!(
            engine = engine.name(),
            db = %config.database_path.display(),
            "session opened"
        );

        Ok(Self {
            service: AnalysisService::new(engine, Arc::new(store)),
            config,
        })
    }
}

/// Zero-based paging flags shared by the listing commands.
#[derive(Args, Debug, Clone, Copy)]
pub struct Paging {
    /// Page number, starting at 0
    #[arg(long, default_value = "0")]
    pub page: u32,

    /// Page size (defaults to the configured size)
    #[arg(long)]
    pub size: Option<u32>,
}

impl Paging {
    pub fn request(&self, default_size: u32) -> PageRequest {
        PageRequest::new(self.page, self.size.unwrap_or(default_size))
    }
}

pub fn format_time(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

pub fn format_rate(rate: f64) -> String {
    format!("{rate:.2}%")
}

/// Single-line preview of a possibly long text.
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &flat[..idx]),
        None => flat,
    }
}

pub fn print_summaries(rows: &[RecordSummary], show_deletion: bool) {
    let mut table = Table::new();
    let mut header = vec!["ID", "Created", "Rate", "Version", "Subject", "Important", "Notes"];
    if show_deletion {
        header.push("Deleted on");
    }
    table.set_header(header);

    for row in rows {
        let mut cells = vec![
            Cell::new(row.id),
            Cell::new(format_time(&row.created_at)),
            Cell::new(format_rate(row.matching_rate)),
            Cell::new(row.version_no),
            Cell::new(&row.subject),
            Cell::new(if row.is_important { "*" } else { "" }),
            Cell::new(row.note_count),
        ];
        if show_deletion {
            cells.push(Cell::new(
                row.scheduled_deletion
                    .map(|at| format_time(&at))
                    .unwrap_or_default(),
            ));
        }
        table.add_row(cells);
    }

    println!("{table}");
}

pub fn print_records(rows: &[AnalysisRecord]) {
    let mut table = Table::new();
    table.set_header(vec!["ID", "Owner", "Version", "Rate", "Subject", "Attempt", "Created"]);

    for row in rows {
        table.add_row(vec![
            Cell::new(row.id),
            Cell::new(row.owner_id.map(|o| o.to_string()).unwrap_or_default()),
            Cell::new(row.version_no),
            Cell::new(format_rate(row.matching_rate)),
            Cell::new(&row.subject),
            Cell::new(preview(&row.user_text, 30)),
            Cell::new(format_time(&row.created_at)),
        ]);
    }

    println!("{table}");
}

pub fn print_page_footer(page: u32, total_items: u64, total_pages: u64) {
    println!("Page {} of {} ({} total)", page + 1, total_pages.max(1), total_items);
}
