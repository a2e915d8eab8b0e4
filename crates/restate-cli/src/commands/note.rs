//! The `restate note` subcommands.

use anyhow::Result;
use comfy_table::{Cell, Table};
use uuid::Uuid;

use super::{format_time, Session};

pub async fn add(session: &Session, record_id: i64, content: &str) -> Result<()> {
    let note = session.service.add_note(record_id, content).await?;
    println!("Added note {} to record #{record_id}", note.id);
    Ok(())
}

pub async fn list(session: &Session, record_id: i64) -> Result<()> {
    let notes = session.service.list_notes(record_id).await?;
    if notes.is_empty() {
        println!("No notes on record #{record_id}.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Created", "Note"]);
    for note in &notes {
        table.add_row(vec![
            Cell::new(note.id),
            Cell::new(format_time(&note.created_at)),
            Cell::new(&note.content),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub async fn delete(session: &Session, note_id: Uuid) -> Result<()> {
    session.service.delete_note(note_id).await?;
    println!("Deleted note {note_id}");
    Ok(())
}
