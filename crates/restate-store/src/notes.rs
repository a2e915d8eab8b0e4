use std::collections::HashMap;

use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, Connection, Row};
use uuid::Uuid;

use restate_core::error::AnalysisError;
use restate_core::model::Note;

use crate::helpers::{format_datetime, parse_datetime, to_u64};

fn row_to_note(row: &Row) -> Result<Note> {
    let id: String = row.get("id")?;
    let created_at: String = row.get("created_at")?;
    Ok(Note {
        id: Uuid::parse_str(&id).with_context(|| format!("invalid note id '{id}'"))?,
        record_id: row.get("record_id")?,
        content: row.get("content")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

pub fn insert(conn: &Connection, note: &Note) -> Result<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM analysis_records WHERE id = ?1)",
        params![note.record_id],
        |row| row.get(0),
    )?;
    if !exists {
        return Err(AnalysisError::not_found_record(note.record_id).into());
    }

    conn.execute(
        "INSERT INTO notes (id, record_id, content, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            note.id.to_string(),
            note.record_id,
            note.content,
            format_datetime(&note.created_at)
        ],
    )
    .context("failed to insert note")?;
    Ok(())
}

pub fn list(conn: &Connection, record_id: i64) -> Result<Vec<Note>> {
    let mut stmt = conn.prepare(
        "SELECT id, record_id, content, created_at FROM notes
         WHERE record_id = ?1
         ORDER BY created_at DESC",
    )?;
    let mut rows = stmt.query(params![record_id])?;
    let mut notes = Vec::new();
    while let Some(row) = rows.next()? {
        notes.push(row_to_note(row)?);
    }
    Ok(notes)
}

pub fn delete(conn: &Connection, note_id: Uuid) -> Result<bool> {
    let removed = conn
        .execute("DELETE FROM notes WHERE id = ?1", params![note_id.to_string()])
        .context("failed to delete note")?;
    Ok(removed > 0)
}

/// Note counts for `record_ids`; ids without notes map to zero.
pub fn counts(conn: &Connection, record_ids: &[i64]) -> Result<HashMap<i64, u64>> {
    let mut counts: HashMap<i64, u64> = record_ids.iter().map(|id| (*id, 0)).collect();
    if record_ids.is_empty() {
        return Ok(counts);
    }

    let placeholders = vec!["?"; record_ids.len()].join(", ");
    let mut stmt = conn.prepare(&format!(
        "SELECT record_id, COUNT(*) FROM notes WHERE record_id IN ({placeholders})
         GROUP BY record_id"
    ))?;
    let mut rows = stmt.query(params_from_iter(record_ids.iter()))?;
    while let Some(row) = rows.next()? {
        let record_id: i64 = row.get(0)?;
        let total: i64 = row.get(1)?;
        counts.insert(record_id, to_u64(total, "note count")?);
    }
    Ok(counts)
}
