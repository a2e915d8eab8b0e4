//! The `restate show` command.

use std::path::Path;

use anyhow::{bail, Context, Result};

use super::{format_rate, format_time, Session};

pub async fn execute(
    session: &Session,
    id: i64,
    json: bool,
    save_attachment: Option<&Path>,
) -> Result<()> {
    let record = session.service.get_record(id).await?;

    if let Some(target) = save_attachment {
        let Some(bytes) = session.service.attachment_bytes(id).await? else {
            bail!("record {id} has no attachment");
        };
        std::fs::write(target, &bytes)
            .with_context(|| format!("failed to write {}", target.display()))?;
        eprintln!("Saved {} bytes to {}", bytes.len(), target.display());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    println!("Record #{} (version {})", record.id, record.version_no);
    if let Some(owner) = record.owner_id {
        println!("Owner: {owner}");
    }
    println!("Subject: {}", record.subject);
    println!("Rate: {}", format_rate(record.matching_rate));
    println!("Hash: {}", record.content_hash);
    println!("Created: {}", format_time(&record.created_at));
    if record.is_important {
        println!("Important: yes");
    }
    if let Some(deletion) = record.scheduled_deletion() {
        println!("Hidden: scheduled for deletion on {}", format_time(&deletion));
    }
    if let Some(meta) = &record.attachment {
        println!(
            "Attachment: {} ({} bytes)",
            meta.file_name.as_deref().unwrap_or("unnamed"),
            meta.size
        );
    }

    println!("\nOriginal:\n{}", record.original_text);
    if record.user_text.is_empty() {
        println!("\nRestatement: (none yet)");
    } else {
        println!("\nRestatement:\n{}", record.user_text);
    }

    if let Some(detail) = &record.result {
        if !detail.missed_keywords.is_empty() {
            println!("\nMissed: {}", detail.missed_keywords.join(", "));
        }
    }

    Ok(())
}
