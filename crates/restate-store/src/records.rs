use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Params, Row, TransactionBehavior};

use restate_core::error::AnalysisError;
use restate_core::hashing::ContentHash;
use restate_core::model::{
    AnalysisRecord, AttachmentMeta, LatestQuery, NewRecord, Page, PageRequest, SearchKind,
};
use restate_core::schema::{decode_result, encode_result};

use crate::helpers::{
    format_datetime, is_unique_violation, like_pattern, parse_datetime, parse_optional_datetime,
    to_i64, to_u32, to_u64,
};

const RECORD_COLUMNS: &str = "id, owner_id, original_text, user_text, content_hash, version_no, \
     matching_rate, result_json, subject, is_important, is_hidden, hidden_at, \
     attachment_name, attachment_type, attachment_size, created_at";

/// Attempts at a versioned insert before reporting a conflict.
const MAX_INSERT_ATTEMPTS: u32 = 3;

/// Latest record id of every `(owner, hash)` group, filtered before grouping.
/// Binds `?1` owner id, `?2` subject pattern, `?3` owner-name pattern.
const LATEST_GROUP_IDS: &str = "SELECT MAX(r2.id)
     FROM analysis_records r2
     LEFT JOIN owners o ON o.id = r2.owner_id
     WHERE (?1 IS NULL OR r2.owner_id = ?1)
       AND (?2 IS NULL OR r2.subject LIKE ?2 ESCAPE '\\')
       AND (?3 IS NULL OR o.name LIKE ?3 ESCAPE '\\')
     GROUP BY r2.owner_id, r2.content_hash";

fn row_to_record(row: &Row) -> Result<AnalysisRecord> {
    let content_hash: String = row.get("content_hash")?;
    let version_no: i64 = row.get("version_no")?;
    let result_json: String = row.get("result_json")?;
    let is_hidden: Option<bool> = row.get("is_hidden")?;
    let hidden_at: Option<String> = row.get("hidden_at")?;
    let attachment_size: Option<i64> = row.get("attachment_size")?;
    let created_at: String = row.get("created_at")?;

    let attachment = match attachment_size {
        Some(size) => Some(AttachmentMeta {
            file_name: row.get("attachment_name")?,
            content_type: row.get("attachment_type")?,
            size: to_u64(size, "attachment_size")?,
        }),
        None => None,
    };

    Ok(AnalysisRecord {
        id: row.get("id")?,
        owner_id: row.get("owner_id")?,
        original_text: row.get("original_text")?,
        user_text: row.get("user_text")?,
        content_hash: ContentHash::from_hex(content_hash)
            .map_err(|e| anyhow!("corrupt content_hash column: {e}"))?,
        version_no: to_u32(version_no, "version_no")?,
        matching_rate: row.get("matching_rate")?,
        result: decode_result(&result_json)?,
        subject: row.get("subject")?,
        is_important: row.get("is_important")?,
        is_hidden: is_hidden.unwrap_or(false),
        hidden_at: parse_optional_datetime(hidden_at, "hidden_at")?,
        attachment,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

fn query_records<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<AnalysisRecord>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        records.push(row_to_record(row)?);
    }
    Ok(records)
}

fn count<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<u64> {
    let total: i64 = conn.query_row(sql, params, |row| row.get(0))?;
    to_u64(total, "count")
}

pub fn get(conn: &Connection, id: i64) -> Result<Option<AnalysisRecord>> {
    let sql = format!("SELECT {RECORD_COLUMNS} FROM analysis_records WHERE id = ?1");
    Ok(query_records(conn, &sql, params![id])?.into_iter().next())
}

fn get_existing(conn: &Connection, id: i64) -> Result<AnalysisRecord> {
    get(conn, id)?.ok_or_else(|| anyhow!("analysis record {id} vanished after write"))
}

pub fn max_version(conn: &Connection, hash: &ContentHash) -> Result<Option<u32>> {
    let max: Option<i64> = conn
        .query_row(
            "SELECT MAX(version_no) FROM analysis_records WHERE content_hash = ?1",
            params![hash.as_str()],
            |row| row.get(0),
        )
        .context("failed to read max version")?;
    max.map(|v| to_u32(v, "version_no")).transpose()
}

pub fn find_by_hash_and_version(
    conn: &Connection,
    hash: &ContentHash,
    version_no: u32,
) -> Result<Option<AnalysisRecord>> {
    let sql = format!(
        "SELECT {RECORD_COLUMNS} FROM analysis_records WHERE content_hash = ?1 AND version_no = ?2"
    );
    Ok(query_records(conn, &sql, params![hash.as_str(), version_no])?
        .into_iter()
        .next())
}

fn insert_row(
    conn: &Connection,
    record: &NewRecord,
    version_no: u32,
    result_json: &str,
    attachment_size: Option<i64>,
) -> rusqlite::Result<i64> {
    let attachment = record.attachment.as_ref();
    conn.execute(
        "INSERT INTO analysis_records (owner_id, original_text, user_text, content_hash, version_no,
             matching_rate, result_json, subject, attachment_name, attachment_type,
             attachment_size, attachment_bytes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            record.owner_id,
            record.original_text,
            record.user_text,
            record.content_hash.as_str(),
            version_no,
            record.matching_rate,
            result_json,
            record.subject,
            attachment.and_then(|a| a.file_name.as_deref()),
            attachment.and_then(|a| a.content_type.as_deref()),
            attachment_size,
            attachment.map(|a| a.bytes.as_slice()),
            format_datetime(&record.created_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Insert with the next free version of the record's hash.
///
/// The max read and the insert share one immediate transaction; a unique
/// index clash from another connection is retried a bounded number of times.
pub fn insert_versioned(conn: &mut Connection, record: &NewRecord) -> Result<AnalysisRecord> {
    let result_json = encode_result(record.result.as_ref())?;
    let attachment_size = record
        .attachment
        .as_ref()
        .map(|a| to_i64(a.bytes.len() as u64))
        .transpose()?;

    for attempt in 1..=MAX_INSERT_ATTEMPTS {
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("failed to open insert transaction")?;
        let version_no = max_version(&tx, &record.content_hash)?.map_or(0, |v| v + 1);

        match insert_row(&tx, record, version_no, &result_json, attachment_size) {
            Ok(id) => {
                tx.commit().context("failed to commit record insert")?;
                tracing::debug!(
                    id,
                    hash = %record.content_hash.short(),
                    version_no,
                    "assigned version"
                );
                return get_existing(conn, id);
            }
            Err(err) if is_unique_violation(&err) => {
                tracing::warn!(
                    attempt,
                    hash = %record.content_hash.short(),
                    version_no,
                    "version already taken, retrying"
                );
            }
            Err(err) => return Err(err).context("failed to insert analysis record"),
        }
    }

    Err(AnalysisError::ConcurrencyConflict(format!(
        "no free version for {} after {MAX_INSERT_ATTEMPTS} attempts",
        record.content_hash.short()
    ))
    .into())
}

/// Blank the version-1 record of `base`'s hash, or create it.
pub fn reset_slate(conn: &mut Connection, base: &AnalysisRecord) -> Result<(AnalysisRecord, bool)> {
    let cleared = encode_result(None)?;
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .context("failed to open reset transaction")?;

    let existing: Option<i64> = tx
        .query_row(
            "SELECT id FROM analysis_records WHERE content_hash = ?1 AND version_no = 1",
            params![base.content_hash.as_str()],
            |row| row.get(0),
        )
        .optional()
        .context("failed to look up version 1")?;

    let (id, created) = match existing {
        Some(id) => {
            tx.execute(
                "UPDATE analysis_records SET user_text = '', matching_rate = 0, result_json = ?2
                 WHERE id = ?1",
                params![id, cleared],
            )
            .context("failed to blank version 1")?;
            (id, false)
        }
        None => {
            let slate = NewRecord::reset_slate_of(base, Utc::now());
            let id = insert_row(&tx, &slate, 1, &cleared, None)
                .context("failed to create version 1")?;
            (id, true)
        }
    };

    tx.commit().context("failed to commit reset")?;
    Ok((get_existing(conn, id)?, created))
}

pub fn toggle_important(conn: &Connection, id: i64) -> Result<Option<bool>> {
    let changed = conn
        .execute(
            "UPDATE analysis_records SET is_important = NOT is_important WHERE id = ?1",
            params![id],
        )
        .context("failed to toggle importance")?;
    if changed == 0 {
        return Ok(None);
    }
    let flag: bool = conn.query_row(
        "SELECT is_important FROM analysis_records WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    Ok(Some(flag))
}

pub fn set_hidden(
    conn: &Connection,
    id: i64,
    hidden_at: Option<DateTime<Utc>>,
) -> Result<Option<AnalysisRecord>> {
    let changed = conn
        .execute(
            "UPDATE analysis_records SET is_hidden = ?2, hidden_at = ?3 WHERE id = ?1",
            params![id, hidden_at.is_some(), hidden_at.as_ref().map(format_datetime)],
        )
        .context("failed to update visibility")?;
    if changed == 0 {
        return Ok(None);
    }
    get(conn, id)
}

pub fn list_latest_per_group(
    conn: &Connection,
    query: &LatestQuery,
    page: PageRequest,
) -> Result<Page<AnalysisRecord>> {
    let (subject_pattern, owner_pattern) = match &query.search {
        Some(filter) => match filter.kind {
            SearchKind::Subject => (Some(like_pattern(&filter.keyword)), None),
            SearchKind::Owner => (None, Some(like_pattern(&filter.keyword))),
        },
        None => (None, None),
    };

    let total = count(
        conn,
        &format!("SELECT COUNT(*) FROM ({LATEST_GROUP_IDS})"),
        params![query.owner_id, subject_pattern, owner_pattern],
    )?;
    let items = query_records(
        conn,
        &format!(
            "SELECT {RECORD_COLUMNS} FROM analysis_records
             WHERE id IN ({LATEST_GROUP_IDS})
             ORDER BY created_at DESC, id DESC
             LIMIT ?4 OFFSET ?5"
        ),
        params![
            query.owner_id,
            subject_pattern,
            owner_pattern,
            to_i64(page.limit())?,
            to_i64(page.offset())?
        ],
    )?;
    Ok(Page::new(items, page, total))
}

pub fn list_by_owner(
    conn: &Connection,
    owner_id: i64,
    hidden: bool,
    page: PageRequest,
) -> Result<Page<AnalysisRecord>> {
    let filter = "owner_id = ?1 AND COALESCE(is_hidden, 0) = ?2";
    let total = count(
        conn,
        &format!("SELECT COUNT(*) FROM analysis_records WHERE {filter}"),
        params![owner_id, hidden],
    )?;
    let items = query_records(
        conn,
        &format!(
            "SELECT {RECORD_COLUMNS} FROM analysis_records WHERE {filter}
             ORDER BY created_at DESC, id DESC LIMIT ?3 OFFSET ?4"
        ),
        params![owner_id, hidden, to_i64(page.limit())?, to_i64(page.offset())?],
    )?;
    Ok(Page::new(items, page, total))
}

pub fn count_hidden(conn: &Connection, owner_id: i64) -> Result<u64> {
    count(
        conn,
        "SELECT COUNT(*) FROM analysis_records WHERE owner_id = ?1 AND is_hidden = 1",
        params![owner_id],
    )
}

pub fn list_related(
    conn: &Connection,
    hash: &ContentHash,
    exclude_id: i64,
    page: PageRequest,
) -> Result<Page<AnalysisRecord>> {
    let total = count(
        conn,
        "SELECT COUNT(*) FROM analysis_records WHERE content_hash = ?1 AND id != ?2",
        params![hash.as_str(), exclude_id],
    )?;
    let items = query_records(
        conn,
        &format!(
            "SELECT {RECORD_COLUMNS} FROM analysis_records
             WHERE content_hash = ?1 AND id != ?2
             ORDER BY version_no ASC, id ASC LIMIT ?3 OFFSET ?4"
        ),
        params![
            hash.as_str(),
            exclude_id,
            to_i64(page.limit())?,
            to_i64(page.offset())?
        ],
    )?;
    Ok(Page::new(items, page, total))
}

pub fn list_trend(conn: &Connection, owner_id: i64, hash: &ContentHash) -> Result<Vec<AnalysisRecord>> {
    query_records(
        conn,
        &format!(
            "SELECT {RECORD_COLUMNS} FROM analysis_records
             WHERE owner_id = ?1 AND content_hash = ?2
             ORDER BY version_no ASC, id ASC"
        ),
        params![owner_id, hash.as_str()],
    )
}

/// `None` when the record is missing or has no attachment.
pub fn attachment_bytes(conn: &Connection, id: i64) -> Result<Option<Vec<u8>>> {
    let bytes: Option<Option<Vec<u8>>> = conn
        .query_row(
            "SELECT attachment_bytes FROM analysis_records WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()
        .with_context(|| format!("failed to read attachment of record {id}"))?;
    Ok(bytes.flatten())
}

pub fn upsert_owner(conn: &Connection, owner_id: i64, name: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO owners (id, name) VALUES (?1, ?2)
         ON CONFLICT(id) DO UPDATE SET name = excluded.name",
        params![owner_id, name],
    )
    .with_context(|| format!("failed to save owner {owner_id}"))?;
    Ok(())
}
