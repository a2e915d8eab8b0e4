//! Analysis service: scoring, versioned persistence and the record lifecycle.
//!
//! Every operation takes its caller or ids explicitly; nothing here reads
//! ambient "current user" state.

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AnalysisError, Result};
use crate::hashing::ContentHash;
use crate::model::{
    AnalysisRecord, Caller, LatestQuery, NewRecord, Note, Page, PageRequest,
    RecordSummary, ResetOutcome, ResetStatus, Submission, SubmitOutcome,
};
use crate::text::{combine_original, derive_subject, extract_text};
use crate::traits::{MatchEngine, RecordStore};

/// The single entry point used by outer layers (CLI, HTTP, tests).
pub struct AnalysisService {
    engine: Arc<dyn MatchEngine>,
    store: Arc<dyn RecordStore>,
}

impl AnalysisService {
    pub fn new(engine: Arc<dyn MatchEngine>, store: Arc<dyn RecordStore>) -> Self {
        Self { engine, store }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    // -----------------------------------------------------------------------
    // Scoring and versioning
    // -----------------------------------------------------------------------

    /// Version the next submission of `hash` would receive.
    pub async fn next_version(&self, hash: &ContentHash) -> Result<u32> {
        Ok(self.store.max_version(hash).await?.map_or(0, |v| v + 1))
    }

    /// Score a restatement and, for identified callers, persist it.
    #[instrument(skip_all, fields(owner = ?caller.owner_id, engine = self.engine.name()))]
    pub async fn submit(&self, caller: &Caller, submission: Submission) -> Result<SubmitOutcome> {
        if submission.user_text.trim().is_empty() {
            return Err(AnalysisError::InvalidInput(
                "user text must not be blank".to_string(),
            ));
        }

        let extracted = submission
            .attachment
            .as_ref()
            .map(|a| extract_text(&a.bytes));
        let original = combine_original(submission.original_text.as_deref(), extracted.as_deref());
        if original.is_empty() {
            return Err(AnalysisError::InvalidInput(
                "original text or an attached file is required".to_string(),
            ));
        }

        let result = self
            .engine
            .analyze(&original, &submission.user_text)
            .await
            .map_err(|e| {
                tracing::warn!("scoring failed: {e}");
                AnalysisError::ScoringUnavailable(e)
            })?;

        let content_hash = ContentHash::of(&original);
        let subject = derive_subject(submission.original_text.as_deref().unwrap_or_default());
        let created_at = Utc::now();

        let Some(owner_id) = caller.owner_id else {
            tracing::debug!("anonymous submission, not persisted");
            return Ok(SubmitOutcome {
                record_id: None,
                version_no: None,
                content_hash,
                result,
                subject,
                original_text: original,
                created_at,
            });
        };

        if let Some(name) = caller.display_name.as_deref().filter(|n| !n.trim().is_empty()) {
            self.store.upsert_owner(owner_id, name).await?;
        }

        let record = self
            .store
            .insert_versioned(NewRecord {
                owner_id: Some(owner_id),
                original_text: original,
                user_text: submission.user_text,
                content_hash,
                matching_rate: result.matching_rate,
                result: Some(result.clone()),
                subject,
                attachment: submission.attachment,
                created_at,
            })
            .await?;

        tracing::info!(
            record_id = record.id,
            version_no = record.version_no,
            rate = record.matching_rate,
            "analysis saved"
        );

        Ok(SubmitOutcome {
            record_id: Some(record.id),
            version_no: Some(record.version_no),
            content_hash: record.content_hash,
            result,
            subject: record.subject,
            original_text: record.original_text,
            created_at: record.created_at,
        })
    }

    pub async fn get_record(&self, id: i64) -> Result<AnalysisRecord> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| AnalysisError::not_found_record(id))
    }

    /// Bytes of the source file uploaded with a record; `None` if nothing was attached.
    pub async fn attachment_bytes(&self, id: i64) -> Result<Option<Vec<u8>>> {
        self.get_record(id).await?;
        self.store.attachment_bytes(id).await
    }

    /// Re-open an original text for a fresh attempt.
    ///
    /// Version-0 records are never reset. Anything else resolves to the
    /// version-1 record of the same hash, re-opened or created.
    #[instrument(skip(self))]
    pub async fn reset_understanding(&self, id: i64) -> Result<ResetOutcome> {
        let base = self.get_record(id).await?;
        if base.version_no == 0 {
            tracing::info!("version 0 record, reset not applicable");
            return Ok(ResetOutcome {
                record: base,
                status: ResetStatus::NotApplicable,
            });
        }

        let (slate, created) = self.store.reset_slate(&base).await?;
        let status = if created {
            ResetStatus::Created
        } else {
            ResetStatus::Reopened
        };
        tracing::info!(slate_id = slate.id, ?status, "reset complete");
        Ok(ResetOutcome {
            record: slate,
            status,
        })
    }

    /// Latest attempt of every `(owner, original)` group, newest first.
    pub async fn list_latest_per_original(
        &self,
        query: &LatestQuery,
        page: PageRequest,
    ) -> Result<Page<AnalysisRecord>> {
        self.store.list_latest_per_group(query, page).await
    }

    /// A user's attempts at one original text, oldest version first.
    pub async fn list_trend(
        &self,
        owner_id: i64,
        hash: &ContentHash,
    ) -> Result<Vec<AnalysisRecord>> {
        self.store.list_trend(owner_id, hash).await
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn toggle_important(&self, id: i64) -> Result<bool> {
        self.store
            .toggle_important(id)
            .await?
            .ok_or_else(|| AnalysisError::not_found_record(id))
    }

    /// Hide a record. Hiding again restarts the retention countdown.
    #[instrument(skip(self))]
    pub async fn hide(&self, id: i64) -> Result<AnalysisRecord> {
        self.store
            .set_hidden(id, Some(Utc::now()))
            .await?
            .ok_or_else(|| AnalysisError::not_found_record(id))
    }

    #[instrument(skip(self))]
    pub async fn restore(&self, id: i64) -> Result<AnalysisRecord> {
        self.store
            .set_hidden(id, None)
            .await?
            .ok_or_else(|| AnalysisError::not_found_record(id))
    }

    pub async fn list_visible(
        &self,
        owner_id: i64,
        page: PageRequest,
    ) -> Result<Page<RecordSummary>> {
        let records = self.store.list_by_owner(owner_id, false, page).await?;
        self.summarize(records).await
    }

    pub async fn list_hidden(
        &self,
        owner_id: i64,
        page: PageRequest,
    ) -> Result<Page<RecordSummary>> {
        let records = self.store.list_by_owner(owner_id, true, page).await?;
        self.summarize(records).await
    }

    pub async fn count_hidden(&self, owner_id: i64) -> Result<u64> {
        self.store.count_hidden(owner_id).await
    }

    /// Other versions of the same original text, by ascending version.
    pub async fn list_related(&self, id: i64, page: PageRequest) -> Result<Page<AnalysisRecord>> {
        let base = self.get_record(id).await?;
        self.store
            .list_related(&base.content_hash, base.id, page)
            .await
    }

    async fn summarize(&self, records: Page<AnalysisRecord>) -> Result<Page<RecordSummary>> {
        let ids: Vec<i64> = records.items.iter().map(|r| r.id).collect();
        let counts = self.store.note_counts(&ids).await?;
        Ok(records.map(|r| {
            let count = counts.get(&r.id).copied().unwrap_or(0);
            r.summary(count)
        }))
    }

    // -----------------------------------------------------------------------
    // Notes
    // -----------------------------------------------------------------------

    pub async fn add_note(&self, record_id: i64, content: &str) -> Result<Note> {
        if content.trim().is_empty() {
            return Err(AnalysisError::InvalidInput(
                "note content must not be blank".to_string(),
            ));
        }
        let note = Note {
            id: Uuid::new_v4(),
            record_id,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        self.store.insert_note(&note).await?;
        Ok(note)
    }

    pub async fn list_notes(&self, record_id: i64) -> Result<Vec<Note>> {
        self.get_record(record_id).await?;
        self.store.list_notes(record_id).await
    }

    pub async fn delete_note(&self, note_id: Uuid) -> Result<()> {
        if self.store.delete_note(note_id).await? {
            Ok(())
        } else {
            Err(AnalysisError::NotFound(format!("note {note_id}")))
        }
    }
}
