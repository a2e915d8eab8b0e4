//! Core trait definitions for match engines and record stores.
//!
//! `MatchEngine` is implemented locally by [`OverlapEngine`](crate::overlap::OverlapEngine)
//! and remotely by `restate-providers`; `RecordStore` is implemented in memory by
//! [`MemoryStore`](crate::memory::MemoryStore) and on SQLite by `restate-store`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, ScoringError};
use crate::hashing::ContentHash;
use crate::model::{AnalysisRecord, LatestQuery, NewRecord, Note, Page, PageRequest};

// ---------------------------------------------------------------------------
// Match engine trait
// ---------------------------------------------------------------------------

/// Scores how closely a restatement matches an original text.
#[async_trait]
pub trait MatchEngine: Send + Sync {
    /// Short engine name (e.g. "overlap").
    fn name(&self) -> &str;

    /// Compare `user` against `original`.
    async fn analyze(
        &self,
        original: &str,
        user: &str,
    ) -> std::result::Result<MatchResult, ScoringError>;
}

/// Outcome of a single comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    /// Similarity in [0, 100], rounded to two decimals.
    pub matching_rate: f64,
    /// Distinct words in the original (character count for remote scoring).
    pub total_original_words: usize,
    /// Distinct words in the restatement (character count for remote scoring).
    pub total_user_words: usize,
    /// Words present in both.
    pub matched_words: usize,
    /// Up to ten shared words.
    #[serde(default)]
    pub keyword_matches: Vec<String>,
    /// Up to ten original words the restatement missed.
    #[serde(default)]
    pub missed_keywords: Vec<String>,
    /// Up to ten restatement words absent from the original.
    #[serde(default)]
    pub extra_keywords: Vec<String>,
    /// Character count of the original.
    pub original_length: usize,
    /// Character count of the restatement.
    pub user_length: usize,
}

// ---------------------------------------------------------------------------
// Record store trait
// ---------------------------------------------------------------------------

/// Persistence for analysis records, owners and notes.
///
/// Methods that assign version numbers or pick a reset slate must do so
/// atomically: two concurrent callers never observe the same "next" version.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist `record` with `version_no = max(version for its hash) + 1`, or 0.
    async fn insert_versioned(&self, record: NewRecord) -> Result<AnalysisRecord>;

    async fn get(&self, id: i64) -> Result<Option<AnalysisRecord>>;

    async fn max_version(&self, hash: &ContentHash) -> Result<Option<u32>>;

    async fn find_by_hash_and_version(
        &self,
        hash: &ContentHash,
        version_no: u32,
    ) -> Result<Option<AnalysisRecord>>;

    /// Re-open the version-1 record of `base`'s hash, creating it when absent.
    ///
    /// Returns the slate and whether it was newly created.
    async fn reset_slate(&self, base: &AnalysisRecord) -> Result<(AnalysisRecord, bool)>;

    /// Flip the importance flag. `None` when the record does not exist.
    async fn toggle_important(&self, id: i64) -> Result<Option<bool>>;

    /// `Some(ts)` hides the record stamped with `ts`; `None` restores it.
    async fn set_hidden(
        &self,
        id: i64,
        hidden_at: Option<DateTime<Utc>>,
    ) -> Result<Option<AnalysisRecord>>;

    /// One record per `(owner, hash)` group, the one with the greatest id,
    /// de-duplicated before paging and ordered newest first.
    async fn list_latest_per_group(
        &self,
        query: &LatestQuery,
        page: PageRequest,
    ) -> Result<Page<AnalysisRecord>>;

    /// Records of `owner_id` with the given hidden flag, newest first.
    async fn list_by_owner(
        &self,
        owner_id: i64,
        hidden: bool,
        page: PageRequest,
    ) -> Result<Page<AnalysisRecord>>;

    async fn count_hidden(&self, owner_id: i64) -> Result<u64>;

    /// Records sharing `hash` other than `exclude_id`, by ascending version.
    async fn list_related(
        &self,
        hash: &ContentHash,
        exclude_id: i64,
        page: PageRequest,
    ) -> Result<Page<AnalysisRecord>>;

    /// Every record of `owner_id` for `hash`, by ascending version.
    async fn list_trend(&self, owner_id: i64, hash: &ContentHash) -> Result<Vec<AnalysisRecord>>;

    /// Raw bytes of the file uploaded with record `id`, if any.
    async fn attachment_bytes(&self, id: i64) -> Result<Option<Vec<u8>>>;

    async fn upsert_owner(&self, owner_id: i64, name: &str) -> Result<()>;

    /// Fails with `NotFound` when the note's record does not exist.
    async fn insert_note(&self, note: &Note) -> Result<()>;

    /// Notes for a record, newest first.
    async fn list_notes(&self, record_id: i64) -> Result<Vec<Note>>;

    /// Returns `false` when no such note existed.
    async fn delete_note(&self, note_id: Uuid) -> Result<bool>;

    async fn note_counts(&self, record_ids: &[i64]) -> Result<HashMap<i64, u64>>;
}
