use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use restate_core::error::Result;
use restate_core::hashing::ContentHash;
use restate_core::model::{AnalysisRecord, LatestQuery, NewRecord, Note, Page, PageRequest};
use restate_core::traits::RecordStore;

use crate::connection::SqliteStore;
use crate::{notes, records};

#[async_trait]
impl RecordStore for SqliteStore {
    async fn insert_versioned(&self, record: NewRecord) -> Result<AnalysisRecord> {
        Ok(self
            .execute(move |conn| records::insert_versioned(conn, &record))
            .await?)
    }

    async fn get(&self, id: i64) -> Result<Option<AnalysisRecord>> {
        Ok(self.execute(move |conn| records::get(conn, id)).await?)
    }

    async fn max_version(&self, hash: &ContentHash) -> Result<Option<u32>> {
        let hash = hash.clone();
        Ok(self
            .execute(move |conn| records::max_version(conn, &hash))
            .await?)
    }

    async fn find_by_hash_and_version(
        &self,
        hash: &ContentHash,
        version_no: u32,
    ) -> Result<Option<AnalysisRecord>> {
        let hash = hash.clone();
        Ok(self
            .execute(move |conn| records::find_by_hash_and_version(conn, &hash, version_no))
            .await?)
    }

    async fn reset_slate(&self, base: &AnalysisRecord) -> Result<(AnalysisRecord, bool)> {
        let base = base.clone();
        Ok(self
            .execute(move |conn| records::reset_slate(conn, &base))
            .await?)
    }

    async fn toggle_important(&self, id: i64) -> Result<Option<bool>> {
        Ok(self
            .execute(move |conn| records::toggle_important(conn, id))
            .await?)
    }

    async fn set_hidden(
        &self,
        id: i64,
        hidden_at: Option<DateTime<Utc>>,
    ) -> Result<Option<AnalysisRecord>> {
        Ok(self
            .execute(move |conn| records::set_hidden(conn, id, hidden_at))
            .await?)
    }

    async fn list_latest_per_group(
        &self,
        query: &LatestQuery,
        page: PageRequest,
    ) -> Result<Page<AnalysisRecord>> {
        let query = query.clone();
        Ok(self
            .execute(move |conn| records::list_latest_per_group(conn, &query, page))
            .await?)
    }

    async fn list_by_owner(
        &self,
        owner_id: i64,
        hidden: bool,
        page: PageRequest,
    ) -> Result<Page<AnalysisRecord>> {
        Ok(self
            .execute(move |conn| records::list_by_owner(conn, owner_id, hidden, page))
            .await?)
    }

    async fn count_hidden(&self, owner_id: i64) -> Result<u64> {
        Ok(self
            .execute(move |conn| records::count_hidden(conn, owner_id))
            .await?)
    }

    async fn list_related(
        &self,
        hash: &ContentHash,
        exclude_id: i64,
        page: PageRequest,
    ) -> Result<Page<AnalysisRecord>> {
        let hash = hash.clone();
        Ok(self
            .execute(move |conn| records::list_related(conn, &hash, exclude_id, page))
            .await?)
    }

    async fn list_trend(&self, owner_id: i64, hash: &ContentHash) -> Result<Vec<AnalysisRecord>> {
        let hash = hash.clone();
        Ok(self
            .execute(move |conn| records::list_trend(conn, owner_id, &hash))
            .await?)
    }

    async fn attachment_bytes(&self, id: i64) -> Result<Option<Vec<u8>>> {
        Ok(self
            .execute(move |conn| records::attachment_bytes(conn, id))
            .await?)
    }

    async fn upsert_owner(&self, owner_id: i64, name: &str) -> Result<()> {
        let name = name.to_string();
        Ok(self
            .execute(move |conn| records::upsert_owner(conn, owner_id, &name))
            .await?)
    }

    async fn insert_note(&self, note: &Note) -> Result<()> {
        let note = note.clone();
        Ok(self.execute(move |conn| notes::insert(conn, &note)).await?)
    }

    async fn list_notes(&self, record_id: i64) -> Result<Vec<Note>> {
        Ok(self
            .execute(move |conn| notes::list(conn, record_id))
            .await?)
    }

    async fn delete_note(&self, note_id: Uuid) -> Result<bool> {
        Ok(self
            .execute(move |conn| notes::delete(conn, note_id))
            .await?)
    }

    async fn note_counts(&self, record_ids: &[i64]) -> Result<HashMap<i64, u64>> {
        let record_ids = record_ids.to_vec();
        Ok(self
            .execute(move |conn| notes::counts(conn, &record_ids))
            .await?)
    }
}
