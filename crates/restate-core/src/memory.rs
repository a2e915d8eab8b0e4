//! In-memory record store for tests and throwaway sessions.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{AnalysisError, Result};
use crate::hashing::ContentHash;
use crate::model::{AnalysisRecord, LatestQuery, NewRecord, Note, Page, PageRequest, SearchKind};
use crate::traits::RecordStore;

#[derive(Default)]
struct MemoryState {
    last_id: i64,
    records: BTreeMap<i64, AnalysisRecord>,
    owners: HashMap<i64, String>,
    attachments: HashMap<i64, Vec<u8>>,
    notes: Vec<Note>,
}

impl MemoryState {
    fn max_version(&self, hash: &ContentHash) -> Option<u32> {
        self.records
            .values()
            .filter(|r| &r.content_hash == hash)
            .map(|r| r.version_no)
            .max()
    }

    fn insert(&mut self, record: NewRecord, version_no: u32) -> AnalysisRecord {
        self.last_id += 1;
        if let Some(attachment) = &record.attachment {
            self.attachments.insert(self.last_id, attachment.bytes.clone());
        }
        let stored = record.into_record(self.last_id, version_no);
        self.records.insert(stored.id, stored.clone());
        stored
    }
}

/// A [`RecordStore`] kept behind a single mutex, so every version assignment
/// is serialized.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| AnalysisError::Storage("memory store mutex poisoned".to_string()))
    }

    /// Insert a record with an explicit version, bypassing assignment.
    #[cfg(test)]
    pub(crate) fn seed(&self, record: NewRecord, version_no: u32) -> AnalysisRecord {
        self.lock().unwrap().insert(record, version_no)
    }
}

fn newest_first(a: &AnalysisRecord, b: &AnalysisRecord) -> std::cmp::Ordering {
    b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_versioned(&self, record: NewRecord) -> Result<AnalysisRecord> {
        let mut state = self.lock()?;
        let version_no = state
            .max_version(&record.content_hash)
            .map_or(0, |v| v + 1);
        tracing::debug!(hash = %record.content_hash.short(), version_no, "assigned version");
        Ok(state.insert(record, version_no))
    }

    async fn get(&self, id: i64) -> Result<Option<AnalysisRecord>> {
        Ok(self.lock()?.records.get(&id).cloned())
    }

    async fn max_version(&self, hash: &ContentHash) -> Result<Option<u32>> {
        Ok(self.lock()?.max_version(hash))
    }

    async fn find_by_hash_and_version(
        &self,
        hash: &ContentHash,
        version_no: u32,
    ) -> Result<Option<AnalysisRecord>> {
        Ok(self
            .lock()?
            .records
            .values()
            .find(|r| &r.content_hash == hash && r.version_no == version_no)
            .cloned())
    }

    async fn reset_slate(&self, base: &AnalysisRecord) -> Result<(AnalysisRecord, bool)> {
        let mut state = self.lock()?;
        let existing = state
            .records
            .values_mut()
            .find(|r| r.content_hash == base.content_hash && r.version_no == 1);
        if let Some(slate) = existing {
            slate.user_text.clear();
            slate.result = None;
            slate.matching_rate = 0.0;
            return Ok((slate.clone(), false));
        }
        let created = state.insert(NewRecord::reset_slate_of(base, Utc::now()), 1);
        Ok((created, true))
    }

    async fn toggle_important(&self, id: i64) -> Result<Option<bool>> {
        let mut state = self.lock()?;
        Ok(state.records.get_mut(&id).map(|r| {
            r.is_important = !r.is_important;
            r.is_important
        }))
    }

    async fn set_hidden(
        &self,
        id: i64,
        hidden_at: Option<DateTime<Utc>>,
    ) -> Result<Option<AnalysisRecord>> {
        let mut state = self.lock()?;
        Ok(state.records.get_mut(&id).map(|r| {
            r.is_hidden = hidden_at.is_some();
            r.hidden_at = hidden_at;
            r.clone()
        }))
    }

    async fn list_latest_per_group(
        &self,
        query: &LatestQuery,
        page: PageRequest,
    ) -> Result<Page<AnalysisRecord>> {
        let state = self.lock()?;
        let mut latest: HashMap<(Option<i64>, &ContentHash), &AnalysisRecord> = HashMap::new();

        for record in state.records.values() {
            if query.owner_id.is_some() && record.owner_id != query.owner_id {
                continue;
            }
            if let Some(filter) = &query.search {
                let matched = match filter.kind {
                    SearchKind::Subject => contains_ci(&record.subject, &filter.keyword),
                    SearchKind::Owner => record
                        .owner_id
                        .and_then(|id| state.owners.get(&id))
                        .is_some_and(|name| contains_ci(name, &filter.keyword)),
                };
                if !matched {
                    continue;
                }
            }
            latest
                .entry((record.owner_id, &record.content_hash))
                .and_modify(|current| {
                    if record.id > current.id {
                        *current = record;
                    }
                })
                .or_insert(record);
        }

        let mut rows: Vec<AnalysisRecord> = latest.into_values().cloned().collect();
        rows.sort_by(newest_first);
        Ok(Page::from_sorted(rows, page))
    }

    async fn list_by_owner(
        &self,
        owner_id: i64,
        hidden: bool,
        page: PageRequest,
    ) -> Result<Page<AnalysisRecord>> {
        let state = self.lock()?;
        let mut rows: Vec<AnalysisRecord> = state
            .records
            .values()
            .filter(|r| r.owner_id == Some(owner_id) && r.is_hidden == hidden)
            .cloned()
            .collect();
        rows.sort_by(newest_first);
        Ok(Page::from_sorted(rows, page))
    }

    async fn count_hidden(&self, owner_id: i64) -> Result<u64> {
        Ok(self
            .lock()?
            .records
            .values()
            .filter(|r| r.owner_id == Some(owner_id) && r.is_hidden)
            .count() as u64)
    }

    async fn list_related(
        &self,
        hash: &ContentHash,
        exclude_id: i64,
        page: PageRequest,
    ) -> Result<Page<AnalysisRecord>> {
        let state = self.lock()?;
        let mut rows: Vec<AnalysisRecord> = state
            .records
            .values()
            .filter(|r| &r.content_hash == hash && r.id != exclude_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.version_no, r.id));
        Ok(Page::from_sorted(rows, page))
    }

    async fn list_trend(&self, owner_id: i64, hash: &ContentHash) -> Result<Vec<AnalysisRecord>> {
        let state = self.lock()?;
        let mut rows: Vec<AnalysisRecord> = state
            .records
            .values()
            .filter(|r| r.owner_id == Some(owner_id) && &r.content_hash == hash)
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.version_no, r.id));
        Ok(rows)
    }

    async fn attachment_bytes(&self, id: i64) -> Result<Option<Vec<u8>>> {
        Ok(self.lock()?.attachments.get(&id).cloned())
    }

    async fn upsert_owner(&self, owner_id: i64, name: &str) -> Result<()> {
        self.lock()?.owners.insert(owner_id, name.to_string());
        Ok(())
    }

    async fn insert_note(&self, note: &Note) -> Result<()> {
        let mut state = self.lock()?;
        if !state.records.contains_key(&note.record_id) {
            return Err(AnalysisError::not_found_record(note.record_id));
        }
        state.notes.push(note.clone());
        Ok(())
    }

    async fn list_notes(&self, record_id: i64) -> Result<Vec<Note>> {
        let state = self.lock()?;
        let mut notes: Vec<Note> = state
            .notes
            .iter()
            .filter(|n| n.record_id == record_id)
            .cloned()
            .collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notes)
    }

    async fn delete_note(&self, note_id: Uuid) -> Result<bool> {
        let mut state = self.lock()?;
        let before = state.notes.len();
        state.notes.retain(|n| n.id != note_id);
        Ok(state.notes.len() != before)
    }

    async fn note_counts(&self, record_ids: &[i64]) -> Result<HashMap<i64, u64>> {
        let state = self.lock()?;
        let mut counts: HashMap<i64, u64> = record_ids.iter().map(|id| (*id, 0)).collect();
        for note in &state.notes {
            if let Some(count) = counts.get_mut(&note.record_id) {
                *count += 1;
            }
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_record(owner: i64, original: &str, subject: &str) -> NewRecord {
        NewRecord {
            owner_id: Some(owner),
            original_text: original.to_string(),
            user_text: "attempt".to_string(),
            content_hash: ContentHash::of(original),
            matching_rate: 10.0,
            result: None,
            subject: subject.to_string(),
            attachment: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn versions_count_up_per_hash() {
        let store = MemoryStore::new();
        let a0 = store.insert_versioned(new_record(1, "A", "a")).await.unwrap();
        let a1 = store.insert_versioned(new_record(2, "A", "a")).await.unwrap();
        let b0 = store.insert_versioned(new_record(1, "B", "b")).await.unwrap();
        assert_eq!((a0.version_no, a1.version_no, b0.version_no), (0, 1, 0));
        assert_eq!(store.max_version(&ContentHash::of("A")).await.unwrap(), Some(1));
        assert_eq!(store.max_version(&ContentHash::of("C")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn latest_per_group_picks_greatest_id() {
        let store = MemoryStore::new();
        let mut last = None;
        for _ in 0..5 {
            last = Some(store.insert_versioned(new_record(1, "A", "a")).await.unwrap());
        }
        let other = store.insert_versioned(new_record(1, "B", "b")).await.unwrap();

        let page = store
            .list_latest_per_group(&LatestQuery::default(), PageRequest::new(0, 10))
            .await
            .unwrap();
        assert_eq!(page.total_items, 2);
        let ids: Vec<i64> = page.items.iter().map(|r| r.id).collect();
        assert!(ids.contains(&last.unwrap().id));
        assert!(ids.contains(&other.id));
    }

    #[tokio::test]
    async fn owner_search_uses_owner_names() {
        let store = MemoryStore::new();
        store.upsert_owner(1, "Alice").await.unwrap();
        store.upsert_owner(2, "Bob").await.unwrap();
        store.insert_versioned(new_record(1, "A", "a")).await.unwrap();
        store.insert_versioned(new_record(2, "A", "a")).await.unwrap();

        let query = LatestQuery::new(None, Some("ali"), Some(SearchKind::Owner));
        let page = store
            .list_latest_per_group(&query, PageRequest::new(0, 10))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].owner_id, Some(1));
    }

    #[tokio::test]
    async fn notes_require_existing_record() {
        let store = MemoryStore::new();
        let note = Note {
            id: Uuid::new_v4(),
            record_id: 42,
            content: "remember".into(),
            created_at: Utc::now(),
        };
        assert!(matches!(
            store.insert_note(&note).await,
            Err(AnalysisError::NotFound(_))
        ));
        assert!(!store.delete_note(note.id).await.unwrap());
    }
}
