//! Core data model types for restate.
//!
//! Records, submissions, paging and the outcome types returned by
//! [`AnalysisService`](crate::service::AnalysisService).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hashing::ContentHash;
use crate::traits::MatchResult;

/// Days between hiding a record and its displayed deletion date.
pub const HIDDEN_RETENTION_DAYS: i64 = 30;

/// Who is calling. Anonymous callers get scores but nothing is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub owner_id: Option<i64>,
    /// Display name, kept so listings can be searched by owner.
    pub display_name: Option<String>,
}

impl Caller {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn owner(owner_id: i64, display_name: Option<String>) -> Self {
        Self {
            owner_id: Some(owner_id),
            display_name,
        }
    }
}

/// A source file uploaded alongside the typed original text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Attachment details carried on every record; the raw bytes are fetched
/// separately through [`RecordStore::attachment_bytes`](crate::traits::RecordStore::attachment_bytes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentMeta {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub size: u64,
}

impl From<&Attachment> for AttachmentMeta {
    fn from(attachment: &Attachment) -> Self {
        Self {
            file_name: attachment.file_name.clone(),
            content_type: attachment.content_type.clone(),
            size: attachment.bytes.len() as u64,
        }
    }
}

/// A request to score a restatement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Submission {
    /// Typed original text; may be empty when an attachment carries it.
    #[serde(default)]
    pub original_text: Option<String>,
    /// The user's restatement.
    pub user_text: String,
    #[serde(default)]
    pub attachment: Option<Attachment>,
}

/// One scored attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: i64,
    pub owner_id: Option<i64>,
    pub original_text: String,
    pub user_text: String,
    pub content_hash: ContentHash,
    pub version_no: u32,
    pub matching_rate: f64,
    /// Full score detail; `None` for a reset slate.
    pub result: Option<MatchResult>,
    pub subject: String,
    pub is_important: bool,
    pub is_hidden: bool,
    pub hidden_at: Option<DateTime<Utc>>,
    pub attachment: Option<AttachmentMeta>,
    pub created_at: DateTime<Utc>,
}

impl AnalysisRecord {
    /// Date shown as the purge date of a hidden record. Nothing is purged here.
    pub fn scheduled_deletion(&self) -> Option<DateTime<Utc>> {
        self.hidden_at
            .map(|at| at + Duration::days(HIDDEN_RETENTION_DAYS))
    }

    pub fn summary(&self, note_count: u64) -> RecordSummary {
        RecordSummary {
            id: self.id,
            created_at: self.created_at,
            matching_rate: self.matching_rate,
            subject: self.subject.clone(),
            user_text: self.user_text.clone(),
            version_no: self.version_no,
            is_important: self.is_important,
            hidden_at: self.hidden_at,
            scheduled_deletion: self.scheduled_deletion(),
            note_count,
        }
    }
}

/// A record as handed to a store for insertion; the store assigns
/// `id` and `version_no`.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub owner_id: Option<i64>,
    pub original_text: String,
    pub user_text: String,
    pub content_hash: ContentHash,
    pub matching_rate: f64,
    pub result: Option<MatchResult>,
    pub subject: String,
    /// Uploaded source file, stored with its bytes.
    pub attachment: Option<Attachment>,
    pub created_at: DateTime<Utc>,
}

impl NewRecord {
    pub fn into_record(self, id: i64, version_no: u32) -> AnalysisRecord {
        AnalysisRecord {
            id,
            owner_id: self.owner_id,
            original_text: self.original_text,
            user_text: self.user_text,
            content_hash: self.content_hash,
            version_no,
            matching_rate: self.matching_rate,
            result: self.result,
            subject: self.subject,
            is_important: false,
            is_hidden: false,
            hidden_at: None,
            attachment: self.attachment.as_ref().map(AttachmentMeta::from),
            created_at: self.created_at,
        }
    }

    /// The blank version-1 record created when resetting `base`.
    pub fn reset_slate_of(base: &AnalysisRecord, created_at: DateTime<Utc>) -> Self {
        Self {
            owner_id: base.owner_id,
            original_text: base.original_text.clone(),
            user_text: String::new(),
            content_hash: base.content_hash.clone(),
            matching_rate: 0.0,
            result: None,
            subject: base.subject.clone(),
            attachment: None,
            created_at,
        }
    }
}

/// A study note attached to a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub record_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Listing row for library views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSummary {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub matching_rate: f64,
    pub subject: String,
    pub user_text: String,
    pub version_no: u32,
    pub is_important: bool,
    pub hidden_at: Option<DateTime<Utc>>,
    pub scheduled_deletion: Option<DateTime<Utc>>,
    pub note_count: u64,
}

// ---------------------------------------------------------------------------
// Paging and queries
// ---------------------------------------------------------------------------

/// Zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    /// A zero size is bumped to one so paging always makes progress.
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: size.max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.size)
    }
}

/// One page of results plus the total across all pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_items: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        Self {
            items,
            page: request.page,
            size: request.size,
            total_items,
        }
    }

    /// Slice an already ordered, complete list.
    pub fn from_sorted(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.limit() as usize)
            .collect();
        Self::new(items, request, total)
    }

    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 0;
        }
        self.total_items.div_ceil(u64::from(self.size))
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_items: self.total_items,
        }
    }
}

/// What a latest-per-original search keyword is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Owner,
    Subject,
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchKind::Owner => write!(f, "owner"),
            SearchKind::Subject => write!(f, "subject"),
        }
    }
}

impl FromStr for SearchKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "owner" | "user" => Ok(SearchKind::Owner),
            "subject" => Ok(SearchKind::Subject),
            other => Err(format!("unknown search type: {other}")),
        }
    }
}

/// Substring filter applied before de-duplication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    pub kind: SearchKind,
    pub keyword: String,
}

/// Parameters of the latest-per-original listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LatestQuery {
    pub owner_id: Option<i64>,
    pub search: Option<SearchFilter>,
}

impl LatestQuery {
    /// A blank keyword or a missing kind disables the filter.
    pub fn new(owner_id: Option<i64>, keyword: Option<&str>, kind: Option<SearchKind>) -> Self {
        let search = match (kind, keyword.map(str::trim)) {
            (Some(kind), Some(keyword)) if !keyword.is_empty() => Some(SearchFilter {
                kind,
                keyword: keyword.to_string(),
            }),
            _ => None,
        };
        Self { owner_id, search }
    }
}

// ---------------------------------------------------------------------------
// Operation outcomes
// ---------------------------------------------------------------------------

/// Result of a submission. `record_id` is `None` for anonymous callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitOutcome {
    pub record_id: Option<i64>,
    pub version_no: Option<u32>,
    pub content_hash: ContentHash,
    pub result: MatchResult,
    pub subject: String,
    pub original_text: String,
    pub created_at: DateTime<Utc>,
}

/// How a reset request was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetStatus {
    /// The record is a version-0 first attempt and was left untouched.
    NotApplicable,
    /// An existing version-1 record was blanked for a new attempt.
    Reopened,
    /// No version-1 record existed, so one was created.
    Created,
}

impl ResetStatus {
    pub fn message(&self) -> &'static str {
        match self {
            ResetStatus::NotApplicable => "version 0 records cannot be reset",
            ResetStatus::Reopened => "reset complete",
            ResetStatus::Created => "reset complete",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetOutcome {
    pub record: AnalysisRecord,
    pub status: ResetStatus,
}

impl ResetOutcome {
    pub fn new_record_id(&self) -> i64 {
        self.record.id
    }

    pub fn version_no(&self) -> u32 {
        self.record.version_no
    }

    pub fn message(&self) -> &'static str {
        self.status.message()
    }
}
