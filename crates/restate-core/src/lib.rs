//! restate-core — Scoring, content versioning and record lifecycle.
//!
//! This crate defines the data model, the [`MatchEngine`](traits::MatchEngine)
//! and [`RecordStore`](traits::RecordStore) seams, the local overlap scorer and
//! the [`AnalysisService`](service::AnalysisService) that ties them together.

pub mod error;
pub mod hashing;
pub mod memory;
pub mod model;
pub mod overlap;
pub mod schema;
pub mod service;
pub mod text;
pub mod tokenizer;
pub mod traits;
