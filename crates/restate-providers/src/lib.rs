//! restate-providers — Match engine integrations.
//!
//! Implements the `MatchEngine` trait for a remote semantic-similarity
//! service, provides a mock engine for tests, and loads the configuration
//! that decides which engine is active.

pub mod config;
pub mod mock;
pub mod remote;

pub use config::{create_engine, load_config, load_config_from, RestateConfig, ScorerConfig};
pub use mock::MockEngine;
pub use remote::RemoteEngine;
