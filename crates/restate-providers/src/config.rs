//! Configuration loading and engine factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use restate_core::overlap::OverlapEngine;
use restate_core::traits::MatchEngine;

use crate::remote::{RemoteEngine, DEFAULT_TIMEOUT_SECS, DEFAULT_URL};

/// Which match engine scores submissions. Exactly one is active per process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ScorerConfig {
    /// Local word-overlap scoring.
    #[default]
    Overlap,
    /// Remote semantic-similarity service.
    Remote {
        #[serde(default = "default_scorer_url")]
        url: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

fn default_scorer_url() -> String {
    DEFAULT_URL.to_string()
}
fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Top-level restate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestateConfig {
    /// SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default)]
    pub scorer: ScorerConfig,
    /// Page size for listings when none is given.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    /// Page size for the related-versions listing.
    #[serde(default = "default_related_page_size")]
    pub related_page_size: u32,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./restate.db")
}
fn default_page_size() -> u32 {
    10
}
fn default_related_page_size() -> u32 {
    3
}

impl Default for RestateConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            scorer: ScorerConfig::default(),
            default_page_size: default_page_size(),
            related_page_size: default_related_page_size(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
/// Unset variables expand to nothing. Substituted values are not expanded again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_scorer_config(config: &ScorerConfig) -> ScorerConfig {
    match config {
        ScorerConfig::Overlap => ScorerConfig::Overlap,
        ScorerConfig::Remote { url, timeout_secs } => ScorerConfig::Remote {
            url: resolve_env_vars(url),
            timeout_secs: *timeout_secs,
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `restate.toml` in the current directory
/// 2. `~/.config/restate/config.toml`
///
/// Environment variable overrides: `RESTATE_DB`, `RESTATE_SCORER_URL`.
pub fn load_config() -> Result<RestateConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<RestateConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("restate.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let parsed = toml::from_str::<RestateConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            parsed
        }
        None => RestateConfig::default(),
    };

    Ok(apply_env_overrides(config, |key| std::env::var(key).ok()))
}

/// Apply `RESTATE_*` overrides, then expand `${VAR}` references.
fn apply_env_overrides(
    mut config: RestateConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> RestateConfig {
    if let Some(db) = lookup("RESTATE_DB").filter(|v| !v.is_empty()) {
        config.database_path = PathBuf::from(db);
    }

    if let Some(override_url) = lookup("RESTATE_SCORER_URL").filter(|v| !v.is_empty()) {
        config.scorer = match config.scorer {
            ScorerConfig::Remote { timeout_secs, .. } => ScorerConfig::Remote {
                url: override_url,
                timeout_secs,
            },
            ScorerConfig::Overlap => ScorerConfig::Remote {
                url: override_url,
                timeout_secs: default_timeout_secs(),
            },
        };
    }

    config.scorer = resolve_scorer_config(&config.scorer);
    config.database_path = PathBuf::from(resolve_env_vars(&config.database_path.to_string_lossy()));
    config
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("restate"))
}

/// Create the match engine described by `config`.
pub fn create_engine(config: &ScorerConfig) -> Result<Arc<dyn MatchEngine>> {
    match config {
        ScorerConfig::Overlap => Ok(Arc::new(OverlapEngine::new())),
        ScorerConfig::Remote { url, timeout_secs } => {
            let engine = RemoteEngine::new(url, *timeout_secs)
                .with_context(|| format!("failed to create remote engine for {url}"))?;
            Ok(Arc::new(engine))
        }
    }
}

/// Starter configuration written by `restate init`.
pub fn starter_config() -> &'static str {
    r#"# restate configuration

database_path = "./restate.db"
default_page_size = 10
related_page_size = 3

# Local word-overlap scoring (no network).
[scorer]
type = "overlap"

# Remote semantic scoring instead:
# [scorer]
# type = "remote"
# url = "http://localhost:8046/analyze"
# timeout_secs = 30
"#
}
