//! Versioned serialized form of a [`MatchResult`] as kept in storage.
//!
//! Current form: `{"schemaVersion":1,"detail":{...}}` with `detail` null for a
//! reset slate. Two legacy shapes are still read: the bare `{}` placeholder and
//! an untagged `MatchResult` object.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::traits::MatchResult;

pub const RESULT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredResult {
    schema_version: u32,
    detail: Option<MatchResult>,
}

pub fn encode_result(detail: Option<&MatchResult>) -> Result<String> {
    let stored = StoredResult {
        schema_version: RESULT_SCHEMA_VERSION,
        detail: detail.cloned(),
    };
    serde_json::to_string(&stored)
        .map_err(|e| AnalysisError::Storage(format!("failed to encode result: {e}")))
}

pub fn decode_result(raw: &str) -> Result<Option<MatchResult>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value: serde_json::Value = serde_json::from_str(trimmed)
        .map_err(|e| AnalysisError::Storage(format!("result is not valid JSON: {e}")))?;

    let Some(object) = value.as_object() else {
        return Err(AnalysisError::Storage(
            "result must be a JSON object".to_string(),
        ));
    };

    match object.get("schemaVersion") {
        Some(version) => {
            if version.as_u64() != Some(u64::from(RESULT_SCHEMA_VERSION)) {
                return Err(AnalysisError::Storage(format!(
                    "unsupported result schema version {version}"
                )));
            }
            let stored: StoredResult = serde_json::from_value(value)
                .map_err(|e| AnalysisError::Storage(format!("failed to decode result: {e}")))?;
            Ok(stored.detail)
        }
        None if object.is_empty() => Ok(None),
        None => serde_json::from_value::<MatchResult>(value)
            .map(Some)
            .map_err(|e| AnalysisError::Storage(format!("failed to decode legacy result: {e}"))),
    }
}
