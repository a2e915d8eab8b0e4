//! Remote semantic-similarity engine.
//!
//! Delegates scoring to an HTTP service that accepts
//! `{"original": ..., "user": ...}` and answers with
//! `{"matchingRate": <0..100>, "original": ..., "user": ...}`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use restate_core::error::ScoringError;
use restate_core::traits::{MatchEngine, MatchResult};

pub const DEFAULT_URL: &str = "http://localhost:8046/analyze";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Scores through a remote embedding model.
///
/// The service reports only a rate, so word counts are approximated by
/// character counts and keyword lists stay empty.
pub struct RemoteEngine {
    url: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl RemoteEngine {
    pub fn new(url: &str, timeout_secs: u64) -> Result<Self, ScoringError> {
        let url = if url.is_empty() { DEFAULT_URL } else { url };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ScoringError::NetworkError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url: url.to_string(),
            timeout_secs,
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    original: &'a str,
    user: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeResponse {
    matching_rate: f64,
}

#[async_trait]
impl MatchEngine for RemoteEngine {
    fn name(&self) -> &str {
        "remote"
    }

    #[instrument(skip(self, original, user), fields(url = %self.url))]
    async fn analyze(&self, original: &str, user: &str) -> Result<MatchResult, ScoringError> {
        let response = self
            .client
            .post(&self.url)
            .json(&AnalyzeRequest { original, user })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ScoringError::Timeout(self.timeout_secs)
                } else if e.is_connect() {
                    ScoringError::NetworkError(format!(
                        "scoring service not reachable at {}",
                        self.url
                    ))
                } else {
                    ScoringError::NetworkError(e.to_string())
                }
            })?;

        // redirects are not followed, so a 3xx lands here too
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ScoringError::ApiError {
                status,
                message: body,
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ScoringError::Timeout(self.timeout_secs)
            } else {
                ScoringError::NetworkError(e.to_string())
            }
        })?;
        let parsed: AnalyzeResponse = serde_json::from_str(&body)
            .map_err(|e| ScoringError::MalformedResponse(e.to_string()))?;
        if !parsed.matching_rate.is_finite() {
            return Err(ScoringError::MalformedResponse(format!(
                "matchingRate is not a finite number: {}",
                parsed.matching_rate
            )));
        }

        // cosine similarity can dip below zero
        let matching_rate = parsed.matching_rate.clamp(0.0, 100.0);
        tracing::debug!(matching_rate, "remote score received");

        let original_length = original.chars().count();
        let user_length = user.chars().count();
        Ok(MatchResult {
            matching_rate,
            total_original_words: original_length,
            total_user_words: user_length,
            matched_words: 0,
            keyword_matches: vec![],
            missed_keywords: vec![],
            extra_keywords: vec![],
            original_length,
            user_length,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn engine_for(server: &MockServer, timeout_secs: u64) -> RemoteEngine {
        RemoteEngine::new(&format!("{}/analyze", server.uri()), timeout_secs).unwrap()
    }

    #[tokio::test]
    async fn successful_analysis() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/analyze"))
            .and(body_json(serde_json::json!({
                "original": "원문 텍스트",
                "user": "사용자 요약"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "matchingRate": 87.25,
                "original": "원문 텍스트",
                "user": "사용자 요약"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let engine = engine_for(&server, 5);
        let result = engine.analyze("원문 텍스트", "사용자 요약").await.unwrap();
        assert_eq!(result.matching_rate, 87.25);
        assert_eq!(result.original_length, 6);
        assert_eq!(result.total_original_words, 6);
        assert_eq!(result.user_length, 6);
        assert_eq!(result.matched_words, 0);
        assert!(result.keyword_matches.is_empty());
        assert!(result.missed_keywords.is_empty());
        assert!(result.extra_keywords.is_empty());
    }

    #[tokio::test]
    async fn negative_similarity_clamps_to_zero() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"matchingRate": -12.5})),
            )
            .mount(&server)
            .await;

        let result = engine_for(&server, 5).analyze("a", "b").await.unwrap();
        assert_eq!(result.matching_rate, 0.0);
    }

    #[tokio::test]
    async fn server_error_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
            .mount(&server)
            .await;

        let err = engine_for(&server, 5).analyze("a", "b").await.unwrap_err();
        match &err {
            ScoringError::ApiError { status, message } => {
                assert_eq!(*status, 500);
                assert!(message.contains("model crashed"));
            }
            other => panic!("expected ApiError, got {other:?}"),
        }
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn redirect_with_score_body_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .respond_with(
                ResponseTemplate::new(300).set_body_json(serde_json::json!({"matchingRate": 55.0})),
            )
            .mount(&server)
            .await;

        let err = engine_for(&server, 5).analyze("a", "b").await.unwrap_err();
        assert!(matches!(err, ScoringError::ApiError { status: 300, .. }));
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"score": 1})))
            .mount(&server)
            .await;

        let err = engine_for(&server, 5).analyze("a", "b").await.unwrap_err();
        assert!(matches!(err, ScoringError::MalformedResponse(_)));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn slow_service_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"matchingRate": 50.0}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let err = engine_for(&server, 1).analyze("a", "b").await.unwrap_err();
        assert!(matches!(err, ScoringError::Timeout(1)));
    }

    #[tokio::test]
    async fn unreachable_service_is_network_error() {
        // nothing listens on port 9 (discard) in the test environment
        let engine = RemoteEngine::new("http://127.0.0.1:9/analyze", 2).unwrap();
        let err = engine.analyze("a", "b").await.unwrap_err();
        assert!(matches!(
            err,
            ScoringError::NetworkError(_) | ScoringError::Timeout(_)
        ));
    }

    #[test]
    fn empty_url_uses_default() {
        let engine = RemoteEngine::new("", DEFAULT_TIMEOUT_SECS).unwrap();
        assert_eq!(engine.url(), DEFAULT_URL);
        assert_eq!(engine.name(), "remote");
    }
}
