//! Mock engine for testing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use restate_core::error::ScoringError;
use restate_core::overlap::score_overlap;
use restate_core::traits::{MatchEngine, MatchResult};

enum Behavior {
    /// Real overlap detail with the rate replaced.
    FixedRate(f64),
    /// Plain overlap scoring.
    Overlap,
    /// Every call fails with a transient network error.
    Failing(String),
}

/// A mock match engine for exercising the service without a scoring server.
pub struct MockEngine {
    behavior: Behavior,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Last `(original, user)` pair received.
    last_request: Mutex<Option<(String, String)>>,
}

impl MockEngine {
    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that always reports `rate`.
    pub fn with_fixed_rate(rate: f64) -> Self {
        Self::with_behavior(Behavior::FixedRate(rate))
    }

    /// Create a mock that scores by word overlap and records its calls.
    pub fn overlap() -> Self {
        Self::with_behavior(Behavior::Overlap)
    }

    /// Create a mock whose every call fails.
    pub fn failing(message: &str) -> Self {
        Self::with_behavior(Behavior::Failing(message.to_string()))
    }

    /// Get the number of calls made to this engine.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last request made to this engine.
    pub fn last_request(&self) -> Option<(String, String)> {
        self.last_request.lock().ok().and_then(|r| r.clone())
    }
}

#[async_trait]
impl MatchEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn analyze(&self, original: &str, user: &str) -> Result<MatchResult, ScoringError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some((original.to_string(), user.to_string()));
        }

        match &self.behavior {
            Behavior::FixedRate(rate) => Ok(MatchResult {
                matching_rate: *rate,
                ..score_overlap(original, user)
            }),
            Behavior::Overlap => Ok(score_overlap(original, user)),
            Behavior::Failing(message) => Err(ScoringError::NetworkError(message.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_rate() {
        let engine = MockEngine::with_fixed_rate(42.5);
        let result = engine.analyze("alpha beta", "alpha").await.unwrap();
        assert_eq!(result.matching_rate, 42.5);
        assert_eq!(result.matched_words, 1);
        assert_eq!(engine.call_count(), 1);
        assert_eq!(
            engine.last_request(),
            Some(("alpha beta".to_string(), "alpha".to_string()))
        );
    }

    #[tokio::test]
    async fn overlap_counts_calls() {
        let engine = MockEngine::overlap();
        for _ in 0..3 {
            engine.analyze("one two", "two three").await.unwrap();
        }
        assert_eq!(engine.call_count(), 3);
    }

    #[tokio::test]
    async fn failing_mode() {
        let engine = MockEngine::failing("scorer offline");
        let err = engine.analyze("a", "b").await.unwrap_err();
        assert!(err.to_string().contains("scorer offline"));
        assert!(err.is_transient());
        assert_eq!(engine.call_count(), 1);
    }
}
