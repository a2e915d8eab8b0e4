//! End-to-end pipeline tests: configured engine, service and SQLite store
//! wired together the way the CLI wires them.

use std::sync::Arc;

use restate_core::error::{AnalysisError, ScoringError};
use restate_core::model::{Caller, LatestQuery, PageRequest, Submission};
use restate_core::service::AnalysisService;
use restate_providers::{create_engine, MockEngine, ScorerConfig};
use restate_store::SqliteStore;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn submission(original: &str, user: &str) -> Submission {
    Submission {
        original_text: Some(original.to_string()),
        user_text: user.to_string(),
        attachment: None,
    }
}

async fn remote_service(server: &MockServer) -> AnalysisService {
    let engine = create_engine(&ScorerConfig::Remote {
        url: format!("{}/analyze", server.uri()),
        timeout_secs: 5,
    })
    .unwrap();
    AnalysisService::new(engine, Arc::new(SqliteStore::open_in_memory().unwrap()))
}

#[tokio::test]
async fn e2e_remote_scores_are_persisted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"matchingRate": 91.5})),
        )
        .expect(2)
        .mount(&server)
        .await;

    let service = remote_service(&server).await;
    let caller = Caller::owner(1, Some("Alice".into()));

    let first = service
        .submit(&caller, submission("원문입니다. 두 번째 문장", "요약"))
        .await
        .unwrap();
    assert_eq!(first.result.matching_rate, 91.5);
    assert_eq!(first.subject, "원문입니다");

    let second = service
        .submit(&caller, submission("원문입니다. 두 번째 문장", "다시 요약"))
        .await
        .unwrap();
    assert_eq!(second.version_no, Some(1));

    let record = service.get_record(second.record_id.unwrap()).await.unwrap();
    let detail = record.result.unwrap();
    assert_eq!(detail.matched_words, 0);
    assert!(detail.keyword_matches.is_empty());
    assert_eq!(detail.user_length, 5);
}

#[tokio::test]
async fn e2e_remote_failure_saves_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(ResponseTemplate::new(503).set_body_string("warming up"))
        .mount(&server)
        .await;

    let service = remote_service(&server).await;
    let caller = Caller::owner(1, None);
    let err = service
        .submit(&caller, submission("Original", "attempt"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::ScoringUnavailable(ScoringError::ApiError { status: 503, .. })
    ));

    let page = service
        .list_latest_per_original(&LatestQuery::default(), PageRequest::new(0, 10))
        .await
        .unwrap();
    assert_eq!(page.total_items, 0);
}

#[tokio::test]
async fn e2e_mock_engine_full_lifecycle() {
    let engine = Arc::new(MockEngine::with_fixed_rate(60.0));
    let service = AnalysisService::new(
        engine.clone(),
        Arc::new(SqliteStore::open_in_memory().unwrap()),
    );
    let alice = Caller::owner(1, Some("Alice".into()));
    let bob = Caller::owner(2, Some("Bob".into()));

    let mut ids = Vec::new();
    for caller in [&alice, &alice, &bob] {
        let outcome = service
            .submit(caller, submission("Lifecycle original. More text", "attempt"))
            .await
            .unwrap();
        ids.push(outcome.record_id.unwrap());
    }
    assert_eq!(engine.call_count(), 3);

    // one group per owner
    let latest = service
        .list_latest_per_original(&LatestQuery::default(), PageRequest::new(0, 10))
        .await
        .unwrap();
    assert_eq!(latest.total_items, 2);

    // versions are shared across owners of the same original
    let reset = service.reset_understanding(ids[2]).await.unwrap();
    assert_eq!(reset.new_record_id(), ids[1]);

    service.toggle_important(ids[0]).await.unwrap();
    service.hide(ids[0]).await.unwrap();
    assert_eq!(service.count_hidden(1).await.unwrap(), 1);

    let visible = service
        .list_visible(1, PageRequest::new(0, 10))
        .await
        .unwrap();
    assert_eq!(visible.items.len(), 1);
    assert_eq!(visible.items[0].id, ids[1]);

    let restored = service.restore(ids[0]).await.unwrap();
    assert!(restored.is_important);
    assert!(!restored.is_hidden);

    let trend = service
        .list_trend(1, &restored.content_hash)
        .await
        .unwrap();
    assert_eq!(trend.len(), 2);
}
