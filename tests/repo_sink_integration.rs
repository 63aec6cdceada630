//! Integration tests for the content-repository sink against a mock REST API.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use mirror_core::sink::{RepositoryStatus, WriteOutcome};
use mirror_core::{HttpTimeouts, RepoSink, RepoSinkConfig, Sink, SinkError};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONTENTS_PATH: &str = "/repos/someone/quran-audio/contents/reciters/1/info.json";

fn sink(server: &MockServer) -> RepoSink {
    RepoSink::new(
        RepoSinkConfig {
            api_base: server.uri(),
            owner: "someone".to_string(),
            repo: "quran-audio".to_string(),
            branch: "main".to_string(),
            token: "test-token".to_string(),
        },
        HttpTimeouts::default(),
    )
    .expect("repo sink")
}

#[tokio::test]
async fn test_write_new_entry_sends_base64_without_sha() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .and(query_param("ref", "main"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .and(body_partial_json(json!({
            "message": "Add reciters/1/info.json",
            "content": STANDARD.encode(b"{\"id\":1}\n"),
            "branch": "main"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"content": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = sink(&server)
        .write("reciters/1/info.json", b"{\"id\":1}\n")
        .await
        .expect("write succeeds");

    assert_eq!(outcome, WriteOutcome::Created);
}

#[tokio::test]
async fn test_write_existing_entry_carries_current_sha() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sha": "abc123"})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .and(body_partial_json(json!({
            "message": "Update reciters/1/info.json",
            "sha": "abc123"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = sink(&server)
        .write("reciters/1/info.json", b"{}")
        .await
        .expect("write succeeds");

    assert_eq!(outcome, WriteOutcome::Updated);
}

#[tokio::test]
async fn test_conflict_rereads_revision_and_retries_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sha": "stale"})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sha": "fresh"})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .and(body_partial_json(json!({"sha": "fresh"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": {}})))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(409))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = sink(&server)
        .write("reciters/1/info.json", b"{}")
        .await
        .expect("second attempt succeeds");

    assert_eq!(outcome, WriteOutcome::Updated);
}

#[tokio::test]
async fn test_repeated_conflict_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sha": "moving"})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(422))
        .expect(2)
        .mount(&server)
        .await;

    let err = sink(&server)
        .write("reciters/1/info.json", b"{}")
        .await
        .expect_err("conflict twice");

    assert!(matches!(err, SinkError::Conflict { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_exists_reflects_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sha": "abc"})))
        .mount(&server)
        .await;

    let sink = sink(&server);
    assert!(sink.exists("reciters/1/info.json").await.expect("lookup"));
    assert!(
        !sink
            .exists("reciters/2/info.json")
            .await
            .expect("unmatched path is a 404")
    );
}

#[tokio::test]
async fn test_ensure_repository_creates_missing_repository() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/someone/quran-audio"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/user/repos"))
        .and(body_partial_json(json!({
            "name": "quran-audio",
            "private": false,
            "auto_init": true
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"full_name": "someone/quran-audio"})))
        .expect(1)
        .mount(&server)
        .await;

    let status = sink(&server).ensure_repository().await.expect("bootstrap");

    assert_eq!(status, RepositoryStatus::Created);
}

#[tokio::test]
async fn test_ensure_repository_uses_existing_repository() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/someone/quran-audio"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"full_name": "someone/quran-audio"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/user/repos"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let status = sink(&server).ensure_repository().await.expect("lookup");

    assert_eq!(status, RepositoryStatus::Existing);
}

#[tokio::test]
async fn test_ensure_repository_rejects_bad_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/someone/quran-audio"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Bad credentials"))
        .mount(&server)
        .await;

    let err = sink(&server)
        .ensure_repository()
        .await
        .expect_err("401 is fatal");

    match err {
        SinkError::HttpStatus { status, message, .. } => {
            assert_eq!(status, 401);
            assert!(message.contains("Bad credentials"));
        }
        other => panic!("expected HttpStatus, got {other:?}"),
    }
}
