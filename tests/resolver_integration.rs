//! Integration tests for segment resolution against a mock recitation API.

use std::time::Duration;

use mirror_core::{ApiClient, HttpTimeouts, RetryPolicy, SegmentResolver, SegmentScheme};
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api(server: &MockServer) -> ApiClient {
    ApiClient::with_settings(
        &server.uri(),
        RetryPolicy::with_max_attempts(1),
        Duration::ZERO,
        HttpTimeouts::default(),
    )
    .expect("api client")
}

fn audio_host() -> Url {
    Url::parse("https://audio.example").expect("audio host")
}

fn page(keys: &[&str], next_page: Option<u32>) -> Value {
    let files: Vec<Value> = keys
        .iter()
        .map(|key| json!({"verse_key": key, "url": format!("Test/{key}.mp3")}))
        .collect();
    json!({
        "audio_files": files,
        "pagination": {"per_page": 1000, "current_page": 1, "next_page": next_page}
    })
}

fn rendered(records: &[mirror_core::resolver::VerseRecord]) -> Vec<String> {
    records.iter().map(|r| r.verse_key.to_string()).collect()
}

#[tokio::test]
async fn test_segment_follows_next_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/recitations/1/by_juz/1"))
        .and(query_param("per_page", "1000"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&["1:2", "1:1"], Some(2))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/recitations/1/by_juz/1"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&["1:3"], None)))
        .expect(1)
        .mount(&server)
        .await;

    let api = api(&server);
    let resolver = SegmentResolver::new(&api, audio_host());
    let records = resolver
        .segment(1, SegmentScheme::Juz, 1)
        .await
        .expect("valid segment");

    assert_eq!(rendered(&records), ["1:2", "1:1", "1:3"]);
    assert!(records.iter().all(|r| r.source_url.is_none()));
}

#[tokio::test]
async fn test_failed_later_page_empties_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/recitations/1/by_page/2"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&["2:6", "2:7"], Some(2))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/recitations/1/by_page/2"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let api = api(&server);
    let resolver = SegmentResolver::new(&api, audio_host());
    let records = resolver
        .segment(1, SegmentScheme::Page, 2)
        .await
        .expect("valid segment");

    assert!(records.is_empty(), "partial segment must not survive: {records:?}");
}

#[tokio::test]
async fn test_implausible_next_page_stops_paging() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/recitations/1/by_hizb/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&["1:1"], Some(1))))
        .expect(1)
        .mount(&server)
        .await;

    let api = api(&server);
    let resolver = SegmentResolver::new(&api, audio_host());
    let records = resolver
        .segment(1, SegmentScheme::Hizb, 1)
        .await
        .expect("valid segment");

    assert_eq!(rendered(&records), ["1:1"]);
}

#[tokio::test]
async fn test_chapter_segment_drops_verses_of_other_chapters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/recitations/1/by_chapter/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&["1:1", "2:1", "1:2"], None)))
        .expect(1)
        .mount(&server)
        .await;

    let api = api(&server);
    let resolver = SegmentResolver::new(&api, audio_host());
    let records = resolver
        .segment(1, SegmentScheme::Chapter, 1)
        .await
        .expect("valid segment");

    assert_eq!(rendered(&records), ["1:1", "1:2"]);
}

#[tokio::test]
async fn test_translation_feed_requests_verse_keys() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quran/translations/131"))
        .and(query_param("fields", "verse_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"translations": [
            {"verse_key": "1:1", "text": "In the Name of Allah"},
            {"verse_key": "bogus", "text": "dropped"}
        ]})))
        .expect(1)
        .mount(&server)
        .await;

    let api = api(&server);
    let resolver = SegmentResolver::new(&api, audio_host());
    let verses = resolver.translation_feed(131).await;

    assert_eq!(verses.len(), 1);
    assert_eq!(verses[0].verse_key.to_string(), "1:1");
    assert_eq!(verses[0].text, "In the Name of Allah");
}

#[tokio::test]
async fn test_unavailable_translation_feed_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quran/translations/7"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let api = api(&server);
    let resolver = SegmentResolver::new(&api, audio_host());

    assert!(resolver.translation_feed(7).await.is_empty());
}
