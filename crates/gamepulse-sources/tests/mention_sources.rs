//! Integration tests for the mention sources using wiremock HTTP mocks.

use std::time::Duration;

use chrono::NaiveDate;
use gamepulse_sources::mentions::day_bounds;
use gamepulse_sources::{
    CollectorSettings, MentionCollector, MentionSource, PushshiftSource, RedditCredentials,
    RedditSearchSource, RetryPolicy,
};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn credentials() -> RedditCredentials {
    RedditCredentials {
        client_id: "id".to_string(),
        client_secret: "secret".to_string(),
        user_agent: "gamepulse-test/0.1".to_string(),
    }
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "tok",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn pushshift_sends_day_window_and_filters_by_text() {
    let server = MockServer::start().await;
    let (after, before) = day_bounds(day());

    Mock::given(method("GET"))
        .and(path("/reddit/search/submission/"))
        .and(query_param("q", "#CS2"))
        .and(query_param("after", after.to_string().as_str()))
        .and(query_param("before", before.to_string().as_str()))
        .and(query_param("size", "500"))
        .and(query_param("sort", "desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [
                { "id": "a1", "title": "CS2 ranked is wild", "selftext": "" },
                { "id": "a2", "title": "Patch notes", "selftext": "new cs2 maps" },
                { "id": "a3", "title": "Valorant", "selftext": null },
                { "title": "no id, cs2" }
            ]
        })))
        .mount(&server)
        .await;

    let source = PushshiftSource::with_base_url(5, &server.uri()).unwrap();
    let ids = source.fetch_day(day(), "#CS2").await.unwrap();

    let mut ids: Vec<String> = ids.into_iter().collect();
    ids.sort();
    assert_eq!(ids, vec!["a1".to_string(), "a2".to_string()]);
}

#[tokio::test]
async fn pushshift_forbidden_surfaces_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let source = PushshiftSource::with_base_url(5, &server.uri()).unwrap();
    let err = source.fetch_day(day(), "#CS2").await.unwrap_err();
    assert!(err.is_retriable());
    assert!(err.to_string().contains("403"));
}

#[tokio::test]
async fn reddit_search_keeps_only_posts_from_the_day() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    let (start, end) = day_bounds(day());

    Mock::given(method("GET"))
        .and(path("/r/all/search"))
        .and(header("Authorization", "Bearer tok"))
        .and(query_param("sort", "new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {
                "after": "t3_next",
                "children": [
                    { "data": { "id": "late", "title": "CS2", "created_utc": end } },
                    { "data": { "id": "in1", "title": "CS2 skins", "created_utc": end - 10 } },
                    { "data": { "id": "miss", "title": "Dota", "created_utc": end - 20 } },
                    { "data": { "id": "in2", "title": "x", "selftext": "CS2 trade", "created_utc": start } },
                    { "data": { "id": "old", "title": "CS2", "created_utc": start - 1 } }
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let source =
        RedditSearchSource::with_base_urls(credentials(), 5, &server.uri(), &server.uri()).unwrap();
    let ids = source.fetch_day(day(), "CS2").await.unwrap();

    let mut ids: Vec<String> = ids.into_iter().collect();
    ids.sort();
    assert_eq!(ids, vec!["in1".to_string(), "in2".to_string()]);
}

#[tokio::test]
async fn reddit_token_failure_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let source =
        RedditSearchSource::with_base_urls(credentials(), 5, &server.uri(), &server.uri()).unwrap();
    let err = source.fetch_day(day(), "CS2").await.unwrap_err();
    assert!(err.to_string().contains("token exchange failed"));
}

#[tokio::test]
async fn collector_falls_back_to_reddit_when_pushshift_is_down() {
    let pushshift = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .expect(3)
        .mount(&pushshift)
        .await;

    let reddit = MockServer::start().await;
    mount_token(&reddit).await;
    let (start, _) = day_bounds(day());
    Mock::given(method("GET"))
        .and(path("/r/all/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {
                "after": null,
                "children": [
                    { "data": { "id": "r1", "title": "#CS2 clip", "created_utc": start + 60 } }
                ]
            }
        })))
        .mount(&reddit)
        .await;

    let collector = MentionCollector::new(
        Box::new(PushshiftSource::with_base_url(5, &pushshift.uri()).unwrap()),
        Some(Box::new(
            RedditSearchSource::with_base_urls(credentials(), 5, &reddit.uri(), &reddit.uri())
                .unwrap(),
        )),
        vec!["#CS2".to_string()],
        CollectorSettings {
            retry: RetryPolicy::new(3, Duration::ZERO),
            fallback_error_threshold: 3,
        },
    );

    let mentions = collector.collect_day(day()).await;
    assert_eq!(mentions.unique, 1);
    assert_eq!(mentions.fallback_categories, vec!["#CS2".to_string()]);
}
