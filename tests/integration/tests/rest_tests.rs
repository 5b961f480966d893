//! REST control plane integration tests
//!
//! Virtual time throughout; cooldowns are checked against the call log.

use std::sync::Arc;
use std::time::Duration;

use bot_common::AppError;
use bot_rest::{HttpTransport, RestClient, RestRequest};
use integration_tests::helpers::{limited_response, test_config, MockTransport, API_BASE};
use serde_json::json;
use tokio::time::Instant;

fn client(transport: &Arc<MockTransport>) -> RestClient {
    let config = test_config().unwrap();
    RestClient::new(
        &config.rest,
        &config.bot.token,
        Arc::clone(transport) as Arc<dyn HttpTransport>,
    )
}

/// `x-ratelimit-reset` for a point `ms` from now
fn reset_in(ms: i64) -> String {
    let reset = (chrono::Utc::now().timestamp_millis() + ms) as f64 / 1000.0;
    format!("{reset:.3}")
}

#[tokio::test(start_paused = true)]
async fn test_same_route_requests_keep_submission_order() {
    let transport = MockTransport::new();
    let rest = client(&transport);

    let receivers: Vec<_> = (1..=4)
        .map(|n| {
            rest.queue()
                .submit(RestRequest::post(rest.url(&format!("/channels/{n}/messages"))))
        })
        .collect();
    for receiver in receivers {
        receiver.await.unwrap().unwrap();
    }

    let expected: Vec<String> = (1..=4)
        .map(|n| format!("{API_BASE}/channels/{n}/messages"))
        .collect();
    assert_eq!(transport.urls(), expected);
}

#[tokio::test(start_paused = true)]
async fn test_request_carries_bot_authorization() {
    let transport = MockTransport::new();
    transport.respond(200, json!({"id": "5"}));
    let rest = client(&transport);

    let value = rest.get("/users/@me", None).await.unwrap();

    assert_eq!(value["id"], "5");
    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, "GET");
    assert_eq!(calls[0].url, format!("{API_BASE}/users/@me"));
    assert_eq!(calls[0].authorization.as_deref(), Some("Bot test-token"));
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_remaining_defers_until_reset() {
    let transport = MockTransport::new();
    transport.push(limited_response(
        200,
        json!({"id": "1"}),
        &[("x-ratelimit-remaining", "0".to_string()), ("x-ratelimit-reset", reset_in(2000))],
    ));
    let rest = client(&transport);
    let start = Instant::now();

    rest.post("/channels/1/messages", Some(json!({"content": "a"}))).await.unwrap();
    rest.post("/channels/1/messages", Some(json!({"content": "b"}))).await.unwrap();

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[1].at - start >= Duration::from_millis(1500));
    assert_eq!(calls[1].body.as_ref().unwrap()["content"], "b");
}

#[tokio::test(start_paused = true)]
async fn test_bucket_cooldown_holds_later_request() {
    let transport = MockTransport::new();
    transport.push(limited_response(
        200,
        json!({}),
        &[
            ("x-ratelimit-remaining", "0".to_string()),
            ("x-ratelimit-reset", reset_in(5000)),
            ("x-ratelimit-bucket", "abc".to_string()),
        ],
    ));
    let rest = client(&transport);
    let url = "/channels/7/messages";
    let start = Instant::now();

    rest.post(url, None).await.unwrap();
    assert!(rest.tracker().check_delay("abc").is_some());

    tokio::time::sleep(Duration::from_secs(1)).await;
    rest.post(url, None).await.unwrap();

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[1].at - start >= Duration::from_millis(4500));
}

#[tokio::test(start_paused = true)]
async fn test_bucket_cooldown_spans_urls() {
    let transport = MockTransport::new();
    transport.push(limited_response(
        200,
        json!({}),
        &[
            ("x-ratelimit-remaining", "0".to_string()),
            ("x-ratelimit-reset", reset_in(5000)),
            ("x-ratelimit-bucket", "abc".to_string()),
        ],
    ));
    let rest = client(&transport);
    let start = Instant::now();

    rest.post("/channels/7/messages", None).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(rest.tracker().check_delay("abc").is_some());

    rest.queue()
        .enqueue(RestRequest::post(rest.url("/channels/8/messages")).with_bucket("abc"))
        .await
        .unwrap();

    let later = transport.calls_to("/channels/8/messages");
    assert_eq!(later.len(), 1);
    assert!(later[0].at - start >= Duration::from_millis(4500));
}

#[tokio::test(start_paused = true)]
async fn test_cooldown_does_not_block_other_routes() {
    let transport = MockTransport::new();
    transport.respond_to(
        "/channels/1/messages",
        429,
        json!({"message": "You are being rate limited.", "retry_after": 3000}),
    );
    let rest = client(&transport);
    let start = Instant::now();

    let limited = rest
        .queue()
        .submit(RestRequest::post(rest.url("/channels/1/messages")));
    let other = rest.queue().submit(RestRequest::get(rest.url("/guilds/1")));

    other.await.unwrap().unwrap();
    let guild_call = transport.calls_to("/guilds/1");
    assert!(guild_call[0].at - start < Duration::from_secs(1));

    limited.await.unwrap().unwrap();
    let retries = transport.calls_to("/channels/1/messages");
    assert_eq!(retries.len(), 2);
    assert!(retries[1].at - start >= Duration::from_millis(2500));
}

#[tokio::test(start_paused = true)]
async fn test_global_limit_pauses_every_route() {
    let transport = MockTransport::new();
    transport.push(limited_response(
        429,
        json!({"global": true, "retry_after": 2000}),
        &[("x-ratelimit-global", "true".to_string()), ("retry-after", "2000".to_string())],
    ));
    let rest = client(&transport);
    let start = Instant::now();

    let first = rest.queue().submit(RestRequest::get(rest.url("/users/@me")));
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(rest.tracker().is_globally_limited());

    rest.get("/guilds/1", None).await.unwrap();
    first.await.unwrap().unwrap();

    let guild_call = transport.calls_to("/guilds/1");
    assert!(guild_call[0].at - start >= Duration::from_millis(1900));
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_retries_are_bounded() {
    let transport = MockTransport::new();
    for _ in 0..20 {
        transport.respond(429, json!({"message": "You are being rate limited.", "retry_after": 0}));
    }
    let rest = client(&transport);

    let err = rest.get("/guilds/1", None).await.unwrap_err();

    assert!(matches!(err, AppError::RateLimitExceeded { retries: 10, .. }));
    assert_eq!(transport.calls().len(), 11);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(transport.calls().len(), 11);
    assert_eq!(rest.queue().pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_error_statuses_are_classified() {
    let transport = MockTransport::new();
    transport.respond(404, json!({"message": "Unknown Channel", "code": 10003}));
    transport.respond(503, json!({"message": "upstream unavailable"}));
    let rest = client(&transport);

    let not_found = rest.get("/channels/1", None).await.unwrap_err();
    assert!(matches!(not_found, AppError::ClientError { status: 404, .. }));
    assert!(not_found.is_client_error());

    let unavailable = rest.get("/channels/1", None).await.unwrap_err();
    assert!(matches!(unavailable, AppError::ServerError { status: 503, .. }));
    assert_eq!(transport.calls().len(), 2);
}
