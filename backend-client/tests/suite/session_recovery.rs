use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::Result;
use futures::future::join_all;
use pretty_assertions::assert_eq;
use prospector_backend_client::ApiRequest;
use prospector_backend_client::TokenPair;
use reqwest::StatusCode;
use serde_json::json;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::body_json;
use wiremock::matchers::header;
use wiremock::matchers::method;
use wiremock::matchers::path;

use super::client_for;
use super::token_store;

fn profile() -> serde_json::Value {
    json!({ "id": "u1", "email": "ada@example.com", "name": "Ada" })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_unauthorized_requests_share_one_refresh() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile()))
        .expect(5)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "expired" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({ "refresh_token": "r1" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "fresh", "refresh_token": "r2" }))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let tokens = token_store(Some("stale"), Some("r1"));
    let client = client_for(&server, Arc::clone(&tokens));

    let results = join_all((0..5).map(|_| {
        let client = client.clone();
        async move { client.me().await }
    }))
    .await;

    for result in results {
        assert_eq!(result?.email, "ada@example.com");
    }
    assert_eq!(
        tokens.get(),
        TokenPair {
            access_token: Some("fresh".to_string()),
            refresh_token: Some("r2".to_string()),
        }
    );
    assert!(!client.refresh_coordinator().is_refreshing());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn refresh_failure_rejects_every_caller_and_clears_session() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(401))
        .expect(4)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "detail": "Invalid or revoked refresh token" }))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let expired = Arc::new(AtomicUsize::new(0));
    let tokens = token_store(Some("stale"), Some("revoked"));
    let client = client_for(&server, Arc::clone(&tokens)).with_session_expired_hook({
        let expired = Arc::clone(&expired);
        move || {
            expired.fetch_add(1, Ordering::SeqCst);
        }
    });

    let results = join_all((0..4).map(|_| {
        let client = client.clone();
        async move { client.me().await }
    }))
    .await;

    for result in results {
        let err = result.expect_err("session should have expired");
        assert!(err.is_session_expired(), "unexpected error: {err}");
    }
    assert!(tokens.get().is_empty());
    assert_eq!(expired.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn replayed_request_is_not_retried_again() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "a2", "refresh_token": "r2" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let tokens = token_store(Some("a1"), Some("r1"));
    let client = client_for(&server, Arc::clone(&tokens));

    let response = client.send(&ApiRequest::get("/auth/me")).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(tokens.access_token().as_deref(), Some("a2"));
    Ok(())
}

#[tokio::test]
async fn missing_refresh_token_expires_without_network_call() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let expired = Arc::new(AtomicUsize::new(0));
    let tokens = token_store(Some("a1"), None);
    let client = client_for(&server, Arc::clone(&tokens)).with_session_expired_hook({
        let expired = Arc::clone(&expired);
        move || {
            expired.fetch_add(1, Ordering::SeqCst);
        }
    });

    let err = client.me().await.expect_err("no refresh token");
    assert!(err.is_session_expired());
    assert!(tokens.get().is_empty());
    assert_eq!(expired.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn cleared_session_does_not_expire_twice() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let expired = Arc::new(AtomicUsize::new(0));
    let tokens = token_store(Some("a1"), Some("revoked"));
    let client = client_for(&server, Arc::clone(&tokens)).with_session_expired_hook({
        let expired = Arc::clone(&expired);
        move || {
            expired.fetch_add(1, Ordering::SeqCst);
        }
    });

    let first = client.me().await.expect_err("refresh rejected");
    assert!(first.is_session_expired());
    assert!(tokens.get().is_empty());

    let second = client.me().await.expect_err("no session left");
    assert!(second.is_session_expired());
    assert_eq!(expired.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn token_renewed_elsewhere_is_reused_without_refreshing() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("authorization", "Bearer old"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(300)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("authorization", "Bearer new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let tokens = token_store(Some("old"), Some("r1"));
    let client = client_for(&server, Arc::clone(&tokens));

    let pending = tokio::spawn({
        let client = client.clone();
        async move { client.me().await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    tokens.set(Some("new".to_string()), Some("r2".to_string()))?;

    let profile = pending.await??;
    assert_eq!(profile.id, "u1");
    Ok(())
}

#[tokio::test]
async fn other_failures_are_returned_unchanged() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "detail": "Unknown industry" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, token_store(Some("a1"), Some("r1")));
    let err = client
        .search(&json!({ "industry": ["plastix"], "limit": 50 }))
        .await
        .expect_err("bad request");

    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    assert_eq!(err.user_message("Search failed"), "Unknown industry");
    Ok(())
}
