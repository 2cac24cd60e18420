use serde_json::{Value, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::tests::test_support::{
    REFRESH_ENDPOINT, capture_logs, context_for, dead_pair, drain_logs, envelope, mount_refresh,
    pair,
};
use crate::{ApiRequest, Config, Error, RequestDispatchContext, SessionStatus};

#[tokio::test]
async fn rejected_refresh_ends_the_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/solutions/my-solutions"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_ENDPOINT))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "message": "Invalid or expired refresh token",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let context = context_for(&server, Some(pair("a1", "r1")));
    let mut session = context.store().subscribe();
    let (lines, guard) = capture_logs();
    let res = context
        .execute_json::<Vec<Value>>(ApiRequest::get("/solutions/my-solutions"))
        .await;
    drop(guard);

    match res {
        Err(Error::Auth(msg)) => assert!(msg.contains("401"), "unexpected message: {msg}"),
        other => panic!("expected auth error, got {other:?}"),
    }
    assert!(context.store().get().await.is_none());
    session.changed().await.unwrap();
    assert_eq!(*session.borrow(), SessionStatus::Expired);

    let logs = drain_logs(lines);
    assert!(
        logs.iter()
            .any(|line| line.contains("ERROR") && line.contains("refresh.failure")),
        "expected refresh.failure error log, got: {:?}",
        logs
    );
    assert!(logs.iter().any(|line| line.contains("session.terminated")));
}

#[tokio::test]
async fn expired_refresh_token_skips_the_refresh_call() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_ENDPOINT))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let context = context_for(&server, Some(dead_pair("a1", "r1")));
    let err = context
        .execute_json::<Value>(ApiRequest::get("/auth/me"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Auth(msg) if msg.contains("refresh token expired")));
    assert_eq!(context.store().status(), SessionStatus::Expired);
}

#[tokio::test]
async fn anonymous_401_never_calls_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_ENDPOINT))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let context = context_for(&server, None);
    let err = context
        .execute_json::<Value>(ApiRequest::get("/auth/me"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Auth(_)));
}

#[tokio::test]
async fn retried_request_failing_again_is_not_refreshed_twice() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/problems/42"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    mount_refresh(&server, "r1", "a2", "r2", 1).await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("Authorization", "Bearer a2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({ "ok": true }))))
        .expect(1)
        .mount(&server)
        .await;

    let context = context_for(&server, Some(pair("a1", "r1")));
    let err = context
        .execute_unit(ApiRequest::delete("/problems/42"))
        .await
        .unwrap_err();
    match err {
        Error::Auth(msg) => assert!(msg.contains("still unauthorized after refresh")),
        other => panic!("expected auth error, got {other:?}"),
    }

    // Only the replayed request failed; the refreshed session stays usable.
    assert_eq!(context.store().status(), SessionStatus::Authenticated);
    let me: Value = context
        .execute_json(ApiRequest::get("/auth/me"))
        .await
        .unwrap();
    assert_eq!(me["ok"], true);
}

#[tokio::test]
async fn unreachable_refresh_endpoint_ends_the_session() {
    // Nothing listens on port 1, so the refresh call fails in transport.
    let config = Config::from_values("http://127.0.0.1:1/api", Some(2)).with_tokens(pair("a1", "r1"));
    let context = RequestDispatchContext::from_config(&config).unwrap();
    let mut session = context.store().subscribe();

    let res = context
        .coordinator()
        .recover(ApiRequest::get("/auth/me"), Some("a1".into()))
        .await;

    match res {
        Err(Error::Auth(msg)) => assert!(msg.contains("transport error"), "unexpected message: {msg}"),
        other => panic!("expected auth error, got {other:?}"),
    }
    assert!(context.store().get().await.is_none());
    session.changed().await.unwrap();
    assert_eq!(*session.borrow(), SessionStatus::Expired);
    assert!(!context.coordinator().is_refreshing().await);
}
