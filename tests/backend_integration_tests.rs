use std::sync::Arc;

use recuri::backend::{BackendError, HttpBackend, QueryBackend, Source};
use recuri::core::action::{Action, CONNECTIVITY_ERROR, Effect, NO_ANSWER, update};
use recuri::core::state::{App, Phase, Role};
use recuri::proxy::{BACKEND_ERROR, INVALID_QUERY, ProxyReply, ProxyServer};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, method, path},
};

// ============================================================================
// Helper Functions
// ============================================================================

fn backend_for(server: &MockServer) -> Arc<dyn QueryBackend> {
    Arc::new(HttpBackend::new(&server.uri()).unwrap())
}

/// Submits `query` and feeds the backend outcome back through the reducer.
async fn ask(app: &mut App, query: &str) {
    let Effect::SpawnRequest(query) = update(app, Action::Submit(query.into())) else {
        panic!("submit should spawn a request");
    };
    let outcome = app.backend.query(&query).await;
    update(app, Action::from_outcome(outcome));
}

// ============================================================================
// HttpBackend
// ============================================================================

#[tokio::test]
async fn test_backend_answer_with_sources() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/query"))
        .and(body_json(json!({ "query": "capital of France?" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": "Paris.",
            "sources": [{ "title": "A", "url": "http://a" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let response = backend.query("capital of France?").await.unwrap();
    assert_eq!(response.answer(), Some("Paris."));
    assert_eq!(
        response.citations(),
        &[Source {
            title: "A".into(),
            url: "http://a".into(),
        }]
    );
}

#[tokio::test]
async fn test_backend_non_success_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let err = backend_for(&server).query("q").await.unwrap_err();
    match err {
        BackendError::Api { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "unavailable");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_backend_malformed_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = backend_for(&server).query("q").await.unwrap_err();
    assert!(matches!(err, BackendError::Parse(_)), "got {err:?}");
}

#[tokio::test]
async fn test_backend_unreachable_is_network_error() {
    // Bind then drop a listener so the port is very likely closed
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = HttpBackend::new(&format!("http://{addr}")).unwrap();
    let err = backend.query("q").await.unwrap_err();
    assert!(matches!(err, BackendError::Network(_)), "got {err:?}");
}

// ============================================================================
// Conversation flow against a live backend
// ============================================================================

#[tokio::test]
async fn test_conversation_appends_answer_with_sources() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": "Paris.",
            "sources": [{ "title": "A", "url": "http://a" }]
        })))
        .mount(&server)
        .await;

    let mut app = App::new(backend_for(&server), None);
    ask(&mut app, "capital of France?").await;

    assert_eq!(app.phase, Phase::Idle);
    let messages = app.conversation.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[1].role, Role::Agent);
    assert_eq!(messages[1].text, "Paris.");
    assert_eq!(messages[1].sources.len(), 1);
}

#[tokio::test]
async fn test_conversation_empty_result_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "" })))
        .mount(&server)
        .await;

    let mut app = App::new(backend_for(&server), None);
    ask(&mut app, "q").await;

    let last = app.conversation.last().unwrap();
    assert_eq!(last.text, NO_ANSWER);
    assert!(last.sources.is_empty());
}

#[tokio::test]
async fn test_conversation_backend_failure_shows_connectivity_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut app = App::new(backend_for(&server), None);
    ask(&mut app, "q").await;

    assert_eq!(app.phase, Phase::Idle);
    assert_eq!(app.conversation.last().unwrap().text, CONNECTIVITY_ERROR);
}

// ============================================================================
// Proxy end to end
// ============================================================================

async fn start_proxy(server: &MockServer) -> (ProxyServer, String) {
    let proxy = ProxyServer::start(backend_for(server), "127.0.0.1:0")
        .await
        .unwrap();
    let base = format!("http://{}", proxy.addr());
    (proxy, base)
}

#[tokio::test]
async fn test_proxy_forwards_result_without_sources() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/query"))
        .and(body_json(json!({ "query": "capital of France?" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": "Paris.",
            "sources": [{ "title": "A", "url": "http://a" }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let (_proxy, base) = start_proxy(&server).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/query"))
        .json(&json!({ "query": "capital of France?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "result": "Paris." }));
}

#[tokio::test]
async fn test_proxy_rejects_invalid_query_without_calling_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let (_proxy, base) = start_proxy(&server).await;
    let client = reqwest::Client::new();

    for payload in [json!({ "query": 123 }), json!({ "query": "" }), json!({})] {
        let response = client
            .post(format!("{base}/api/query"))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400, "payload {payload}");
        let reply: ProxyReply = response.json().await.unwrap();
        assert_eq!(reply.result.as_deref(), Some(INVALID_QUERY));
    }
}

#[tokio::test]
async fn test_proxy_maps_backend_failure_to_500() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;
    let (_proxy, base) = start_proxy(&server).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/query"))
        .json(&json!({ "query": "q" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 500);
    let reply: ProxyReply = response.json().await.unwrap();
    assert_eq!(reply.result.as_deref(), Some(BACKEND_ERROR));
}

#[tokio::test]
async fn test_proxy_health() {
    let server = MockServer::start().await;
    let (proxy, base) = start_proxy(&server).await;

    let body: serde_json::Value = reqwest::get(format!("{base}/api/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "status": "ok" }));
    proxy.shutdown();
}
