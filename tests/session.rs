use credo::auth::AuthProtocol;
use credo::http::{HttpMethod, Request};
use credo::Session;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

async fn authenticated_session(server: &MockServer) -> Session {
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;

    let mut protocol =
        AuthProtocol::basic(&format!("{}/login", server.uri())).expect("protocol should build");
    protocol
        .authorize("alice", "secret", false)
        .await
        .expect("exchange should succeed");

    let mut session = Session::new();
    assert!(session.authorize(protocol));
    session
}

#[tokio::test]
async fn test_session_attaches_cached_fragment() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start().await;
    let session = authenticated_session(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/items"))
        .and(header("Authorization", "Basic YWxpY2U6c2VjcmV0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"["a", "b"]"#))
        .expect(1)
        .mount(&server)
        .await;

    let response = session
        .get(&format!("{}/api/items", server.uri()))
        .await
        .expect("request should succeed");
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json_array().expect("array body").len(), 2);
}

#[tokio::test]
async fn test_caller_headers_win_over_cache() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start().await;
    let session = authenticated_session(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/other"))
        .and(header("Authorization", "Bearer override-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let request = Request::new(format!("{}/api/other", server.uri()))
        .header("Authorization", "Bearer override-token");
    let response = session.request(&request).await.expect("request should succeed");
    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn test_session_posts_body_with_fragment() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start().await;
    let session = authenticated_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/items"))
        .and(header("Authorization", "Basic YWxpY2U6c2VjcmV0"))
        .and(body_json(json!({"name": "widget"})))
        .respond_with(ResponseTemplate::new(201).set_body_string("created"))
        .expect(1)
        .mount(&server)
        .await;

    let response = session
        .post(
            &format!("{}/api/items", server.uri()),
            json!({"name": "widget"}),
        )
        .await
        .expect("request should succeed");
    assert_eq!(response.status_code(), 201);
}

#[tokio::test]
async fn test_detached_session_sends_no_fragment() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/public"))
        .respond_with(ResponseTemplate::new(200).set_body_string("open"))
        .mount(&server)
        .await;

    let session = Session::new();
    assert!(!session.is_authenticated());

    let response = session
        .get(&format!("{}/public", server.uri()))
        .await
        .expect("request should succeed");
    assert_eq!(response.content(), Some("open"));

    let requests = server.received_requests().await.expect("requests recorded");
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn test_de_authenticate_drops_fragment() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start().await;
    let mut session = authenticated_session(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/items"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    session.de_authenticate();
    assert!(!session.is_authenticated());
    session
        .get(&format!("{}/api/items", server.uri()))
        .await
        .expect("request should succeed");

    let requests = server.received_requests().await.expect("requests recorded");
    let api_request = requests
        .iter()
        .find(|request| request.url.path() == "/api/items")
        .expect("api request recorded");
    assert!(!api_request.headers.contains_key("authorization"));
}

#[tokio::test]
async fn test_session_delete_uses_method() {
    if !can_bind_localhost() {
        return;
    }

    let server = MockServer::start().await;
    let session = authenticated_session(&server).await;

    Mock::given(method("DELETE"))
        .and(path("/api/items/1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let response = session
        .delete(&format!("{}/api/items/1", server.uri()))
        .await
        .expect("request should succeed");
    assert_eq!(response.status_code(), 204);

    let request = Request::new(format!("{}/api/items/1", server.uri())).method(HttpMethod::Delete);
    assert_eq!(request.method, HttpMethod::Delete);
}
