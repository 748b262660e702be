//! Integration tests for the request client against a mock server.

use std::time::Duration;

use horizon_facet_core::{BindingContext, DataKey};
use horizon_facet_net::{FailurePresenter, RequestClient, RequestError, RequestMethod, RequestPolicy};
use serde_json::json;
use wiremock::matchers::{body_json, body_string, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> RequestClient {
    let policy = RequestPolicy::new()
        .with_base_url(&format!("{}/v1", server.uri()))
        .expect("mock server URI is a valid base")
        .with_header("x-api-key", "secret")
        .expect("valid header");
    RequestClient::new(&policy).expect("Failed to build client")
}

#[tokio::test]
async fn test_get_decodes_json_with_policy_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/users"))
        .and(query_param("page", "2"))
        .and(header("x-api-key", "secret"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}, {"id": 2}])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let users = client.get("/users?page=2").await.unwrap();
    assert_eq!(users, json!([{"id": 1}, {"id": 2}]));
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/users"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"name": "Jane"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 9, "name": "Jane"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let created = client.post("users", json!({"name": "Jane"})).await.unwrap();
    assert_eq!(created["id"], 9);
}

#[tokio::test]
async fn test_form_and_text_bodies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/login"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("user=jane"))
        .and(body_string_contains("remember=true"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/note"))
        .and(header("content-type", "text/plain"))
        .and(body_string("hello"))
        .respond_with(ResponseTemplate::new(200).set_body_string("saved"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let login = client
        .request(
            "/login",
            RequestMethod::Post,
            Some(json!({"user": "jane", "remember": true})),
            Some("application/x-www-form-urlencoded"),
        )
        .await
        .unwrap();
    assert_eq!(login, serde_json::Value::Null);

    let note = client
        .request("/note", RequestMethod::Put, Some(json!("hello")), Some("text/plain"))
        .await
        .unwrap();
    assert_eq!(note, json!("saved"));

    let err = client
        .request(
            "/login",
            RequestMethod::Post,
            Some(json!([1, 2])),
            Some("application/x-www-form-urlencoded"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RequestError::InvalidBody(_)));
}

#[tokio::test]
async fn test_failure_carries_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/users/3"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"message": "User has open orders"})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.delete("/users/3").await.unwrap_err();
    assert_eq!(err.status_code(), Some(409));
    assert_eq!(err.message(), "User has open orders");

    let presenter = FailurePresenter::new();
    assert_eq!(presenter.present(&err), "User has open orders");
}

#[tokio::test]
async fn test_unmatched_route_is_not_found() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    let err = client.get("/missing").await.unwrap_err();
    assert_eq!(err, RequestError::status(404, "Not Found"));
}

#[tokio::test]
async fn test_timeout_from_policy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let policy = RequestPolicy::new()
        .with_base_url(&server.uri())
        .unwrap()
        .with_timeout(Duration::from_millis(50));
    let client = RequestClient::new(&policy).unwrap();

    let err = client.get("/slow").await.unwrap_err();
    assert_eq!(err, RequestError::Timeout);
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_load_into_live_and_released_context() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Jane"})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let data = BindingContext::new(json!({}));
    let weak = data.downgrade();
    let key = DataKey::from("profile");

    assert!(client.load_into("/profile", &weak, &key).await.unwrap());
    assert_eq!(data.read(&key), Some(json!({"name": "Jane"})));

    drop(data);
    assert!(!client.load_into("/profile", &weak, &key).await.unwrap());
}

#[tokio::test]
async fn test_spawned_request_settles_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let (tx, rx) = tokio::sync::oneshot::channel();
    let handle = client
        .spawn_request("/ping", RequestMethod::Get, None, None, move |result| {
            let _ = tx.send(result);
        })
        .unwrap();

    handle.await.unwrap();
    assert_eq!(rx.await.unwrap().unwrap(), json!({"ok": true}));
}
