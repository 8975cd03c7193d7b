mod helpers;

use helpers::{
    admin_client_for, client_for, client_with_storage, envelope, expired_token, failure,
    signed_in_client, valid_token,
};
use minsul_api_client::{ClientError, FileStorage, RequestOptions};
use mockito::{Matcher, Server};
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;

fn user_json() -> serde_json::Value {
    json!({
        "id": "5b0b8a39-8c55-4a3a-9f7f-0c2a6d2f7a11",
        "email": "member@example.org",
        "name": "Member",
        "role": "user"
    })
}

#[tokio::test]
async fn missing_token_fails_without_network() {
    let mut server = Server::new_async().await;
    let any = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = client_for(&server.url());
    let err = client.me().await.unwrap_err();

    assert!(matches!(err, ClientError::NoCredential));
    assert!(err.requires_login());
    any.assert_async().await;
}

#[tokio::test]
async fn valid_token_is_sent_as_bearer() {
    let mut server = Server::new_async().await;
    let token = valid_token();
    let refresh = server
        .mock("POST", "/api/auth/refresh")
        .expect(0)
        .create_async()
        .await;
    let me = server
        .mock("GET", "/api/auth/me")
        .match_header("authorization", format!("Bearer {}", token).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(envelope(user_json()))
        .create_async()
        .await;

    let client = client_for(&server.url());
    client.tokens().set_tokens(&token, Some("refresh-1")).unwrap();

    let user = client.me().await.unwrap();
    assert_eq!(user.email, "member@example.org");
    me.assert_async().await;
    refresh.assert_async().await;
}

#[tokio::test]
async fn expired_token_is_refreshed_before_request() {
    let mut server = Server::new_async().await;
    let fresh = valid_token();
    let refresh = server
        .mock("POST", "/api/auth/refresh")
        .match_body(Matcher::PartialJson(json!({
            "refresh_token": "refresh-1",
            "service_type": "site"
        })))
        .with_status(200)
        .with_body(envelope(json!({
            "access_token": fresh,
            "refresh_token": "refresh-2"
        })))
        .expect(1)
        .create_async()
        .await;
    let me = server
        .mock("GET", "/api/auth/me")
        .match_header("authorization", format!("Bearer {}", fresh).as_str())
        .with_status(200)
        .with_body(envelope(user_json()))
        .create_async()
        .await;

    let client = client_for(&server.url());
    client
        .tokens()
        .set_tokens(&expired_token(), Some("refresh-1"))
        .unwrap();

    client.me().await.unwrap();

    assert_eq!(client.tokens().access_token(), Some(fresh));
    assert_eq!(client.tokens().refresh_token().as_deref(), Some("refresh-2"));
    refresh.assert_async().await;
    me.assert_async().await;
}

#[tokio::test]
async fn failed_refresh_ends_session() {
    let mut server = Server::new_async().await;
    let refresh = server
        .mock("POST", "/api/auth/refresh")
        .with_status(200)
        .with_body(failure("Refresh token revoked"))
        .expect(1)
        .create_async()
        .await;
    let me = server
        .mock("GET", "/api/auth/me")
        .expect(0)
        .create_async()
        .await;

    let client = client_for(&server.url());
    client
        .tokens()
        .set_tokens(&expired_token(), Some("refresh-1"))
        .unwrap();

    let err = client.me().await.unwrap_err();
    assert!(matches!(err, ClientError::SessionExpired));
    assert!(client.tokens().access_token().is_none());
    assert!(client.tokens().refresh_token().is_none());

    // Nothing left to send: the next call never reaches the server.
    assert!(matches!(
        client.me().await.unwrap_err(),
        ClientError::NoCredential
    ));
    refresh.assert_async().await;
    me.assert_async().await;
}

#[tokio::test]
async fn expired_token_without_refresh_token_ends_session() {
    let server = Server::new_async().await;
    let client = client_for(&server.url());
    client.tokens().set_tokens(&expired_token(), None).unwrap();

    assert!(matches!(
        client.me().await.unwrap_err(),
        ClientError::SessionExpired
    ));
    assert!(!client.tokens().is_authenticated());
}

#[tokio::test]
async fn unauthorized_response_clears_tokens() {
    let mut server = Server::new_async().await;
    let me = server
        .mock("GET", "/api/auth/me")
        .with_status(401)
        .with_body(failure("Unauthorized"))
        .expect(1)
        .create_async()
        .await;

    let client = signed_in_client(&server.url());
    let err = client.me().await.unwrap_err();

    assert!(matches!(err, ClientError::SessionExpired));
    assert!(client.tokens().access_token().is_none());
    me.assert_async().await;
}

#[tokio::test]
async fn concurrent_requests_share_one_refresh() {
    let mut server = Server::new_async().await;
    let fresh = valid_token();
    let refresh = server
        .mock("POST", "/api/auth/refresh")
        .with_status(200)
        .with_body(envelope(json!({
            "access_token": fresh,
            "refresh_token": "refresh-2"
        })))
        .expect(1)
        .create_async()
        .await;
    let me = server
        .mock("GET", "/api/auth/me")
        .match_header("authorization", format!("Bearer {}", fresh).as_str())
        .with_status(200)
        .with_body(envelope(user_json()))
        .expect(3)
        .create_async()
        .await;

    let client = client_for(&server.url());
    client
        .tokens()
        .set_tokens(&expired_token(), Some("refresh-1"))
        .unwrap();

    let (a, b, c) = tokio::join!(client.me(), client.me(), client.me());
    assert!(a.is_ok() && b.is_ok() && c.is_ok());

    refresh.assert_async().await;
    me.assert_async().await;
}

#[tokio::test]
async fn concurrent_requests_share_one_failed_refresh() {
    let mut server = Server::new_async().await;
    let refresh = server
        .mock("POST", "/api/auth/refresh")
        .with_status(500)
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server.url());
    client
        .tokens()
        .set_tokens(&expired_token(), Some("refresh-1"))
        .unwrap();

    let (a, b) = tokio::join!(client.me(), client.me());
    for result in [a, b] {
        assert!(result.unwrap_err().requires_login());
    }
    refresh.assert_async().await;
}

#[tokio::test]
async fn caller_headers_win_except_authorization() {
    let mut server = Server::new_async().await;
    let token = valid_token();
    let mock = server
        .mock("PUT", "/api/community/posts/1")
        .match_header("authorization", format!("Bearer {}", token).as_str())
        .match_header("content-type", "application/merge-patch+json")
        .match_header("x-request-id", "req-42")
        .match_body(Matcher::Json(json!({ "title": "Edited" })))
        .with_status(200)
        .with_body(envelope(json!({})))
        .create_async()
        .await;

    let client = client_for(&server.url());
    client.tokens().set_tokens(&token, None).unwrap();

    let options = RequestOptions::new()
        .json(&json!({ "title": "Edited" }))
        .unwrap()
        .header(AUTHORIZATION, HeaderValue::from_static("Bearer forged"))
        .header(
            CONTENT_TYPE,
            HeaderValue::from_static("application/merge-patch+json"),
        )
        .header(
            reqwest::header::HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("req-42"),
        );

    client
        .send_authenticated::<serde_json::Value>(
            Method::PUT,
            "/api/community/posts/1",
            options,
            "Update failed",
        )
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn login_stores_token_pair() {
    let mut server = Server::new_async().await;
    let access = valid_token();
    let login = server
        .mock("POST", "/api/auth/login")
        .match_body(Matcher::Json(json!({
            "email": "member@example.org",
            "password": "hunter2",
            "service_type": "site"
        })))
        .with_status(200)
        .with_body(envelope(json!({
            "user": user_json(),
            "access_token": access,
            "refresh_token": "refresh-1",
            "expires_in": 3600
        })))
        .create_async()
        .await;

    let client = client_for(&server.url());
    assert!(!client.is_authenticated());

    let user = client.login("member@example.org", "hunter2").await.unwrap();
    assert_eq!(user.name, "Member");
    assert!(client.is_authenticated());
    assert_eq!(client.tokens().refresh_token().as_deref(), Some("refresh-1"));
    login.assert_async().await;
}

#[tokio::test]
async fn login_failure_surfaces_backend_message() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/auth/login")
        .with_status(401)
        .with_body(failure("Invalid email or password"))
        .create_async()
        .await;

    let client = client_for(&server.url());
    let err = client.login("member@example.org", "wrong").await.unwrap_err();

    assert_eq!(err.to_string(), "Invalid email or password");
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn logout_clears_tokens_even_when_server_fails() {
    let mut server = Server::new_async().await;
    let logout = server
        .mock("POST", "/api/auth/logout")
        .with_status(500)
        .expect(1)
        .create_async()
        .await;

    let client = signed_in_client(&server.url());
    client.logout().await.unwrap();

    assert!(client.tokens().access_token().is_none());
    logout.assert_async().await;
}

#[tokio::test]
async fn admin_session_uses_admin_endpoints() {
    let mut server = Server::new_async().await;
    let fresh = valid_token();
    let refresh = server
        .mock("POST", "/api/auth/refresh")
        .match_body(Matcher::PartialJson(json!({ "service_type": "admin" })))
        .with_status(200)
        .with_body(envelope(json!({
            "access_token": fresh,
            "refresh_token": "admin-refresh-2"
        })))
        .create_async()
        .await;
    let me = server
        .mock("GET", "/api/admin/me")
        .with_status(200)
        .with_body(envelope(user_json()))
        .create_async()
        .await;

    let mut config = minsul_core::ClientConfig::new(server.url(), minsul_core::ServiceType::Admin);
    config.http_timeout = std::time::Duration::from_secs(10);
    let client = minsul_api_client::ApiClient::new(config).unwrap();
    client
        .tokens()
        .set_tokens(&expired_token(), Some("admin-refresh-1"))
        .unwrap();

    client.me().await.unwrap();
    refresh.assert_async().await;
    me.assert_async().await;
}

#[tokio::test]
async fn admin_login_names_admin_service() {
    let mut server = Server::new_async().await;
    let login = server
        .mock("POST", "/api/admin/login")
        .match_body(Matcher::Json(json!({
            "email": "admin@example.org",
            "password": "hunter2",
            "service_type": "admin"
        })))
        .with_status(200)
        .with_body(envelope(json!({
            "user": user_json(),
            "access_token": valid_token(),
            "refresh_token": "admin-refresh-1"
        })))
        .create_async()
        .await;

    let client = admin_client_for(&server.url());
    client.login("admin@example.org", "hunter2").await.unwrap();

    assert!(client.is_authenticated());
    assert_eq!(
        client.tokens().refresh_token().as_deref(),
        Some("admin-refresh-1")
    );
    login.assert_async().await;
}

#[tokio::test]
async fn file_storage_keeps_session_across_clients() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("tokens.json");
    let server = Server::new_async().await;

    let first = client_with_storage(&server.url(), Arc::new(FileStorage::open(&path).unwrap()));
    first
        .tokens()
        .set_tokens(&valid_token(), Some("refresh-1"))
        .unwrap();

    let second = client_with_storage(&server.url(), Arc::new(FileStorage::open(&path).unwrap()));
    assert!(second.is_authenticated());
    assert_eq!(second.tokens().refresh_token().as_deref(), Some("refresh-1"));
}
