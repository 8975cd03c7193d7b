//! Shared fixtures for the client integration tests.
#![allow(dead_code)]

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use minsul_api_client::{ApiClient, MemoryStorage, TokenStorage};
use minsul_core::{ClientConfig, ServiceType, UploadPolicy};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Unsigned JWT whose `exp` lies `offset_secs` from now.
pub fn jwt(offset_secs: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let exp = chrono::Utc::now().timestamp() + offset_secs;
    let payload = URL_SAFE_NO_PAD.encode(json!({ "sub": "user-1", "exp": exp }).to_string());
    format!("{}.{}.signature", header, payload)
}

pub fn valid_token() -> String {
    jwt(3600)
}

pub fn expired_token() -> String {
    jwt(-60)
}

/// Small limits so payloads stay readable in request matchers.
pub fn small_policy() -> UploadPolicy {
    UploadPolicy {
        max_file_size: 1024,
        chunk_threshold: 16,
        chunk_size: 8,
        inter_chunk_delay: Duration::from_millis(1),
        simple_upload_timeout: Duration::from_secs(5),
    }
}

pub fn client_for(url: &str) -> ApiClient {
    client_with_storage(url, Arc::new(MemoryStorage::new()))
}

pub fn client_with_storage(url: &str, storage: Arc<dyn TokenStorage>) -> ApiClient {
    let mut config = ClientConfig::new(url, ServiceType::Site);
    config.http_timeout = Duration::from_secs(10);
    ApiClient::with_storage(config, storage).expect("client builds")
}

/// Client already holding an unexpired token pair.
pub fn signed_in_client(url: &str) -> ApiClient {
    let client = client_for(url);
    client
        .tokens()
        .set_tokens(&valid_token(), Some("refresh-1"))
        .expect("tokens stored");
    client
}

pub fn admin_client_for(url: &str) -> ApiClient {
    let mut config = ClientConfig::new(url, ServiceType::Admin);
    config.http_timeout = Duration::from_secs(10);
    ApiClient::with_storage(config, Arc::new(MemoryStorage::new())).expect("client builds")
}

/// Admin console client already holding an unexpired token pair.
pub fn signed_in_admin(url: &str) -> ApiClient {
    let client = admin_client_for(url);
    client
        .tokens()
        .set_tokens(&valid_token(), Some("admin-refresh-1"))
        .expect("tokens stored");
    client
}

pub fn envelope(data: serde_json::Value) -> String {
    json!({ "success": true, "data": data }).to_string()
}

pub fn failure(message: &str) -> String {
    json!({ "success": false, "message": message }).to_string()
}

/// Regex matching one multipart text field with an exact value.
pub fn form_field(name: &str, value: &str) -> mockito::Matcher {
    mockito::Matcher::Regex(format!(
        r#"name="{}"\r\n\r\n{}\r\n"#,
        regex_escape(name),
        regex_escape(value)
    ))
}

fn regex_escape(raw: &str) -> String {
    raw.chars()
        .flat_map(|c| {
            let escape = "\\.+*?()|[]{}^$#&-~".contains(c);
            escape.then_some('\\').into_iter().chain(std::iter::once(c))
        })
        .collect()
}
