//! HTTP client for the Minsul API.
//!
//! [`ApiClient`] wraps one application session (public site or admin console):
//! it keeps the bearer tokens in a [`TokenStore`], attaches them to every
//! authenticated request, refreshes them once when they expire, and exposes the
//! chunked upload orchestrator plus typed community, site and admin console
//! endpoints. The CLI uses this client directly.

pub mod admin;
pub mod api;
pub mod auth;
pub mod error;
pub mod store;
pub mod token_store;
pub mod upload;

use minsul_core::{ApiResponse, ClientConfig, ServiceType, UploadPolicy};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::Mutex;

pub use auth::{RequestBody, RequestOptions};
pub use error::{ClientError, ClientResult, LogLevel};
pub use store::{AdminController, AuthController, CommunityController, Store};
pub use token_store::{is_expired, FileStorage, MemoryStorage, TokenStorage, TokenStore};
pub use upload::{ProgressCallback, UploadEvent, UploadOptions, UploadSource, UploadState};

/// HTTP client for the Minsul API bound to one application session.
///
/// Cloning is cheap; clones share the HTTP connection pool, the token store
/// and the refresh guard.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    tokens: TokenStore,
    refresh_path: String,
    upload_policy: UploadPolicy,
    refresh_gate: Arc<Mutex<Option<auth::RefreshOutcome>>>,
}

impl ApiClient {
    /// Build a client from configuration, opening the token file when one is set.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let storage: Arc<dyn TokenStorage> = match &config.token_file {
            Some(path) => Arc::new(FileStorage::open(path)?),
            None => Arc::new(MemoryStorage::new()),
        };
        Self::with_storage(config, storage)
    }

    /// Build a client over an existing token storage.
    pub fn with_storage(config: ClientConfig, storage: Arc<dyn TokenStorage>) -> ClientResult<Self> {
        let client = Client::builder().timeout(config.http_timeout).build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            tokens: TokenStore::new(storage, config.service_type),
            refresh_path: config.refresh_path,
            upload_policy: config.upload,
            refresh_gate: Arc::new(Mutex::new(None)),
        })
    }

    /// Create client from environment (see [`ClientConfig::from_env`]).
    pub fn from_env() -> anyhow::Result<Self> {
        let config = ClientConfig::from_env()?;
        Ok(Self::new(config)?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn service_type(&self) -> ServiceType {
        self.tokens.service_type()
    }

    pub fn upload_policy(&self) -> &UploadPolicy {
        &self.upload_policy
    }

    /// Replace the upload policy for this client and its future clones.
    pub fn with_upload_policy(mut self, policy: UploadPolicy) -> Self {
        self.upload_policy = policy;
        self
    }

    /// Raw client for custom requests. Caller must apply auth itself.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Unauthenticated GET returning the envelope.
    pub async fn get_public<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        fallback: &str,
    ) -> ClientResult<ApiResponse<T>> {
        let mut request = self.client.get(self.build_url(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = request.send().await?;
        read_envelope(response, fallback).await
    }

    /// Unauthenticated POST with a JSON body returning the envelope.
    pub async fn post_public<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> ClientResult<ApiResponse<T>> {
        let response = self
            .client
            .post(self.build_url(path))
            .json(body)
            .send()
            .await?;
        read_envelope(response, fallback).await
    }

    /// Authenticated request returning the envelope.
    pub async fn send_authenticated<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        options: RequestOptions,
        fallback: &str,
    ) -> ClientResult<ApiResponse<T>> {
        let response = self.authenticated_fetch(method, path, options).await?;
        read_envelope(response, fallback).await
    }
}

/// Check status and envelope; failures become [`ClientError::ApiError`] carrying
/// the backend message or `fallback`.
pub async fn read_envelope<T: DeserializeOwned>(
    response: Response,
    fallback: &str,
) -> ClientResult<ApiResponse<T>> {
    let status = response.status();
    let text = response.text().await?;

    match serde_json::from_str::<ApiResponse<T>>(&text) {
        Ok(envelope) if status.is_success() && envelope.success => Ok(envelope),
        Ok(envelope) => {
            tracing::debug!(status = %status, "API reported failure");
            Err(ClientError::api(envelope.error_message(fallback)))
        }
        Err(e) if status.is_success() => Err(ClientError::Decode(format!(
            "Failed to parse response as JSON: {}",
            e
        ))),
        Err(_) => {
            // Non-envelope error bodies (proxies, panics) may still carry a message.
            let message = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string());
            tracing::debug!(status = %status, body = %text, "API request failed");
            Err(ClientError::api(message))
        }
    }
}

/// Extract `data`, treating an empty successful envelope as a protocol error.
pub(crate) fn require_data<T>(envelope: ApiResponse<T>, fallback: &str) -> ClientResult<T> {
    envelope
        .data
        .ok_or_else(|| ClientError::Decode(format!("{}: response carried no data", fallback)))
}

// Re-export domain types for convenience.
pub use minsul_core::models::{
    AdminQuery, AuthResponse, Board, BoardRequest, CalendarEvent, Category, CommentDetail,
    CreateCommentRequest, CreatePostRequest, DashboardStats, LikeStatus, LikeToggle, ManagedUser,
    MenuTree, Page, Pagination, PostDetail, PostPage, PostQuery, SiteMenus, TokenPair,
    UpdateCommentRequest, UpdatePostRequest, UpdateUserRequest, UploadCategory, UploadProgress,
    UploadResult, User, UserStatus,
};
