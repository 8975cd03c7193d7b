//! Authenticated request wrapper.
//!
//! Attaches the bearer token to outgoing requests, refreshes an expired token
//! once before sending, and treats HTTP 401 as the end of the session. Refresh
//! is single-flight: concurrent callers holding the same stale token share one
//! refresh round-trip.

use minsul_core::models::RefreshRequest;
use minsul_core::{ApiResponse, TokenPair};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::multipart::Form;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};
use crate::token_store::is_expired;
use crate::ApiClient;

/// Body of an authenticated request
#[derive(Debug)]
pub enum RequestBody {
    Json(serde_json::Value),
    Multipart(Form),
}

/// Caller-supplied parts of an authenticated request.
///
/// Caller headers win over defaults except `Authorization`, which the wrapper
/// always sets.
#[derive(Debug, Default)]
pub struct RequestOptions {
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> ClientResult<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| ClientError::Decode(format!("Failed to serialize request body: {}", e)))?;
        self.body = Some(RequestBody::Json(value));
        Ok(self)
    }

    pub fn multipart(mut self, form: Form) -> Self {
        self.body = Some(RequestBody::Multipart(form));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn apply(self, mut request: RequestBuilder) -> RequestBuilder {
        if !self.query.is_empty() {
            request = request.query(&self.query);
        }
        request = match self.body {
            Some(RequestBody::Json(value)) => request.json(&value),
            Some(RequestBody::Multipart(form)) => request.multipart(form),
            None => request,
        };
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        // Last, so caller headers replace the ones the body set.
        request.headers(self.headers)
    }
}

/// Result of the last refresh, keyed by the token it replaced.
#[derive(Debug)]
pub(crate) struct RefreshOutcome {
    stale: String,
    fresh: Option<String>,
}

impl ApiClient {
    /// Send an authenticated request and return the raw response.
    ///
    /// Fails with [`ClientError::NoCredential`] without touching the network when
    /// no access token is stored, and with [`ClientError::SessionExpired`] (after
    /// clearing the tokens) when refresh fails or the server answers 401.
    pub async fn authenticated_fetch(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> ClientResult<Response> {
        let token = self.tokens.access_token().ok_or(ClientError::NoCredential)?;
        let token = if is_expired(&token) {
            self.refresh_access_token(&token).await?
        } else {
            token
        };

        let builder = options.apply(self.client.request(method, self.build_url(path)));
        let mut request = builder.build()?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            ClientError::Decode("stored access token is not a valid header value".to_string())
        })?;
        request.headers_mut().insert(AUTHORIZATION, bearer);

        let response = self.client.execute(request).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!(path = %path, "server rejected bearer token; ending session");
            self.end_session();
            return Err(ClientError::SessionExpired);
        }

        Ok(response)
    }

    /// Exchange the refresh token for a new pair, at most once per stale token.
    async fn refresh_access_token(&self, stale: &str) -> ClientResult<String> {
        let mut last = self.refresh_gate.lock().await;

        if let Some(outcome) = last.as_ref().filter(|o| o.stale == stale) {
            debug!("reusing refresh outcome from a concurrent request");
            return outcome.fresh.clone().ok_or(ClientError::SessionExpired);
        }

        // A login may have replaced the token while we waited for the gate.
        if let Some(current) = self.tokens.access_token() {
            if current != stale && !is_expired(&current) {
                return Ok(current);
            }
        }

        match self.refresh_round_trip().await {
            Ok(pair) => {
                self.tokens.set_pair(&pair)?;
                info!(service = %self.service_type(), "access token refreshed");
                *last = Some(RefreshOutcome {
                    stale: stale.to_string(),
                    fresh: Some(pair.access_token.clone()),
                });
                Ok(pair.access_token)
            }
            Err(e) => {
                warn!(error = %e, "token refresh failed; ending session");
                self.end_session();
                *last = Some(RefreshOutcome {
                    stale: stale.to_string(),
                    fresh: None,
                });
                Err(ClientError::SessionExpired)
            }
        }
    }

    async fn refresh_round_trip(&self) -> ClientResult<TokenPair> {
        let refresh_token = self
            .tokens
            .refresh_token()
            .ok_or_else(|| ClientError::api("No refresh token stored"))?;

        let body = RefreshRequest {
            refresh_token: &refresh_token,
            service_type: self.service_type(),
        };
        let response = self
            .client
            .post(self.build_url(&self.refresh_path))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::api(format!(
                "Token refresh failed with status {}",
                status
            )));
        }

        let envelope: ApiResponse<TokenPair> = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(format!("Invalid refresh response: {}", e)))?;
        if !envelope.success {
            return Err(ClientError::api(envelope.error_message("Token refresh failed")));
        }
        envelope
            .data
            .ok_or_else(|| ClientError::Decode("Refresh response carried no tokens".to_string()))
    }

    /// Clear stored tokens; a storage failure is logged, the session still ends.
    pub(crate) fn end_session(&self) {
        if let Err(e) = self.tokens.clear() {
            warn!(error = %e, "failed to clear stored tokens");
        }
    }
}
