//! Authenticated API client for the Etuni backend.
//!
//! Every call goes through `auth_fetch`, which attaches the current bearer
//! token and tears the session down when the backend answers 401 or 403.

use std::sync::Arc;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::error::ApiError;
use super::response::ApiResponse;
use super::transport::{HttpTransport, OutboundRequest, ReqwestTransport};
use crate::auth::token::redact;
use crate::auth::TokenStore;

/// Header required by the development tunnel in front of the backend
const TUNNEL_BYPASS_HEADER: &str = "ngrok-skip-browser-warning";

/// Method, extra headers and body for one call.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: Vec::new(),
            body: None,
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn delete() -> Self {
        Self::method(Method::DELETE)
    }

    pub fn method(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// Request with a JSON-serialized body
    pub fn json<B: Serialize + ?Sized>(method: Method, body: &B) -> Result<Self, ApiError> {
        let body = serde_json::to_string(body).map_err(ApiError::Encode)?;
        Ok(Self {
            method,
            headers: Vec::new(),
            body: Some(body),
        })
    }

    /// Add a header; it overrides a default header of the same name
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// API client for the Etuni backend.
/// Clone is cheap - the transport and token store are shared.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    tokens: Arc<TokenStore>,
}

impl ApiClient {
    /// Create a client that sends requests with `reqwest`
    pub fn new(base_url: &str, tokens: Arc<TokenStore>) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new()?;
        Ok(Self::with_transport(base_url, tokens, Arc::new(transport)))
    }

    pub fn with_transport(
        base_url: &str,
        tokens: Arc<TokenStore>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    /// Send an authenticated request to `path` (relative to the base URL).
    ///
    /// The response is returned whatever its status. A 401 or 403 also clears
    /// the session before returning. Network failures are returned as errors
    /// and leave the session alone.
    pub async fn auth_fetch(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.url_for(path)?;
        let token = self.tokens.get_token().await;
        let response = self
            .send_with_token(path, url, options, token.as_deref())
            .await?;
        if response.is_auth_rejection() {
            let status = response.status().as_u16();
            warn!(path, status, "Backend rejected session token, clearing session");
            self.tokens.invalidate(status, path);
        }
        Ok(response)
    }

    /// Send a request with a token the caller already read, without session
    /// side effects. A 401 or 403 is returned like any other response.
    pub(crate) async fn fetch_with_token(
        &self,
        path: &str,
        options: RequestOptions,
        token: Option<&str>,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.url_for(path)?;
        self.send_with_token(path, url, options, token).await
    }

    async fn send_with_token(
        &self,
        path: &str,
        url: String,
        options: RequestOptions,
        token: Option<&str>,
    ) -> Result<ApiResponse, ApiError> {
        debug!(
            method = %options.method,
            path,
            token = token.map(redact).as_deref().unwrap_or("NULL"),
            "Dispatching request"
        );

        let mut headers = Self::merged_headers(&options.headers)?;
        if let Some(token) = token {
            headers.insert(header::AUTHORIZATION, Self::bearer(token)?);
        }
        self.send(options, url, headers).await
    }

    /// Send a request without a token and without session side effects
    /// (login, public listings).
    pub(crate) async fn public_fetch(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.url_for(path)?;
        debug!(method = %options.method, path, "Dispatching public request");
        let headers = Self::merged_headers(&options.headers)?;
        self.send(options, url, headers).await
    }

    async fn send(
        &self,
        options: RequestOptions,
        url: String,
        headers: HeaderMap,
    ) -> Result<ApiResponse, ApiError> {
        let request = OutboundRequest {
            method: options.method,
            url,
            headers,
            body: options.body,
        };
        let response = self
            .transport
            .execute(request)
            .await
            .inspect_err(|e| warn!(error = %e, "Request failed before a response arrived"))?;
        Ok(response)
    }

    // ===== Typed helpers =====

    /// GET `path` and unwrap the `data` field of a successful response
    pub async fn get_data<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.auth_fetch(path, RequestOptions::get())
            .await?
            .error_for_status()?
            .data()
    }

    /// Send `body` as JSON and unwrap the `data` field of a successful response
    pub async fn send_data<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.auth_fetch(path, RequestOptions::json(method, body)?)
            .await?
            .error_for_status()?
            .data()
    }

    fn url_for(&self, path: &str) -> Result<String, ApiError> {
        if !path.starts_with('/') {
            return Err(ApiError::InvalidPath(path.to_string()));
        }
        Ok(format!("{}{}", self.base_url, path))
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(TUNNEL_BYPASS_HEADER, HeaderValue::from_static("1"));
        headers
    }

    /// Defaults first, then caller headers; a caller header replaces a default
    /// of the same (case-insensitive) name.
    fn merged_headers(extra: &[(String, String)]) -> Result<HeaderMap, ApiError> {
        let mut headers = Self::default_headers();
        for (name, value) in extra {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ApiError::InvalidHeader(name.clone()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| ApiError::InvalidHeader(name.to_string()))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }

    fn bearer(token: &str) -> Result<HeaderValue, ApiError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ApiError::InvalidHeader(header::AUTHORIZATION.to_string()))?;
        value.set_sensitive(true);
        Ok(value)
    }
}
