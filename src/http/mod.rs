//! HTTP client wrapper for the poetry backend
//!
//! One `reqwest::Client` serves both API versions. Each request:
//! - targets `{base_url}{version prefix}/{segments...}` with path segments
//!   percent-encoded (author names are usually CJK),
//! - uses the per-version timeout,
//! - carries `Authorization: Bearer <token>` when the session has one.
//!
//! Error responses are normalized into `ApiError`. A 401 expires the shared
//! session, which broadcasts `SessionEvent::Expired`; navigation is left to
//! whoever subscribes. There are no retries.

mod error;

pub use error::ApiError;

use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ApiConfig;
use crate::store::SharedSession;

use error::error_message;

/// Which versioned API family a request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    /// Content: poems, authors, catalog, search
    V1,
    /// Accounts: auth and user profiles
    V2,
}

/// Configured request sender shared by the API modules
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    config: ApiConfig,
    session: SharedSession,
}

impl ApiClient {
    /// Build the client
    ///
    /// # Errors
    /// Returns `ApiError::Build` if the TLS backend cannot be initialized
    pub fn new(config: ApiConfig, session: SharedSession) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("shici/", env!("CARGO_PKG_VERSION")))
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| ApiError::Build(e.to_string()))?;

        tracing::debug!(
            "HTTP client ready: {} (content {}, auth {})",
            config.base_url,
            config.content_prefix,
            config.auth_prefix
        );

        Ok(Self {
            client,
            config,
            session,
        })
    }

    /// Session this client reads tokens from and expires on 401
    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn prefix(&self, version: ApiVersion) -> &str {
        match version {
            ApiVersion::V1 => &self.config.content_prefix,
            ApiVersion::V2 => &self.config.auth_prefix,
        }
    }

    fn timeout(&self, version: ApiVersion) -> Duration {
        match version {
            ApiVersion::V1 => self.config.content_timeout(),
            ApiVersion::V2 => self.config.auth_timeout(),
        }
    }

    /// Full URL for `segments` under the version prefix
    pub fn url(&self, version: ApiVersion, segments: &[&str]) -> Result<Url, ApiError> {
        let root = format!("{}{}", self.config.base_url, self.prefix(version));
        let mut url = Url::parse(&root).map_err(|e| ApiError::InvalidUrl(format!("{root}: {e}")))?;

        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(format!("{root}: cannot be a base")))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    /// GET with query parameters
    pub async fn get<T, Q>(&self, version: ApiVersion, segments: &[&str], query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = self.url(version, segments)?;
        let request = self.client.get(url.clone()).query(query);
        self.send(version, Method::GET, &url, request).await
    }

    /// POST a JSON body
    pub async fn post<T, B>(&self, version: ApiVersion, segments: &[&str], body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(version, segments)?;
        let request = self.client.post(url.clone()).json(body);
        self.send(version, Method::POST, &url, request).await
    }

    /// PUT a JSON body
    pub async fn put<T, B>(&self, version: ApiVersion, segments: &[&str], body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(version, segments)?;
        let request = self.client.put(url.clone()).json(body);
        self.send(version, Method::PUT, &url, request).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        version: ApiVersion,
        method: Method,
        url: &Url,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let mut request = request.timeout(self.timeout(version));
        if let Some(token) = self.session.bearer_token() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!("{} {} failed: {}", method, url.path(), e);
            ApiError::from_transport(e)
        })?;

        let status = response.status();
        tracing::debug!("{} {} -> {}", method, url.path(), status.as_u16());

        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ApiError::Decode(e.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(status, &body);

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("{} {} rejected credentials: {}", method, url.path(), message);
            self.session.expire();
            return Err(ApiError::Unauthorized { message });
        }

        tracing::debug!("{} {} error body: {}", method, url.path(), message);
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }
}
