//! REST client for the marketplace API.

use parking_lot::RwLock;
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::error::{handle_error, ClientError};
use crate::models::{EventBatch, NewTaxonomyItem, Page, TaxonomyItem, TaxonomyKind};

/// Default base URL when `MARKETPLACE_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Where a client lands after its session is rejected.
pub const SIGNIN_PATH: &str = "/signin";

/// Paths whose 401s are reported to the caller without ending the session.
const SESSION_EXEMPT_PATHS: [&str; 2] = ["/auth/login", "/cart"];

#[derive(Debug, Default)]
struct Session {
    token: Option<String>,
    redirect_to: Option<String>,
}

/// API client with bearer auth, per-request deadlines and retries.
///
/// Cloning is cheap; clones share the session.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    session: Arc<RwLock<Session>>,
    timeout: Duration,
    retry_delay: Duration,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("token", &self.session.read().token.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http_client(base_url, reqwest::Client::new())
    }

    /// Use your own `reqwest::Client`.
    pub fn with_http_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            session: Arc::new(RwLock::new(Session::default())),
            timeout: DEFAULT_TIMEOUT,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Base URL from `MARKETPLACE_API_URL`.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("MARKETPLACE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::new(base_url)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&self, token: impl Into<String>) {
        self.session.write().token = Some(token.into());
    }

    pub fn token(&self) -> Option<String> {
        self.session.read().token.clone()
    }

    pub fn clear_session(&self) {
        self.session.write().token = None;
    }

    /// Pending redirect left by a rejected session, cleared on read.
    pub fn take_redirect(&self) -> Option<String> {
        self.session.write().redirect_to.take()
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ClientError> {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| ClientError::network(format!("Invalid URL: {}", e)))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// One request with the client's default deadline.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<T, ClientError> {
        self.request_with_timeout(method, path, query, body, self.timeout)
            .await
    }

    /// One request, abandoned after `timeout`.
    pub async fn request_with_timeout<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
        timeout: Duration,
    ) -> Result<T, ClientError> {
        let url = self.url(path, query)?;
        let mut builder = self.http.request(method.clone(), url);
        if let Some(token) = self.token() {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        // The deadline covers the body as well as the headers.
        let exchange = async {
            let response = builder.send().await?;
            let status = response.status();
            let bytes = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, bytes))
        };
        let (status, bytes) = match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ClientError::timeout(format!(
                    "{} {} timed out after {:?}",
                    method, path, timeout
                )))
            }
        };
        let payload: Option<Value> = serde_json::from_slice(&bytes).ok();

        if status.is_success() {
            let payload = payload.unwrap_or(Value::Null);
            let data = match payload {
                Value::Object(mut map) if map.contains_key("success") => {
                    map.remove("data").unwrap_or(Value::Null)
                }
                other => other,
            };
            return serde_json::from_value(data).map_err(|e| ClientError::decode(e.to_string()));
        }

        let message = payload
            .as_ref()
            .and_then(|p| p.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        let err = ClientError::http(status.as_u16(), message, payload);

        if status == StatusCode::UNAUTHORIZED {
            self.on_unauthorized(path);
        }
        Err(err)
    }

    fn on_unauthorized(&self, path: &str) {
        if SESSION_EXEMPT_PATHS.iter().any(|exempt| path.contains(exempt)) {
            return;
        }
        log::warn!("Session rejected on {}; signing out", path);
        let mut session = self.session.write();
        session.token = None;
        session.redirect_to = Some(SIGNIN_PATH.to_string());
    }

    /// Repeat a request while it fails with a retryable error, waiting the
    /// configured delay between attempts. `max_retries` counts extra attempts.
    pub async fn request_with_retry<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        max_retries: u32,
    ) -> Result<T, ClientError> {
        let mut attempt = 0;
        loop {
            match self.request(method.clone(), path, &[], body).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let handled = handle_error(&err);
                    if !handled.can_retry || attempt >= max_retries {
                        return Err(err);
                    }
                    attempt += 1;
                    log::debug!(
                        "{} {} failed ({}), retry {}/{}",
                        method,
                        path,
                        handled.kind,
                        attempt,
                        max_retries
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.request(Method::GET, path, &[], None).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let body = to_value(body)?;
        self.request(Method::POST, path, &[], Some(&body)).await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let body = to_value(body)?;
        self.request(Method::PUT, path, &[], Some(&body)).await
    }

    pub async fn patch<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.request(Method::PATCH, path, &[], None).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.request(Method::DELETE, path, &[], None).await
    }

    // ==================== Resource helpers ====================

    pub async fn list_taxonomy(
        &self,
        kind: TaxonomyKind,
        page: u32,
        limit: u32,
    ) -> Result<Page<TaxonomyItem>, ClientError> {
        let path = format!("/v1/{}", kind.collection());
        let query = [("page", page.to_string()), ("limit", limit.to_string())];
        self.request(Method::GET, &path, &query, None).await
    }

    pub async fn create_taxonomy(
        &self,
        kind: TaxonomyKind,
        item: &NewTaxonomyItem,
    ) -> Result<TaxonomyItem, ClientError> {
        self.post(&format!("/v1/{}", kind.collection()), item).await
    }

    /// Send an analytics batch. Returns the server's accepted count.
    pub async fn send_events(&self, batch: &EventBatch) -> Result<usize, ClientError> {
        let body: Value = self.post("/v1/analytics/events", batch).await?;
        Ok(body
            .get("accepted")
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or(batch.events.len()))
    }
}

fn to_value<B: Serialize + ?Sized>(body: &B) -> Result<Value, ClientError> {
    serde_json::to_value(body).map_err(|e| ClientError::decode(e.to_string()))
}
