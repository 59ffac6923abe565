//! Authenticated HTTP client with transparent access-token renewal.
//!
//! [`ApiClient`] attaches the current bearer token to every request. When the
//! backend rejects a request because the token expired, and a session
//! termination handler is installed, the client performs one refresh
//! exchange (shared by every request that fails meanwhile), replays the
//! rejected requests with the new token, and ends the session when the
//! refresh cannot succeed.

pub mod classify;
pub mod refresh;
pub mod request;

pub use classify::{classify, Failure};
pub use refresh::TokenRefreshCoordinator;
pub use request::{ApiRequest, ApiResponse};

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::auth::{TokenPair, TokenStore};
use crate::config::ClientConfig;
use crate::error::GymError;
use crate::util::with_timeout;

use refresh::Ticket;
use request::{bearer_from, bearer_value, json_headers};

/// Path of the refresh exchange.
pub const REFRESH_PATH: &str = "/sessions/refresh-token";

/// Zero-argument callback run when the session cannot be salvaged.
pub type SessionTerminationHandler = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// HTTP client for one backend origin.
///
/// Cloning is cheap; clones share the bearer header, the token store and the
/// refresh coordinator.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use ignite_gym::auth::FileTokenStore;
/// use ignite_gym::client::ApiClient;
/// use ignite_gym::config::ClientConfig;
///
/// # async fn example() -> ignite_gym::error::Result<()> {
/// let config = ClientConfig::from_env()?;
/// let store = Arc::new(FileTokenStore::new(config.data_dir.clone()));
/// let client = ApiClient::new(config, store)?;
/// let _handle = client.register_session_termination_handler(|| async {
///     eprintln!("session ended, please sign in again");
/// });
/// let groups: Vec<String> = client.get("/groups").await?.json()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    config: ClientConfig,
    default_headers: RwLock<HeaderMap>,
    token_store: Arc<dyn TokenStore>,
    coordinator: TokenRefreshCoordinator,
    interceptor: RwLock<Option<Interceptor>>,
    next_interceptor_id: AtomicU64,
}

#[derive(Clone)]
struct Interceptor {
    id: u64,
    on_terminate: SessionTerminationHandler,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.config.base_url)
            .field("authenticated", &self.access_token().is_some())
            .field("interceptor", &self.has_interceptor())
            .field("refreshing", &self.is_refreshing())
            .finish()
    }
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    token: Option<String>,
    refresh_token: Option<String>,
}

impl ApiClient {
    pub fn new(config: ClientConfig, token_store: Arc<dyn TokenStore>) -> Result<Self, GymError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| GymError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_http_client(config, token_store, http))
    }

    pub fn with_http_client(
        config: ClientConfig,
        token_store: Arc<dyn TokenStore>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                http,
                config,
                default_headers: RwLock::new(json_headers()),
                token_store,
                coordinator: TokenRefreshCoordinator::new(),
                interceptor: RwLock::new(None),
                next_interceptor_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.inner.token_store
    }

    /// Set (or with `None`, remove) the bearer token sent by default.
    pub fn set_access_token(&self, access_token: Option<&str>) -> Result<(), GymError> {
        let mut headers = self
            .inner
            .default_headers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match access_token {
            Some(token) => {
                headers.insert(AUTHORIZATION, bearer_value(token)?);
            }
            None => {
                headers.remove(AUTHORIZATION);
            }
        }
        Ok(())
    }

    /// Bearer token currently sent by default.
    pub fn access_token(&self) -> Option<String> {
        bearer_from(
            &self
                .inner
                .default_headers
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Install the response-failure interceptor that renews expired tokens.
    ///
    /// `on_terminate` runs when the session cannot be salvaged. A second
    /// registration replaces the first.
    pub fn register_session_termination_handler<F, Fut>(&self, on_terminate: F) -> InterceptorHandle
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = self.inner.next_interceptor_id.fetch_add(1, Ordering::Relaxed);
        let on_terminate: SessionTerminationHandler = Arc::new(move || on_terminate().boxed());
        let previous = self
            .inner
            .interceptor
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Interceptor { id, on_terminate });
        if previous.is_some() {
            tracing::warn!("replacing an installed session termination handler");
        }
        InterceptorHandle {
            client: Arc::downgrade(&self.inner),
            id,
        }
    }

    pub fn has_interceptor(&self) -> bool {
        self.interceptor().is_some()
    }

    /// Whether a refresh exchange is in flight.
    pub fn is_refreshing(&self) -> bool {
        self.inner.coordinator.is_refreshing()
    }

    /// Number of requests parked behind the in-flight refresh.
    pub fn pending_refreshes(&self) -> usize {
        self.inner.coordinator.pending()
    }

    /// Issue a REST call.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        headers: Option<HeaderMap>,
    ) -> Result<ApiResponse, GymError> {
        let mut request = ApiRequest::new(method, path);
        request.body = body;
        if let Some(headers) = headers {
            request = request.with_headers(headers);
        }
        self.execute(request).await
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse, GymError> {
        self.execute(ApiRequest::get(path)).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, GymError> {
        self.execute(ApiRequest::post(path).json(body)?).await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, GymError> {
        self.execute(ApiRequest::put(path).json(body)?).await
    }

    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, GymError> {
        self.execute(ApiRequest::patch(path).json(body)?).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse, GymError> {
        self.execute(ApiRequest::delete(path)).await
    }

    /// `GET` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GymError> {
        self.get(path).await?.json()
    }

    /// `POST` a JSON body and decode the JSON response.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, GymError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.post(path, body).await?.json()
    }

    /// Dispatch `request`, renewing the access token once if it was rejected
    /// as expired.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, GymError> {
        let (response, sent_with) = self.dispatch(&request, None).await?;
        if response.is_success() {
            return Ok(response);
        }
        match classify(response.status(), response.body()) {
            Failure::ExpiredToken { message } => self.recover(request, sent_with, message).await,
            failure => Err(failure.into_error()),
        }
    }

    async fn recover(
        &self,
        request: ApiRequest,
        sent_with: Option<String>,
        message: String,
    ) -> Result<ApiResponse, GymError> {
        let Some(interceptor) = self.interceptor() else {
            return Err(GymError::ExpiredToken { message });
        };

        let refresh_token = match self.inner.token_store.load().await? {
            Some(pair) if pair.has_refresh_token() => pair.refresh_token,
            _ => {
                tracing::warn!(
                    path = %request.path,
                    "access token rejected and no refresh token is stored; ending session"
                );
                (interceptor.on_terminate)().await;
                return Err(GymError::NoRefreshToken { message });
            }
        };

        let token = loop {
            match self
                .inner
                .coordinator
                .join(sent_with.as_deref(), || self.access_token())
            {
                Ticket::Renewed(token) => {
                    tracing::debug!(path = %request.path, "token already renewed; replaying");
                    break token;
                }
                Ticket::Parked(pending) => match pending.wait().await {
                    Some(outcome) => break outcome?,
                    None => {
                        tracing::debug!(path = %request.path, "token refresh abandoned; rejoining");
                    }
                },
                Ticket::Leader(lease) => {
                    tracing::info!(path = %request.path, "access token expired; refreshing");
                    let outcome = self.refresh(&refresh_token).await;
                    if let Err(error) = &outcome {
                        tracing::warn!(error = %error, "token refresh failed; ending session");
                        (interceptor.on_terminate)().await;
                    }
                    let parked = lease.settle(&outcome);
                    tracing::debug!(parked, success = outcome.is_ok(), "token refresh settled");
                    break outcome?;
                }
            }
        };

        self.replay(&request, &token).await
    }

    /// Perform the refresh exchange, persist the new pair and update the
    /// bearer header.
    async fn refresh(&self, refresh_token: &str) -> Result<String, GymError> {
        let exchange = async {
            let url = self.inner.config.url_for(REFRESH_PATH)?;
            let response = self
                .inner
                .http
                .post(&url)
                .headers(json_headers())
                .json(&RefreshRequest { refresh_token })
                .send()
                .await?;
            let response = ApiResponse::read(response).await?;
            if !response.is_success() {
                return Err(classify(response.status(), response.body()).into_error());
            }
            response.json::<RefreshResponse>()
        };
        let body = with_timeout(self.inner.config.refresh_timeout, exchange)
            .await
            .map_err(|error| GymError::RefreshFailed(error.to_string()))?;

        let access_token = body
            .token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| {
                GymError::RefreshFailed("refresh response carried no access token".to_string())
            })?;
        let refresh_token = body
            .refresh_token
            .filter(|token| !token.trim().is_empty())
            .unwrap_or_else(|| refresh_token.to_string());

        self.set_access_token(Some(&access_token))
            .map_err(|error| GymError::RefreshFailed(error.to_string()))?;
        let pair = TokenPair::new(access_token.clone(), refresh_token);
        if let Err(error) = self.inner.token_store.save(&pair).await {
            tracing::warn!(error = %error, "failed to persist refreshed tokens");
        }
        Ok(access_token)
    }

    async fn replay(&self, request: &ApiRequest, token: &str) -> Result<ApiResponse, GymError> {
        let (response, _) = self.dispatch(request, Some(token)).await?;
        if response.is_success() {
            return Ok(response);
        }
        Err(classify(response.status(), response.body()).into_error())
    }

    /// Send one attempt; returns the response and the bearer token it carried.
    async fn dispatch(
        &self,
        request: &ApiRequest,
        token_override: Option<&str>,
    ) -> Result<(ApiResponse, Option<String>), GymError> {
        let mut headers = self
            .inner
            .default_headers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        headers.extend(request.headers.clone());
        if let Some(token) = token_override {
            headers.insert(AUTHORIZATION, bearer_value(token)?);
        }
        let sent_with = bearer_from(&headers);

        let url = self.inner.config.url_for(&request.path)?;
        let mut builder = self
            .inner
            .http
            .request(request.method.clone(), &url)
            .headers(headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let response = ApiResponse::read(builder.send().await?).await?;
        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status = response.status().as_u16(),
            replay = token_override.is_some(),
            "api request completed"
        );
        Ok((response, sent_with))
    }

    fn interceptor(&self) -> Option<Interceptor> {
        self.inner
            .interceptor
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Removes the interceptor installed by
/// [`ApiClient::register_session_termination_handler`].
///
/// Dropping the handle leaves the interceptor installed.
#[derive(Debug)]
pub struct InterceptorHandle {
    client: Weak<ClientInner>,
    id: u64,
}

impl InterceptorHandle {
    /// Remove the interceptor if it is still the installed one.
    pub fn unregister(self) {
        let Some(inner) = self.client.upgrade() else {
            return;
        };
        let mut slot = inner
            .interceptor
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().map(|interceptor| interceptor.id) == Some(self.id) {
            *slot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;

    fn client() -> ApiClient {
        ApiClient::new(
            ClientConfig::new("http://127.0.0.1:9"),
            Arc::new(MemoryTokenStore::new()),
        )
        .unwrap()
    }

    #[test]
    fn bearer_header_can_be_set_and_cleared() {
        let client = client();
        assert!(client.access_token().is_none());
        client.set_access_token(Some("T1")).unwrap();
        assert_eq!(client.access_token().as_deref(), Some("T1"));
        client.set_access_token(None).unwrap();
        assert!(client.access_token().is_none());
    }

    #[test]
    fn clones_share_the_bearer_header() {
        let client = client();
        let clone = client.clone();
        client.set_access_token(Some("shared")).unwrap();
        assert_eq!(clone.access_token().as_deref(), Some("shared"));
    }

    #[test]
    fn stale_handle_does_not_remove_a_newer_interceptor() {
        let client = client();
        let first = client.register_session_termination_handler(|| async {});
        let second = client.register_session_termination_handler(|| async {});
        first.unregister();
        assert!(client.has_interceptor());
        second.unregister();
        assert!(!client.has_interceptor());
    }

    #[test]
    fn debug_output_omits_the_token() {
        let client = client();
        client.set_access_token(Some("secret-token")).unwrap();
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("authenticated: true"));
    }
}
