//! Authenticated API client
//!
//! Attaches the stored access token to every request. A 401 response
//! triggers at most one refresh per request; concurrent 401s share a
//! single refresh through the [`RefreshCoordinator`] and are replayed
//! with the token it produced.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{BarfikError, Result};
use crate::io::{HttpClient, HttpRequest, HttpResponse, Method};
use crate::models::AccessToken;
use crate::refresh::{Admission, RefreshCoordinator, RefreshLease};
use crate::session::{Navigator, TokenStore};

const REFRESH_PATH: &str = "/api/auth/refresh/";

/// A request relative to the API base URL
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    anonymous: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            anonymous: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Append query parameters
    pub fn query<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Attach a JSON body
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Send without a bearer token and never enter the refresh flow
    ///
    /// Used for the auth endpoints, where a 401 means bad credentials.
    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// HTTP client wrapper that owns the token refresh flow
pub struct ApiClient {
    base_url: String,
    http: Arc<dyn HttpClient>,
    tokens: TokenStore,
    navigator: Arc<dyn Navigator>,
    refresh: RefreshCoordinator,
    refresh_timeout: Option<Duration>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("refresh_timeout", &self.refresh_timeout)
            .finish()
    }
}

impl ApiClient {
    pub fn new(
        config: &Config,
        http: Arc<dyn HttpClient>,
        tokens: TokenStore,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let base_url = config.api_base_url.trim_end_matches('/').to_string();
        debug!("Created ApiClient for {}", base_url);
        Self {
            base_url,
            http,
            tokens,
            navigator,
            refresh: RefreshCoordinator::new(),
            refresh_timeout: config.session.refresh_timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn refresh_coordinator(&self) -> &RefreshCoordinator {
        &self.refresh
    }

    /// Send a request and return the successful response
    ///
    /// Non-2xx statuses are converted with [`BarfikError::from_response`].
    pub async fn send(&self, request: &ApiRequest) -> Result<HttpResponse> {
        if request.anonymous {
            let response = self.dispatch(request, None).await?;
            return check(response);
        }

        let sent_token = self.tokens.access_token();
        let response = self.dispatch(request, sent_token.clone()).await?;
        if response.status != 401 {
            return check(response);
        }

        debug!("{} {} returned 401", request.method, request.path);
        let token = match self.refresh.admit().await {
            Admission::Queued(rx) => match rx.await {
                Ok(Ok(token)) => token,
                Ok(Err(reason)) => return Err(BarfikError::SessionExpired(reason)),
                Err(_) => {
                    return Err(BarfikError::SessionExpired(
                        "token refresh was abandoned".to_string(),
                    ))
                }
            },
            Admission::Leader(lease) => self.lead_refresh(lease, sent_token.as_deref()).await?,
        };

        // The retry is final: a second 401 is returned as-is
        let retried = self.dispatch(request, Some(token)).await?;
        check(retried)
    }

    /// Send and decode a JSON response body
    pub async fn send_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T> {
        let response = self.send(request).await?;
        Ok(serde_json::from_str(&response.body)?)
    }

    /// Send and discard the response body
    pub async fn send_empty(&self, request: &ApiRequest) -> Result<()> {
        self.send(request).await.map(|_| ())
    }

    async fn dispatch(&self, request: &ApiRequest, bearer: Option<String>) -> Result<HttpResponse> {
        let http_request = HttpRequest {
            method: request.method,
            url: format!("{}{}", self.base_url, request.path),
            query: request.query.clone(),
            body: request.body.clone(),
            bearer,
        };
        self.http.send(&http_request).await
    }

    async fn lead_refresh(
        &self,
        lease: RefreshLease<'_>,
        sent_token: Option<&str>,
    ) -> Result<String> {
        // A refresh that settled after this request left already rotated the token
        if let Some(current) = self.tokens.access_token() {
            if sent_token != Some(current.as_str()) {
                debug!("Access token already rotated, retrying without refresh");
                lease.succeed(&current).await;
                return Ok(current);
            }
        }

        let Some(refresh_token) = self.tokens.refresh_token() else {
            warn!("No refresh token stored, ending session");
            self.end_session();
            lease.fail("no refresh token").await;
            return Err(BarfikError::SessionExpired("no refresh token".to_string()));
        };

        match self.call_refresh(&refresh_token).await {
            Ok(access) => {
                self.tokens.set_access_token(&access);
                lease.succeed(&access).await;
                info!("Access token refreshed");
                Ok(access)
            }
            Err(e) => {
                warn!("Token refresh failed: {}", e);
                let reason = format!("token refresh failed: {}", e);
                self.end_session();
                lease.fail(&reason).await;
                Err(BarfikError::SessionExpired(reason))
            }
        }
    }

    /// POST the refresh token straight to the transport, bypassing `send`
    async fn call_refresh(&self, refresh_token: &str) -> Result<String> {
        let request = HttpRequest {
            method: Method::Post,
            url: format!("{}{}", self.base_url, REFRESH_PATH),
            query: Vec::new(),
            body: Some(serde_json::json!({ "refresh": refresh_token })),
            bearer: None,
        };

        let response = match self.refresh_timeout {
            Some(limit) => tokio::time::timeout(limit, self.http.send(&request))
                .await
                .map_err(|_| {
                    BarfikError::Network(format!("refresh timed out after {:?}", limit))
                })??,
            None => self.http.send(&request).await?,
        };

        let response = check(response)?;
        let token: AccessToken = serde_json::from_str(&response.body)?;
        Ok(token.access)
    }

    fn end_session(&self) {
        self.tokens.clear();
        self.navigator.redirect_to_login();
    }
}

fn check(response: HttpResponse) -> Result<HttpResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(BarfikError::from_response(response.status, &response.body))
    }
}
