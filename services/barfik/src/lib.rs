//! Barfik - pet diet and shopping-list planner client
//!
//! Typed access to the Barfik REST backend: an authenticated HTTP client
//! with single-flight token refresh, a query cache with per-resource stale
//! times, form validation, and the view state a front end needs.

pub mod api;
pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod notify;
pub mod queries;
pub mod refresh;
pub mod session;
pub mod shopping;
pub mod store;
pub mod validation;

pub use api::Api;
pub use auth::AuthSession;
pub use client::{ApiClient, ApiRequest};
pub use config::{load_config, Config};
pub use error::{BarfikError, Result};
pub use notify::NotificationCenter;
pub use queries::Queries;
pub use store::UiStore;

use std::sync::Arc;

use tracing::debug;

use crate::cache::QueryCache;
use crate::io::{HttpClient, ReqwestHttpClient};
use crate::session::{LogNavigator, Navigator, SessionStorage, TokenStore};

/// Wires the client stack together from a [`Config`]
pub struct BarfikBuilder {
    config: Config,
    http: Arc<dyn HttpClient>,
    storage: Option<Arc<dyn SessionStorage>>,
    navigator: Arc<dyn Navigator>,
}

impl BarfikBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            http: Arc::new(ReqwestHttpClient::new()),
            storage: None,
            navigator: Arc::new(LogNavigator),
        }
    }

    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = http;
        self
    }

    /// Token storage; defaults to process memory
    pub fn with_storage(mut self, storage: Arc<dyn SessionStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn build(self) -> Result<Barfik> {
        self.config.validate()?;
        let tokens = match self.storage {
            Some(storage) => TokenStore::new(storage),
            None => TokenStore::in_memory(),
        };
        let client = Arc::new(ApiClient::new(
            &self.config,
            self.http,
            tokens,
            self.navigator,
        ));
        let queries = Queries::new(
            Api::new(client),
            Arc::new(QueryCache::new()),
            self.config.cache.clone(),
        );
        debug!("Barfik client ready for {}", self.config.api_base_url);
        Ok(Barfik {
            auth: AuthSession::new(queries.clone()),
            notifications: NotificationCenter::new(&self.config.notifications),
            ui: UiStore::new(),
            queries,
            config: self.config,
        })
    }
}

/// A fully wired client session
#[derive(Debug)]
pub struct Barfik {
    pub config: Config,
    pub queries: Queries,
    pub auth: AuthSession,
    pub notifications: NotificationCenter,
    pub ui: UiStore,
}

impl Barfik {
    pub fn tokens(&self) -> &TokenStore {
        self.queries.api().client().tokens()
    }
}
