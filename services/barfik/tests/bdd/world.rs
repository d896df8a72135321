//! BDD test world for the Barfik client

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use barfik::io::{HttpClient, HttpRequest, HttpResponse};
use barfik::models::{DietCreate, ShoppingListItem};
use barfik::notify::NotificationCenter;
use barfik::session::{Navigator, TokenStore};
use barfik::shopping::Progress;
use barfik::validation::{DietForm, ValidationErrors};
use barfik::{Api, UiStore};
use tokio::sync::Barrier;

/// Backend whose access token has expired
///
/// Requests carrying the expired token wait until `expected` of them have
/// arrived before all receive 401 together.
#[derive(Debug)]
pub struct ExpiringBackend {
    pub barrier: Barrier,
    pub refresh_succeeds: bool,
    pub refresh_calls: AtomicUsize,
    pub retried_with: Mutex<Vec<String>>,
}

impl ExpiringBackend {
    pub fn new(expected: usize, refresh_succeeds: bool) -> Self {
        Self {
            barrier: Barrier::new(expected),
            refresh_succeeds,
            refresh_calls: AtomicUsize::new(0),
            retried_with: Mutex::new(Vec::new()),
        }
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

fn respond(status: u16, body: &str) -> barfik::Result<HttpResponse> {
    Ok(HttpResponse {
        status,
        body: body.to_string(),
    })
}

#[async_trait]
impl HttpClient for ExpiringBackend {
    async fn send(&self, request: &HttpRequest) -> barfik::Result<HttpResponse> {
        if request.url.ends_with("/api/auth/refresh/") {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            return if self.refresh_succeeds {
                respond(200, r#"{"access": "renewed"}"#)
            } else {
                respond(401, r#"{"detail": "Token is invalid or expired"}"#)
            };
        }
        match request.bearer.as_deref() {
            Some("expired") => {
                self.barrier.wait().await;
                respond(401, "")
            }
            Some(token) => {
                self.retried_with.lock().unwrap().push(token.to_string());
                respond(200, "[]")
            }
            None => respond(401, ""),
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingNavigator {
    pub redirects: AtomicUsize,
}

impl Navigator for RecordingNavigator {
    fn redirect_to_login(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Default, cucumber::World)]
pub struct BarfikWorld {
    // Token refresh
    pub backend: Option<Arc<ExpiringBackend>>,
    pub navigator: Option<Arc<RecordingNavigator>>,
    pub tokens: Option<TokenStore>,
    pub refresh_accepted: bool,
    pub api: Option<Api>,
    pub results: Vec<barfik::Result<()>>,

    // Diet form
    pub diet_form: DietForm,
    pub diet_result: Option<Result<DietCreate, ValidationErrors>>,

    // Shopping list
    pub items: Vec<ShoppingListItem>,
    pub progress: Option<Progress>,

    // View state
    pub ui: UiStore,
    pub notifications: Option<NotificationCenter>,
}
