//! Login state of the current user

use tracing::{debug, info, warn};

use crate::error::{BarfikError, Result};
use crate::models::{RegisterRequest, User};
use crate::queries::Queries;
use crate::session::TokenStore;

const MSG_LOGIN_FAILED: &str = "Nieprawidłowy email lub hasło";
const MSG_REGISTER_FAILED: &str = "Wystąpił błąd podczas rejestracji";

/// Owns login, logout and the session check on startup
#[derive(Debug)]
pub struct AuthSession {
    queries: Queries,
    user: Option<User>,
    error: Option<String>,
}

impl AuthSession {
    pub fn new(queries: Queries) -> Self {
        Self {
            queries,
            user: None,
            error: None,
        }
    }

    fn tokens(&self) -> &TokenStore {
        self.queries.api().client().tokens()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Message of the last failed login
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Restore the session from stored tokens
    ///
    /// A stored token the server no longer accepts is discarded together
    /// with the refresh token.
    pub async fn check_session(&mut self) -> bool {
        if self.tokens().access_token().is_none() {
            debug!("No stored access token");
            return false;
        }
        match self.queries.api().me().await {
            Ok(user) => {
                info!("Session restored for user {}", user.id);
                self.user = Some(user);
                true
            }
            Err(e) => {
                warn!("Stored session rejected: {}", e);
                self.tokens().clear();
                self.user = None;
                false
            }
        }
    }

    /// Log in; the refresh token is kept only when `remember` is set
    pub async fn login(&mut self, email: &str, password: &str, remember: bool) -> Result<&User> {
        self.error = None;
        // Cached data of a previous user must not leak into this session
        self.queries.clear().await;

        let user = match self.try_login(email, password, remember).await {
            Ok(user) => user,
            Err(e) => {
                let message = e.detail().unwrap_or(MSG_LOGIN_FAILED).to_string();
                warn!("Login failed: {}", e);
                self.error = Some(message.clone());
                return Err(BarfikError::LoginFailed(message));
            }
        };

        info!("Logged in as user {}", user.id);
        Ok(self.user.insert(user))
    }

    async fn try_login(&self, email: &str, password: &str, remember: bool) -> Result<User> {
        let pair = self.queries.api().login(email.trim(), password).await?;
        let tokens = self.tokens();
        tokens.set_access_token(&pair.access);
        if remember {
            tokens.set_refresh_token(&pair.refresh);
        }
        self.queries.api().me().await
    }

    /// Create an account; the caller logs in afterwards
    ///
    /// Server-side field errors come back as `BarfikError::Validation`;
    /// any other failure is reported as `RegistrationFailed` and kept in
    /// [`AuthSession::error`].
    pub async fn register(
        &mut self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<User> {
        self.error = None;
        let request = RegisterRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
        };
        match self.queries.api().register(&request).await {
            Ok(user) => {
                info!("Registered user {}", user.id);
                Ok(user)
            }
            Err(e @ BarfikError::Validation(_)) => Err(e),
            Err(e) => {
                let message = e.detail().unwrap_or(MSG_REGISTER_FAILED).to_string();
                warn!("Registration failed: {}", e);
                self.error = Some(message.clone());
                Err(BarfikError::RegistrationFailed(message))
            }
        }
    }

    /// Forget the user, both tokens and every cached query
    pub async fn logout(&mut self) {
        self.user = None;
        self.error = None;
        self.tokens().clear();
        self.queries.clear().await;
        info!("Logged out");
    }
}
