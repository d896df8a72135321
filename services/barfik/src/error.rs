//! Error types for the Barfik client

use crate::validation::ValidationErrors;

/// Errors that can occur while talking to the Barfik backend
#[derive(Debug, thiserror::Error)]
pub enum BarfikError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Session expired: {0}")]
    SessionExpired(String),

    #[error("Login failed: {0}")]
    LoginFailed(String),

    #[error("Registration failed: {0}")]
    RegistrationFailed(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found")]
    NotFound,

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Server error: status {status}")]
    Server { status: u16 },

    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Barfik operations
pub type Result<T> = std::result::Result<T, BarfikError>;

const MSG_NETWORK: &str = "Brak połączenia z serwerem. Sprawdź połączenie internetowe.";
const MSG_SESSION: &str = "Sesja wygasła. Zaloguj się ponownie.";
const MSG_FORBIDDEN: &str = "Brak uprawnień do wykonania tej operacji.";
const MSG_NOT_FOUND: &str = "Nie znaleziono zasobu.";
const MSG_SERVER: &str = "Błąd serwera. Spróbuj ponownie później.";
const MSG_UNEXPECTED: &str = "Wystąpił nieoczekiwany błąd.";

impl BarfikError {
    /// Classify a non-success HTTP response
    pub fn from_response(status: u16, body: &str) -> Self {
        match status {
            400 => BarfikError::Validation(ValidationErrors::from_body(body)),
            401 => BarfikError::Unauthorized(detail_of(body).unwrap_or_default()),
            403 => BarfikError::Forbidden(detail_of(body).unwrap_or_default()),
            404 => BarfikError::NotFound,
            s if s >= 500 => BarfikError::Server { status: s },
            s => BarfikError::UnexpectedStatus {
                status: s,
                body: body.to_string(),
            },
        }
    }

    /// HTTP status this error was derived from, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            BarfikError::Unauthorized(_) | BarfikError::SessionExpired(_) => Some(401),
            BarfikError::Forbidden(_) => Some(403),
            BarfikError::NotFound => Some(404),
            BarfikError::Server { status } | BarfikError::UnexpectedStatus { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Server-supplied `detail` carried by 401 and 403 errors
    pub fn detail(&self) -> Option<&str> {
        match self {
            BarfikError::Unauthorized(detail) | BarfikError::Forbidden(detail)
                if !detail.is_empty() =>
            {
                Some(detail.as_str())
            }
            _ => None,
        }
    }

    /// Localized message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            BarfikError::Network(_) => MSG_NETWORK.to_string(),
            BarfikError::Unauthorized(_) | BarfikError::SessionExpired(_) => MSG_SESSION.to_string(),
            BarfikError::LoginFailed(msg) | BarfikError::RegistrationFailed(msg) => msg.clone(),
            BarfikError::Forbidden(_) => MSG_FORBIDDEN.to_string(),
            BarfikError::NotFound => MSG_NOT_FOUND.to_string(),
            BarfikError::Server { .. } => MSG_SERVER.to_string(),
            BarfikError::Validation(errors) => {
                let summary = errors.summary();
                if summary.is_empty() {
                    MSG_UNEXPECTED.to_string()
                } else {
                    summary
                }
            }
            BarfikError::UnexpectedStatus { status, .. } => format!("Błąd {}", status),
            BarfikError::Config(msg) => msg.clone(),
            BarfikError::Io(_) | BarfikError::Json(_) => MSG_UNEXPECTED.to_string(),
        }
    }
}

/// Extract a DRF `detail` string from a response body
pub(crate) fn detail_of(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("detail")?
        .as_str()
        .map(str::to_string)
}
