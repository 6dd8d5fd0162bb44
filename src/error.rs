use serde::Serialize;

use crate::i18n;

/// Error reported by the backend for a non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub message: String,
    pub status_code: Option<u16>,
}

/// What kind of failure the backend signalled, derived from the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    Other,
}

impl ApiError {
    pub fn new(message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self {
            message: message.into(),
            status_code,
        }
    }

    pub fn kind(&self) -> ApiErrorKind {
        match self.status_code {
            Some(401) => ApiErrorKind::Unauthorized,
            Some(403) => ApiErrorKind::Forbidden,
            Some(404) => ApiErrorKind::NotFound,
            Some(409) => ApiErrorKind::Conflict,
            _ => ApiErrorKind::Other,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "{} ({})", self.message, code),
            None => write!(f, "{}", self.message),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("API error: {0}")]
    Api(ApiError),

    #[error("Connection error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid or unreadable session token")]
    InvalidToken,

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// An operation was refused; the message is already user-facing.
    #[error("{0}")]
    Rejected(String),
}

impl From<ApiError> for AppError {
    fn from(error: ApiError) -> Self {
        AppError::Api(error)
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        AppError::Storage(error.to_string())
    }
}

impl From<crate::config::ConfigError> for AppError {
    fn from(error: crate::config::ConfigError) -> Self {
        AppError::Config(error.to_string())
    }
}

impl AppError {
    /// The backend error, when the failure came from a non-2xx response.
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            AppError::Api(e) => Some(e),
            _ => None,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        self.api().and_then(|e| e.status_code)
    }

    pub fn kind(&self) -> Option<ApiErrorKind> {
        self.api().map(ApiError::kind)
    }

    /// Message suitable for an inline banner. Backend messages are shown as-is;
    /// transport failures collapse to the generic connection message.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Api(e) => e.message.clone(),
            AppError::Network(e) => {
                tracing::warn!("HTTP request failed: {:?}", e);
                i18n::t("error.connection")
            }
            AppError::Decode(e) => {
                tracing::error!("Failed to decode response: {:?}", e);
                i18n::t("error.request_failed")
            }
            AppError::InvalidToken => i18n::t("error.invalid_session"),
            AppError::Storage(msg) | AppError::Config(msg) => {
                tracing::error!("{}", msg);
                i18n::t("error.request_failed")
            }
            AppError::InvalidDate(msg) | AppError::Validation(msg) | AppError::Rejected(msg) => {
                msg.clone()
            }
        }
    }

    /// Like [`user_message`](Self::user_message), but a backend error without a
    /// useful message falls back to `fallback`.
    pub fn message_or(&self, fallback: &str) -> String {
        match self {
            AppError::Api(e) if e.message.trim().is_empty() => fallback.to_string(),
            AppError::Api(_) => self.user_message(),
            AppError::Network(_) | AppError::Decode(_) => self.user_message(),
            _ => {
                let msg = self.user_message();
                if msg.is_empty() {
                    fallback.to_string()
                } else {
                    msg
                }
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
