//! Error types for the Ignite Gym client.

use thiserror::Error;

/// Message used when a failing response carries no readable `message`.
pub const FALLBACK_ERROR_MESSAGE: &str = "Internal server error. Please try again later.";

/// Primary error type for all client operations.
///
/// `Clone` so a single refresh failure can be handed to every request that
/// was parked behind it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GymError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 401 whose server reason is `token.expired` or `token.invalid`.
    #[error("Access token rejected: {message}")]
    ExpiredToken { message: String },

    /// The refresh exchange failed or produced no usable token.
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    /// An expiry was detected but no refresh token is on hand.
    #[error("Session expired and no refresh token is available ({message})")]
    NoRefreshToken { message: String },

    /// Any other failing response from the backend.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Broad error category for routing caller behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Session,
    Api,
    Network,
    Timeout,
    Storage,
    Configuration,
}

impl GymError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Human-readable text suitable for showing to a user.
    pub fn message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            Self::Network(_) => FALLBACK_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ExpiredToken { .. } | Self::RefreshFailed(_) | Self::NoRefreshToken { .. } => {
                ErrorCategory::Session
            }
            Self::Api { .. } | Self::InvalidArgument(_) => ErrorCategory::Api,
            Self::Network(_) => ErrorCategory::Network,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Io(_) | Self::Serialization(_) => ErrorCategory::Storage,
            Self::Configuration(_) => ErrorCategory::Configuration,
        }
    }

    /// Whether the session could not be salvaged and the user must sign in again.
    pub fn ends_session(&self) -> bool {
        matches!(self, Self::RefreshFailed(_) | Self::NoRefreshToken { .. })
    }
}

impl From<reqwest::Error> for GymError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return Self::Network(format!("request timed out: {error}"));
        }
        Self::Network(error.to_string())
    }
}

impl From<std::io::Error> for GymError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for GymError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::de::Error> for GymError {
    fn from(error: toml::de::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::ser::Error> for GymError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, GymError>;
