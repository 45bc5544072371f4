use thiserror::Error;

use crate::error::AmpgateError;

/// Normalized authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not authorized")]
    NotAuthorized,
    #[error("No refresh token on record")]
    MissingRefreshToken,
    #[error("Expired or invalid grant: {0}")]
    InvalidGrant(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<toml::de::Error> for AuthError {
    fn from(error: toml::de::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::ser::Error> for AuthError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<AuthError> for AmpgateError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::InvalidResponse(message) => AmpgateError::MalformedResponse(message),
            AuthError::Io(message) | AuthError::Serialization(message) => {
                AmpgateError::Configuration(format!("credential storage: {message}"))
            }
            other => AmpgateError::Authentication(other.to_string()),
        }
    }
}
