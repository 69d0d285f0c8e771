//! Error types for Gatehouse
//!
//! Authentication failures are expected, client-facing conditions and always
//! map to a 4xx status. Only infrastructure problems produce a 5xx.

use hyper::StatusCode;

/// Main error type for Gatehouse operations
#[derive(Debug, thiserror::Error)]
pub enum GatehouseError {
    #[error("Credential not found: {0}")]
    CredentialNotFound(String),

    #[error("Password mismatch")]
    PasswordMismatch,

    #[error("Malformed token")]
    TokenMalformed,

    #[error("Token expired")]
    TokenExpired,

    #[error("No credentials provided")]
    NoCredentialsProvided,

    #[error("Account disabled: {0}")]
    AccountDisabled(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatehouseError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::CredentialNotFound(_)
            | Self::PasswordMismatch
            | Self::TokenMalformed
            | Self::TokenExpired
            | Self::NoCredentialsProvided => StatusCode::UNAUTHORIZED,
            Self::AccountDisabled(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code for JSON error bodies
    pub fn code(&self) -> &'static str {
        match self {
            Self::CredentialNotFound(_) | Self::PasswordMismatch => "INVALID_CREDENTIALS",
            Self::TokenMalformed => "MALFORMED_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::NoCredentialsProvided => "NO_CREDENTIALS",
            Self::AccountDisabled(_) => "ACCOUNT_DISABLED",
            Self::Conflict(_) => "CONFLICT",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Database(_) => "DB_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<std::io::Error> for GatehouseError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for GatehouseError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<hyper::Error> for GatehouseError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<mongodb::error::Error> for GatehouseError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for GatehouseError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        Self::Timeout(err.to_string())
    }
}

/// Result type alias for Gatehouse operations
pub type Result<T> = std::result::Result<T, GatehouseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_are_client_errors() {
        let errors = [
            GatehouseError::CredentialNotFound("alice".into()),
            GatehouseError::PasswordMismatch,
            GatehouseError::TokenMalformed,
            GatehouseError::TokenExpired,
            GatehouseError::NoCredentialsProvided,
            GatehouseError::AccountDisabled("alice".into()),
        ];
        for err in errors {
            assert!(err.status_code().is_client_error(), "{err} should be 4xx");
        }
    }

    #[test]
    fn infrastructure_failures_are_server_errors() {
        assert_eq!(
            GatehouseError::Timeout("lookup".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert!(GatehouseError::Internal("boom".into())
            .status_code()
            .is_server_error());
    }
}
