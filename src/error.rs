use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Hasher error: {0}")]
    Hasher(#[from] HasherError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Orchestrator-level authentication failures. Both variants are reported to
/// clients with one indistinguishable message; the split exists for logs and
/// tests only.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("User not found")]
    NotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    /// Signature does not verify, wire form is malformed, or expiry elapsed.
    #[error("Invalid token")]
    InvalidToken,

    /// Signature verified but the embedded claim is missing or mistyped.
    #[error("Malformed claim")]
    MalformedClaim,

    #[error("Token signing failed: {0}")]
    Signing(String),
}

/// Which unique identity column a registration collided on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityField {
    Email,
    Username,
}

impl std::fmt::Display for IdentityField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityField::Email => write!(f, "email"),
            IdentityField::Username => write!(f, "username"),
        }
    }
}

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Duplicate identity: {field} already in use")]
    DuplicateIdentity { field: IdentityField },

    /// Connection could not be established or the transaction could not be
    /// committed. Transient; callers may retry.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Query error: {0}")]
    Query(String),
}

#[derive(Error, Debug)]
pub enum HasherError {
    #[error("Password must not be empty")]
    EmptyPassword,

    /// A stored digest failed to parse. Data-integrity fault, never caused by
    /// client input.
    #[error("Malformed password digest: {0}")]
    MalformedDigest(String),

    #[error("Digest computation failed: {0}")]
    Hashing(String),
}

impl AppError {
    /// Message exposed in HTTP responses. Collapses `NotFound` and
    /// `InvalidCredentials` into one string so callers cannot probe which
    /// identities exist, and hides internals behind generic text for
    /// 5xx-class failures.
    pub(crate) fn client_message(&self) -> String {
        match self {
            AppError::Auth(AuthError::NotFound)
            | AppError::Auth(AuthError::InvalidCredentials) => "Cannot authenticate".to_string(),
            AppError::Token(TokenError::InvalidToken)
            | AppError::Token(TokenError::MalformedClaim) => "Cannot validate token".to_string(),
            AppError::Directory(DirectoryError::DuplicateIdentity { field }) => {
                format!("{} already in use", field)
            }
            AppError::Directory(DirectoryError::Unavailable(_)) => {
                "Service unavailable, try later".to_string()
            }
            AppError::Validation(msg) => msg.clone(),
            AppError::Hasher(HasherError::EmptyPassword) => {
                "Password must not be empty".to_string()
            }
            _ => "Internal server error".to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let response = json!({
            "error": {
                "status": status.as_u16(),
                "message": self.client_message()
            }
        });
        HttpResponse::build(status).json(response)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(AuthError::NotFound) => StatusCode::UNAUTHORIZED,
            AppError::Auth(AuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            AppError::Token(TokenError::InvalidToken) => StatusCode::UNAUTHORIZED,
            AppError::Token(TokenError::MalformedClaim) => StatusCode::UNAUTHORIZED,
            AppError::Token(TokenError::Signing(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Directory(DirectoryError::DuplicateIdentity { .. }) => StatusCode::CONFLICT,
            AppError::Directory(DirectoryError::Unavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Directory(DirectoryError::Query(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Hasher(HasherError::EmptyPassword) => StatusCode::BAD_REQUEST,
            AppError::Hasher(HasherError::MalformedDigest(_))
            | AppError::Hasher(HasherError::Hashing(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
