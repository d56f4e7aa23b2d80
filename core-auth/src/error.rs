use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid client secrets: {0}")]
    InvalidClientSecrets(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("OAuth state mismatch: expected {expected}, got {actual}")]
    StateMismatch { expected: String, actual: String },

    #[error("Authorization was denied: {0}")]
    AuthorizationDenied(String),

    #[error("Authorization prompt failed: {0}")]
    PromptFailed(String),

    #[error("Invalid authorization code: {0}")]
    InvalidAuthCode(String),

    #[error("Token endpoint rejected the refresh token ({status}): {message}")]
    TokenRejected { status: u16, message: String },

    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Secure storage unavailable: {0}")]
    SecureStorageUnavailable(String),

    #[error("Stored credential is invalid; authorization is required")]
    CredentialInvalid,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
