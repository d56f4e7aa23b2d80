//! Error types for the Google Drive client

use thiserror::Error;

/// Google Drive client errors
#[derive(Error, Debug)]
pub enum GoogleDriveError {
    /// Local file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No access token could be produced
    #[error(transparent)]
    Auth(#[from] core_auth::AuthError),

    /// API request returned an error
    #[error("Google Drive API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// The server stopped sending bytes before the declared size was reached
    #[error("Download of {file_id} stopped at {received} of {total} bytes")]
    IncompleteDownload {
        file_id: String,
        received: u64,
        total: u64,
    },

    /// Transport failure
    #[error(transparent)]
    BridgeError(#[from] bridge_traits::error::BridgeError),
}

/// Result type for Google Drive operations
pub type Result<T> = std::result::Result<T, GoogleDriveError>;
