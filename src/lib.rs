//! Workspace facade crate.
//!
//! Re-exports the pieces a host needs to talk to Google Drive so it can
//! depend on `drive-workspace` alone. The `desktop-shims` feature (on by
//! default) pulls in `core-service` with the desktop bridges and exposes
//! [`connect`].

pub use core_auth::{AuthError, Authenticator, AuthorizationPrompt, ConsolePrompt, LoopbackPrompt};
pub use core_runtime::config::DriveConfig;
pub use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
pub use provider_google_drive::{
    DownloadProgress, DownloadStatus, DriveClient, FileMetadata, GoogleDriveError, ListQuery,
    UploadRequest,
};

#[cfg(feature = "desktop-shims")]
pub use core_service::{connect, connect_with, CoreError, DriveDependencies};
