//! # Drive Configuration
//!
//! Settings read by the authenticator and the drive client.
//!
//! ## Overview
//!
//! `DriveConfig` is built with [`DriveConfig::builder`]. Every field has a
//! default matching the conventional desktop layout (`credentials.json` and
//! `token.json` in the working directory, full Drive scope), so the common
//! case is:
//!
//! ```
//! use core_runtime::config::DriveConfig;
//!
//! let config = DriveConfig::builder().build().unwrap();
//! assert_eq!(config.token_path.to_str(), Some("token.json"));
//! ```
//!
//! `build()` validates the result and reports the first problem as
//! [`Error::Config`](crate::error::Error::Config).

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Full read/write access to the user's Drive
pub const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/drive";

pub const DEFAULT_TOKEN_PATH: &str = "token.json";

pub const DEFAULT_CREDENTIALS_PATH: &str = "credentials.json";

pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/drive/v3";

pub const DEFAULT_UPLOAD_BASE_URL: &str = "https://www.googleapis.com/upload/drive/v3";

/// 100 MiB per ranged download request
pub const DEFAULT_DOWNLOAD_CHUNK_SIZE: u64 = 100 * 1024 * 1024;

/// Largest page the files.list endpoint accepts
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Ports tried, in order, by the loopback authorization prompt
pub const DEFAULT_AUTH_PORTS: [u16; 2] = [8080, 8090];

/// Configuration for the drive client and its authorization bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveConfig {
    /// OAuth scopes requested during authorization
    pub scopes: Vec<String>,

    /// Where the persisted credential is read from and written to
    pub token_path: PathBuf,

    /// Application client secrets, read only when authorization is needed
    pub credentials_path: PathBuf,

    /// Base URL for metadata, list and media calls
    pub api_base_url: String,

    /// Base URL for upload calls
    pub upload_base_url: String,

    /// Bytes requested per ranged download call
    pub download_chunk_size: u64,

    /// Page size sent to files.list; `None` leaves the server default
    pub page_size: Option<u32>,

    /// Per-request timeout; `None` leaves the transport default
    pub request_timeout: Option<Duration>,

    /// Local ports tried by the loopback authorization prompt
    pub auth_ports: Vec<u16>,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            scopes: vec![DEFAULT_SCOPE.to_string()],
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_PATH),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            upload_base_url: DEFAULT_UPLOAD_BASE_URL.to_string(),
            download_chunk_size: DEFAULT_DOWNLOAD_CHUNK_SIZE,
            page_size: None,
            request_timeout: None,
            auth_ports: DEFAULT_AUTH_PORTS.to_vec(),
        }
    }
}

impl DriveConfig {
    /// Creates a new builder for constructing a `DriveConfig`.
    pub fn builder() -> DriveConfigBuilder {
        DriveConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - At least one non-empty scope is requested
    /// - Token and credentials paths are not empty
    /// - Endpoint URLs are absolute http(s) URLs
    /// - Chunk size is greater than zero
    /// - Page size, when set, is within 1..=1000
    pub fn validate(&self) -> Result<()> {
        if self.scopes.is_empty() || self.scopes.iter().any(|s| s.trim().is_empty()) {
            return Err(Error::Config(
                "At least one non-empty OAuth scope is required".to_string(),
            ));
        }

        if self.token_path.as_os_str().is_empty() {
            return Err(Error::Config("Token path cannot be empty".to_string()));
        }

        if self.credentials_path.as_os_str().is_empty() {
            return Err(Error::Config("Credentials path cannot be empty".to_string()));
        }

        for (name, url) in [
            ("API base URL", &self.api_base_url),
            ("Upload base URL", &self.upload_base_url),
        ] {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(Error::Config(format!(
                    "{} must be an absolute http(s) URL, got '{}'",
                    name, url
                )));
            }
        }

        if self.download_chunk_size == 0 {
            return Err(Error::Config(
                "Download chunk size must be greater than 0 bytes".to_string(),
            ));
        }

        if let Some(page_size) = self.page_size {
            if page_size == 0 || page_size > MAX_PAGE_SIZE {
                return Err(Error::Config(format!(
                    "Page size must be between 1 and {}, got {}",
                    MAX_PAGE_SIZE, page_size
                )));
            }
        }

        if self.auth_ports.is_empty() {
            return Err(Error::Config(
                "At least one authorization callback port is required".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for constructing [`DriveConfig`] instances.
///
/// Unset fields fall back to the [`Default`] values.
#[derive(Debug, Default)]
pub struct DriveConfigBuilder {
    scopes: Option<Vec<String>>,
    token_path: Option<PathBuf>,
    credentials_path: Option<PathBuf>,
    api_base_url: Option<String>,
    upload_base_url: Option<String>,
    download_chunk_size: Option<u64>,
    page_size: Option<u32>,
    request_timeout: Option<Duration>,
    auth_ports: Option<Vec<u16>>,
}

impl DriveConfigBuilder {
    /// Replaces the requested scopes.
    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = Some(scopes.into_iter().map(Into::into).collect());
        self
    }

    /// Sets scopes from a single space-separated string.
    ///
    /// ```
    /// use core_runtime::config::DriveConfig;
    ///
    /// let config = DriveConfig::builder()
    ///     .scope_string("https://www.googleapis.com/auth/drive.file https://www.googleapis.com/auth/drive.appdata")
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.scopes.len(), 2);
    /// ```
    pub fn scope_string(self, scopes: &str) -> Self {
        self.scopes(scopes.split_whitespace())
    }

    pub fn token_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.token_path = Some(path.into());
        self
    }

    pub fn credentials_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.credentials_path = Some(path.into());
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    pub fn upload_base_url(mut self, url: impl Into<String>) -> Self {
        self.upload_base_url = Some(url.into());
        self
    }

    pub fn download_chunk_size(mut self, bytes: u64) -> Self {
        self.download_chunk_size = Some(bytes);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn auth_ports(mut self, ports: impl Into<Vec<u16>>) -> Self {
        self.auth_ports = Some(ports.into());
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> Result<DriveConfig> {
        let defaults = DriveConfig::default();

        let config = DriveConfig {
            scopes: self.scopes.unwrap_or(defaults.scopes),
            token_path: self.token_path.unwrap_or(defaults.token_path),
            credentials_path: self.credentials_path.unwrap_or(defaults.credentials_path),
            api_base_url: trim_base(self.api_base_url.unwrap_or(defaults.api_base_url)),
            upload_base_url: trim_base(self.upload_base_url.unwrap_or(defaults.upload_base_url)),
            download_chunk_size: self
                .download_chunk_size
                .unwrap_or(defaults.download_chunk_size),
            page_size: self.page_size.or(defaults.page_size),
            request_timeout: self.request_timeout.or(defaults.request_timeout),
            auth_ports: self.auth_ports.unwrap_or(defaults.auth_ports),
        };

        config.validate()?;
        Ok(config)
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
