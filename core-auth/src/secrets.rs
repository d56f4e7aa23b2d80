//! Application client secrets.
//!
//! Reads the `credentials.json` file downloaded from the Google Cloud console.
//! Both the `installed` (desktop) and `web` layouts are accepted.

use crate::error::{AuthError, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

pub const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// OAuth client registration for this application
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

#[derive(Deserialize)]
struct SecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

impl ClientSecrets {
    /// Parse a client secrets document
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let file: SecretsFile = serde_json::from_slice(data)
            .map_err(|e| AuthError::InvalidClientSecrets(e.to_string()))?;

        let secrets = file.installed.or(file.web).ok_or_else(|| {
            AuthError::InvalidClientSecrets(
                "expected an \"installed\" or \"web\" client section".to_string(),
            )
        })?;

        if secrets.client_id.trim().is_empty() {
            return Err(AuthError::InvalidClientSecrets(
                "client_id is empty".to_string(),
            ));
        }

        Ok(secrets)
    }

    /// Read and parse a client secrets file.
    ///
    /// A missing file is reported as [`AuthError::Io`].
    pub async fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading client secrets");
        let data = tokio::fs::read(path).await?;
        Self::from_json(&data)
    }
}

impl std::fmt::Debug for ClientSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecrets")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[REDACTED]"))
            .field("auth_uri", &self.auth_uri)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}
