use crate::oauth::OAuthConfig;
use crate::secrets::{ClientSecrets, GOOGLE_AUTH_URI};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Seconds before the recorded expiry at which an access token is treated as expired
pub const EXPIRY_SKEW_SECS: i64 = 60;

/// OAuth 2.0 token set returned by the token endpoint.
///
/// # Security
///
/// Tokens should be stored securely and never logged. The `Debug` implementation
/// redacts sensitive information.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthTokens {
    /// The access token used for API requests
    pub access_token: String,
    /// Present on the first exchange; refresh responses usually omit it
    pub refresh_token: Option<String>,
    /// When the access token expires (UTC)
    pub expires_at: DateTime<Utc>,
}

impl OAuthTokens {
    /// Build a token set from a token endpoint response received at `now`
    pub fn issued_at(
        access_token: String,
        refresh_token: Option<String>,
        expires_in: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: now + Duration::seconds(expires_in),
        }
    }
}

impl fmt::Debug for OAuthTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthTokens")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// The credential persisted in `token.json`.
///
/// Carries everything needed to refresh the access token without the client
/// secrets file.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_expiry: Option<DateTime<Utc>>,
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    pub token_uri: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Set once the token endpoint has rejected the refresh token
    #[serde(default)]
    pub invalid: bool,
}

impl StoredCredential {
    pub fn from_tokens(tokens: OAuthTokens, secrets: &ClientSecrets, scopes: &[String]) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_expiry: Some(tokens.expires_at),
            client_id: secrets.client_id.clone(),
            client_secret: secrets.client_secret.clone(),
            token_uri: secrets.token_uri.clone(),
            scopes: scopes.to_vec(),
            invalid: false,
        }
    }

    /// A credential without a recorded expiry never expires locally.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.token_expiry {
            Some(expiry) => now >= expiry - Duration::seconds(EXPIRY_SKEW_SECS),
            None => false,
        }
    }

    /// Usable without running the authorization flow again
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        !self.invalid && (!self.is_expired_at(now) || self.refresh_token.is_some())
    }

    /// Take the access token and expiry from a refresh; keep the old refresh
    /// token when the response carries none.
    pub fn apply(&mut self, tokens: OAuthTokens) {
        self.access_token = tokens.access_token;
        self.token_expiry = Some(tokens.expires_at);
        if let Some(refresh_token) = tokens.refresh_token {
            self.refresh_token = Some(refresh_token);
        }
        self.invalid = false;
    }

    /// Flow configuration for the refresh grant
    pub fn refresh_config(&self) -> OAuthConfig {
        OAuthConfig {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            redirect_uri: String::new(),
            scopes: self.scopes.clone(),
            auth_url: GOOGLE_AUTH_URI.to_string(),
            token_url: self.token_uri.clone(),
        }
    }
}

impl fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCredential")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("token_expiry", &self.token_expiry)
            .field("client_id", &self.client_id)
            .field("token_uri", &self.token_uri)
            .field("scopes", &self.scopes)
            .field("invalid", &self.invalid)
            .finish()
    }
}

/// Where construction stands with respect to the stored credential.
///
/// ```text
/// NeedsAuthorization --(prompt + code exchange)--> Authorized
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No usable credential; the authorization flow must run
    NeedsAuthorization,
    /// A usable credential is available
    Authorized,
}
