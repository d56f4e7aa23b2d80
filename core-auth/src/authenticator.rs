//! Authorization Bootstrap
//!
//! Turns whatever is in the token store into a usable [`Credentials`],
//! running the interactive authorization flow when nothing usable is stored.
//!
//! ```text
//! load token ──usable──────────────────────────────────────► Authorized
//!     │
//!     └─absent / corrupt / invalid / expired without refresh token
//!           │
//!           ▼
//!     NeedsAuthorization ─► read client secrets ─► prompt ─► exchange code
//!                                                      ─► persist ─► Authorized
//! ```
//!
//! The flow runs at most once per call and is never retried.

use crate::credentials::Credentials;
use crate::error::Result;
use crate::oauth::{OAuthConfig, OAuthFlowManager};
use crate::prompt::AuthorizationPrompt;
use crate::secrets::ClientSecrets;
use crate::token_store::TokenStore;
use crate::types::{AuthState, StoredCredential};
use bridge_traits::http::HttpClient;
use bridge_traits::time::{Clock, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument};

pub struct Authenticator {
    store: TokenStore,
    prompt: Arc<dyn AuthorizationPrompt>,
    http_client: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    credentials_path: PathBuf,
    scopes: Vec<String>,
}

impl Authenticator {
    pub fn new(
        store: TokenStore,
        prompt: Arc<dyn AuthorizationPrompt>,
        http_client: Arc<dyn HttpClient>,
        credentials_path: impl Into<PathBuf>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            store,
            prompt,
            http_client,
            clock: Arc::new(SystemClock),
            credentials_path: credentials_path.into(),
            scopes,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Inspect the stored credential without prompting.
    pub async fn state(&self) -> Result<AuthState> {
        let now = self.clock.now();
        Ok(match self.store.load().await? {
            Some(credential) if credential.is_usable_at(now) => AuthState::Authorized,
            _ => AuthState::NeedsAuthorization,
        })
    }

    /// Produce authorized credentials, prompting the user if needed.
    ///
    /// # Errors
    ///
    /// Any failure while authorizing is returned as-is: a missing or corrupt
    /// client secrets file, a failed or denied prompt, a rejected code or a
    /// network failure.
    #[instrument(skip(self))]
    pub async fn authorize(&self) -> Result<Credentials> {
        let now = self.clock.now();

        let credential = match self.store.load().await? {
            Some(credential) if credential.is_usable_at(now) => {
                info!(
                    expired = credential.is_expired_at(now),
                    "Using stored credential"
                );
                credential
            }
            stored => {
                info!(
                    stored = stored.is_some(),
                    invalid = stored.as_ref().map(|c| c.invalid).unwrap_or(false),
                    "Stored credential unusable; authorization required"
                );
                let credential = self.run_flow().await?;
                self.store.save(&credential).await?;
                credential
            }
        };

        Ok(Credentials::new(
            credential,
            self.store.clone(),
            self.http_client.clone(),
            self.clock.clone(),
        ))
    }

    async fn run_flow(&self) -> Result<StoredCredential> {
        let secrets = ClientSecrets::load(&self.credentials_path).await?;

        let redirect_uri = self.prompt.redirect_uri().await?;
        let config = OAuthConfig::from_secrets(&secrets, redirect_uri, &self.scopes);
        let flow = OAuthFlowManager::new(config, self.http_client.clone())
            .with_clock(self.clock.clone());

        let (auth_url, verifier) = flow.build_auth_url()?;
        let response = self.prompt.authorize(&auth_url).await?;

        let tokens = flow
            .exchange_code(&response.code, response.state.as_deref(), &verifier)
            .await?;

        info!("Authorization completed");
        Ok(StoredCredential::from_tokens(tokens, &secrets, &self.scopes))
    }
}
