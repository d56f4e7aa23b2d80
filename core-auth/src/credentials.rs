//! Live credential used to sign Drive requests.

use crate::error::{AuthError, Result};
use crate::oauth::OAuthFlowManager;
use crate::token_store::TokenStore;
use crate::types::StoredCredential;
use async_trait::async_trait;
use bridge_traits::http::HttpClient;
use bridge_traits::time::Clock;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Supplies a bearer token for each outgoing request.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Current access token, refreshed first if it has expired
    async fn access_token(&self) -> Result<String>;
}

/// The authorized credential plus what it needs to refresh itself.
///
/// The credential sits behind an async mutex so two concurrent requests
/// cannot both refresh it. Every refresh is written back to the token store.
pub struct Credentials {
    credential: Mutex<StoredCredential>,
    store: TokenStore,
    http_client: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
}

impl Credentials {
    pub fn new(
        credential: StoredCredential,
        store: TokenStore,
        http_client: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            credential: Mutex::new(credential),
            store,
            http_client,
            clock,
        }
    }

    /// Copy of the current credential
    pub async fn snapshot(&self) -> StoredCredential {
        self.credential.lock().await.clone()
    }

    /// Refresh now regardless of expiry.
    pub async fn refresh(&self) -> Result<()> {
        let mut credential = self.credential.lock().await;
        self.refresh_locked(&mut credential).await.map(|_| ())
    }

    #[instrument(skip(self, credential))]
    async fn refresh_locked(&self, credential: &mut StoredCredential) -> Result<String> {
        let refresh_token = credential.refresh_token.clone().ok_or_else(|| {
            AuthError::TokenRefreshFailed(
                "Access token expired and no refresh token is stored".to_string(),
            )
        })?;

        let flow = OAuthFlowManager::new(credential.refresh_config(), self.http_client.clone())
            .with_clock(self.clock.clone());

        match flow.refresh_access_token(&refresh_token).await {
            Ok(tokens) => {
                credential.apply(tokens);
                self.store.save(credential).await?;
                info!("Access token refreshed");
                Ok(credential.access_token.clone())
            }
            Err(e @ AuthError::TokenRejected { .. }) => {
                warn!(error = %e, "Refresh token rejected; marking credential invalid");
                credential.invalid = true;
                if let Err(save_error) = self.store.save(credential).await {
                    warn!(error = %save_error, "Failed to persist invalid credential flag");
                }
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl AccessTokenProvider for Credentials {
    async fn access_token(&self) -> Result<String> {
        let mut credential = self.credential.lock().await;

        if credential.invalid {
            return Err(AuthError::CredentialInvalid);
        }

        if !credential.is_expired_at(self.clock.now()) {
            return Ok(credential.access_token.clone());
        }

        debug!("Access token expired; refreshing");
        self.refresh_locked(&mut credential).await
    }
}
