//! Credential Persistence
//!
//! Reads and writes the [`StoredCredential`] JSON document through a
//! [`SecureStore`]. With the desktop file store this is the `token.json`
//! file next to the application.
//!
//! ## Example
//!
//! ```no_run
//! use core_auth::TokenStore;
//! use std::sync::Arc;
//! # use bridge_traits::storage::SecureStore;
//! # async fn example(secure_store: Arc<dyn SecureStore>) -> core_auth::Result<()> {
//! let token_store = TokenStore::new(secure_store, "token.json");
//!
//! if let Some(credential) = token_store.load().await? {
//!     println!("Stored credential for client {}", credential.client_id);
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::types::StoredCredential;
use bridge_traits::storage::SecureStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Persistence for the OAuth credential under a single key.
///
/// Token values are never logged. A stored document that cannot be parsed is
/// reported as absent so the authorization flow replaces it.
#[derive(Clone)]
pub struct TokenStore {
    secure_store: Arc<dyn SecureStore>,
    key: String,
}

impl TokenStore {
    pub fn new(secure_store: Arc<dyn SecureStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        debug!(key = %key, "Initializing TokenStore");
        Self { secure_store, key }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the stored credential.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(credential))` if a parsable credential exists
    /// - `Ok(None)` if nothing is stored or the document is corrupt
    /// - `Err` if the secure store is unavailable
    pub async fn load(&self) -> Result<Option<StoredCredential>> {
        let data = self.secure_store.get_secret(&self.key).await.map_err(|e| {
            warn!(key = %self.key, error = %e, "Failed to read stored credential");
            AuthError::SecureStorageUnavailable(e.to_string())
        })?;

        let Some(data) = data else {
            debug!(key = %self.key, "No stored credential");
            return Ok(None);
        };

        match serde_json::from_slice::<StoredCredential>(&data) {
            Ok(credential) => {
                info!(
                    key = %self.key,
                    has_refresh_token = credential.refresh_token.is_some(),
                    invalid = credential.invalid,
                    "Loaded stored credential"
                );
                Ok(Some(credential))
            }
            Err(e) => {
                warn!(
                    key = %self.key,
                    error = %e,
                    "Stored credential is corrupted; treating it as absent"
                );
                Ok(None)
            }
        }
    }

    /// Persist the credential, replacing any previous one.
    pub async fn save(&self, credential: &StoredCredential) -> Result<()> {
        let json = serde_json::to_vec_pretty(credential)
            .map_err(|e| AuthError::Other(format!("Failed to serialize credential: {}", e)))?;

        self.secure_store
            .set_secret(&self.key, &json)
            .await
            .map_err(|e| {
                warn!(key = %self.key, error = %e, "Failed to persist credential");
                AuthError::SecureStorageUnavailable(e.to_string())
            })?;

        info!(
            key = %self.key,
            has_refresh_token = credential.refresh_token.is_some(),
            invalid = credential.invalid,
            "Credential persisted"
        );
        Ok(())
    }

    /// Remove the stored credential. Removing a missing credential succeeds.
    pub async fn delete(&self) -> Result<()> {
        self.secure_store
            .delete_secret(&self.key)
            .await
            .map_err(|e| AuthError::SecureStorageUnavailable(e.to_string()))?;

        info!(key = %self.key, "Credential deleted");
        Ok(())
    }
}
