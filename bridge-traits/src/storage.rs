//! Credential Storage Abstraction
//!
//! The persisted OAuth credential is written through this trait so the
//! authorization flow never touches the file system or the keychain directly.

use async_trait::async_trait;

use crate::error::Result;

/// Secure credential storage trait
///
/// Abstracts where persisted credentials live:
/// - Desktop default: a JSON file per key (e.g. `token.json`)
/// - Tests: in-memory maps
///
/// # Security Requirements
///
/// Implementations MUST:
/// - Never log or expose secret values
/// - Restrict access to the stored data where the platform allows it
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SecureStore;
///
/// async fn store_token(store: &dyn SecureStore, token: &str) -> Result<()> {
///     store.set_secret("token.json", token.as_bytes()).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SecureStore: Send + Sync {
    /// Store a secret value, replacing any previous value for the key
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Retrieve a secret value
    ///
    /// # Returns
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Delete a secret. Deleting a missing key succeeds.
    async fn delete_secret(&self, key: &str) -> Result<()>;
}

