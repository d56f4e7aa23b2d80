//! File-backed Credential Storage using Tokio

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::SecureStore,
};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Stores each secret as a file named after its key inside one directory.
///
/// `token.json` in the working directory is therefore
/// `FileSecureStore::new(".")` with the key `"token.json"`. Writes go to a
/// temporary sibling first and are renamed into place. On Unix the file is
/// restricted to the owner (`0600`).
pub struct FileSecureStore {
    directory: PathBuf,
}

impl FileSecureStore {
    /// Create a store rooted at `directory`; the directory is created on first write
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Split a token file path into a store rooted at its parent and the key to use.
    ///
    /// A bare file name resolves to the current directory.
    pub fn for_file(path: &Path) -> Result<(Self, String)> {
        let key = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                BridgeError::OperationFailed(format!(
                    "Token path has no usable file name: {}",
                    path.display()
                ))
            })?
            .to_string();

        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        Ok((Self::new(directory), key))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key == "." || key == ".." || key.contains(['/', '\\']) {
            return Err(BridgeError::OperationFailed(format!(
                "Invalid secret key: {:?}",
                key
            )));
        }
        Ok(self.directory.join(key))
    }

    #[cfg(unix)]
    async fn restrict_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
        Ok(())
    }

    #[cfg(not(unix))]
    async fn restrict_permissions(_path: &Path) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl SecureStore for FileSecureStore {
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.directory).await?;

        let staging = self.directory.join(format!(".{}.tmp", key));
        fs::write(&staging, value).await?;
        Self::restrict_permissions(&staging).await?;
        fs::rename(&staging, &path).await?;

        debug!(key = key, "Stored secret on disk");
        Ok(())
    }

    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;

        match fs::read(&path).await {
            Ok(data) => {
                debug!(key = key, "Retrieved secret from disk");
                Ok(Some(data))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(key = key, "Secret not found on disk");
                Ok(None)
            }
            Err(e) => Err(BridgeError::Io(e)),
        }
    }

    async fn delete_secret(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(key = key, "Deleted secret from disk");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BridgeError::Io(e)),
        }
    }
}
