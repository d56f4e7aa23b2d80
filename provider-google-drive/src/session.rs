//! The remote calls the Drive client is built on.

use crate::error::Result;
use crate::types::{ByteRange, FileListPage, FileMetadata, ListRequest, MediaChunk};
use async_trait::async_trait;
use bytes::Bytes;

/// Authenticated handle to the Drive files API.
///
/// [`GoogleDriveConnector`](crate::GoogleDriveConnector) talks to Google;
/// tests substitute in-memory fakes. Each method is one remote call with no
/// retry.
#[async_trait]
pub trait DriveSession: Send + Sync {
    /// files.create with a multipart body: `metadata` plus `media`.
    /// Returns the resource restricted to `fields`.
    async fn create(
        &self,
        metadata: &FileMetadata,
        media: Bytes,
        mime_type: &str,
        fields: &str,
    ) -> Result<FileMetadata>;

    /// files.get with the server's default field set
    async fn get(&self, file_id: &str) -> Result<FileMetadata>;

    /// files.get with `alt=media` for one byte range
    async fn get_media(&self, file_id: &str, range: ByteRange) -> Result<MediaChunk>;

    /// One files.list page
    async fn list(&self, request: &ListRequest) -> Result<FileListPage>;
}
