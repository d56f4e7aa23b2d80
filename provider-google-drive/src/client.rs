//! The Drive client: upload, download, metadata and listing over one session.

use crate::download::{download_to_buffer, ConsoleProgress, DownloadProgress, NoProgress};
use crate::error::Result;
use crate::pager::FilePager;
use crate::session::DriveSession;
use crate::types::{FileMetadata, ListQuery, UploadRequest};
use bytes::Bytes;
use core_runtime::config::{DriveConfig, DEFAULT_DOWNLOAD_CHUNK_SIZE};
use core_runtime::logging::strip_path;
use serde_json::Value;
use std::io::Cursor;
use std::sync::Arc;
use tracing::{info, instrument};

/// Convenience wrapper around an authenticated [`DriveSession`].
///
/// All operations are independent; the session is the only shared state.
///
/// # Example
///
/// ```ignore
/// use provider_google_drive::{DriveClient, ListQuery, UploadRequest};
///
/// let created = client
///     .upload(&UploadRequest::new("q3.pdf", "reports/q3.pdf", "application/pdf"))
///     .await?;
/// let folders = client.list_folders(&ListQuery::default()).await?;
/// ```
#[derive(Clone)]
pub struct DriveClient {
    session: Arc<dyn DriveSession>,
    download_chunk_size: u64,
    page_size: Option<u32>,
}

impl DriveClient {
    pub fn new(session: Arc<dyn DriveSession>) -> Self {
        Self {
            session,
            download_chunk_size: DEFAULT_DOWNLOAD_CHUNK_SIZE,
            page_size: None,
        }
    }

    /// Take chunk and page sizes from `config`
    pub fn from_config(session: Arc<dyn DriveSession>, config: &DriveConfig) -> Self {
        Self {
            session,
            download_chunk_size: config.download_chunk_size,
            page_size: config.page_size,
        }
    }

    pub fn with_download_chunk_size(mut self, bytes: u64) -> Self {
        self.download_chunk_size = bytes.max(1);
        self
    }

    /// Page size used when a query does not set its own
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn session(&self) -> &Arc<dyn DriveSession> {
        &self.session
    }

    /// Upload a local file in a single multipart request.
    ///
    /// Returns the created resource restricted to `request.return_fields`.
    /// A local file that cannot be read surfaces as
    /// [`GoogleDriveError::Io`](crate::GoogleDriveError::Io).
    #[instrument(
        skip(self, request),
        fields(name = %request.name, file = %strip_path(&request.path.to_string_lossy()))
    )]
    pub async fn upload(&self, request: &UploadRequest) -> Result<FileMetadata> {
        let media = tokio::fs::read(&request.path).await?;
        let size = media.len();

        let mut metadata = FileMetadata::new();
        metadata.insert("name".to_string(), Value::String(request.name.clone()));

        let created = self
            .session
            .create(
                &metadata,
                Bytes::from(media),
                &request.mime_type,
                &request.return_fields,
            )
            .await?;

        info!(bytes = size, "Upload complete");
        Ok(created)
    }

    /// Download a file into memory. With `verbose`, progress is printed to
    /// standard output.
    pub async fn download(&self, file_id: &str, verbose: bool) -> Result<Cursor<Vec<u8>>> {
        if verbose {
            let mut progress = ConsoleProgress::stdout();
            self.download_with_progress(file_id, &mut progress).await
        } else {
            self.download_with_progress(file_id, &mut NoProgress).await
        }
    }

    /// Download a file into memory, reporting each chunk to `progress`.
    pub async fn download_with_progress(
        &self,
        file_id: &str,
        progress: &mut dyn DownloadProgress,
    ) -> Result<Cursor<Vec<u8>>> {
        download_to_buffer(
            self.session.as_ref(),
            file_id,
            self.download_chunk_size,
            progress,
        )
        .await
    }

    /// Metadata with the server's default field set
    #[instrument(skip(self))]
    pub async fn get_metadata(&self, file_id: &str) -> Result<FileMetadata> {
        self.session.get(file_id).await
    }

    /// Every record matching `query`, across all pages, in arrival order.
    ///
    /// An error on any page discards the records already collected.
    #[instrument(skip(self), fields(query = %query.query))]
    pub async fn list_any(&self, query: &ListQuery) -> Result<Vec<FileMetadata>> {
        let files = self.pages(query).collect_all().await?;
        info!(files = files.len(), "Listing complete");
        Ok(files)
    }

    /// Like [`list_any`](Self::list_any), excluding folders
    pub async fn list_files(&self, query: &ListQuery) -> Result<Vec<FileMetadata>> {
        self.list_any(&query.clone().files_only()).await
    }

    /// Like [`list_any`](Self::list_any), folders only
    pub async fn list_folders(&self, query: &ListQuery) -> Result<Vec<FileMetadata>> {
        self.list_any(&query.clone().folders_only()).await
    }

    /// Lazy listing, one page per request
    pub fn pages(&self, query: &ListQuery) -> FilePager {
        let mut query = query.clone();
        if query.page_size.is_none() {
            query.page_size = self.page_size;
        }
        FilePager::new(self.session.clone(), &query)
    }
}
