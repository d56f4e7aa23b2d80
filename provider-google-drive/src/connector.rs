//! Google Drive API connector implementation
//!
//! Implements [`DriveSession`] against the Drive v3 REST API.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bytes::Bytes;
use core_auth::AccessTokenProvider;
use core_runtime::config::{DriveConfig, DEFAULT_API_BASE_URL, DEFAULT_UPLOAD_BASE_URL};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::error::{GoogleDriveError, Result};
use crate::session::DriveSession;
use crate::types::{ByteRange, FileListPage, FileMetadata, ListRequest, MediaChunk};

/// Google Drive API connector
///
/// Every request carries a bearer token from the [`AccessTokenProvider`],
/// which refreshes it when needed. Non-2xx responses become
/// [`GoogleDriveError::ApiError`] with the raw response body.
///
/// # Example
///
/// ```ignore
/// use provider_google_drive::{DriveSession, GoogleDriveConnector};
///
/// let connector = GoogleDriveConnector::new(http_client, credentials);
/// let metadata = connector.get("1AbC").await?;
/// ```
pub struct GoogleDriveConnector {
    http_client: Arc<dyn HttpClient>,
    tokens: Arc<dyn AccessTokenProvider>,
    api_base_url: String,
    upload_base_url: String,
    request_timeout: Option<Duration>,
}

impl GoogleDriveConnector {
    /// Create a connector for the public Google endpoints
    pub fn new(http_client: Arc<dyn HttpClient>, tokens: Arc<dyn AccessTokenProvider>) -> Self {
        Self {
            http_client,
            tokens,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            upload_base_url: DEFAULT_UPLOAD_BASE_URL.to_string(),
            request_timeout: None,
        }
    }

    /// Create a connector using the endpoints and timeout from `config`
    pub fn from_config(
        config: &DriveConfig,
        http_client: Arc<dyn HttpClient>,
        tokens: Arc<dyn AccessTokenProvider>,
    ) -> Self {
        Self {
            api_base_url: config.api_base_url.clone(),
            upload_base_url: config.upload_base_url.clone(),
            request_timeout: config.request_timeout,
            ..Self::new(http_client, tokens)
        }
    }

    /// Sign and send one request
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let token = self.tokens.access_token().await?;
        let request = request
            .bearer_token(token)
            .maybe_timeout(self.request_timeout);

        Ok(self.http_client.execute(request).await?)
    }

    fn check_status(response: HttpResponse) -> Result<HttpResponse> {
        if response.is_success() {
            Ok(response)
        } else {
            Err(Self::api_error(&response))
        }
    }

    fn api_error(response: &HttpResponse) -> GoogleDriveError {
        warn!(status = response.status, "Drive API request failed");
        GoogleDriveError::ApiError {
            status_code: response.status,
            message: String::from_utf8_lossy(&response.body).to_string(),
        }
    }

    fn parse<T: DeserializeOwned>(response: &HttpResponse, what: &str) -> Result<T> {
        serde_json::from_slice(&response.body)
            .map_err(|e| GoogleDriveError::ParseError(format!("Failed to parse {}: {}", what, e)))
    }

    fn multipart_body(
        boundary: &str,
        metadata: &FileMetadata,
        media: &[u8],
        mime_type: &str,
    ) -> Result<Vec<u8>> {
        let metadata_json = serde_json::to_vec(metadata).map_err(|e| {
            GoogleDriveError::ParseError(format!("Failed to serialize metadata: {}", e))
        })?;

        let mut body = Vec::with_capacity(media.len() + metadata_json.len() + 256);

        // Metadata part
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
        body.extend_from_slice(&metadata_json);
        body.extend_from_slice(b"\r\n");

        // Media part
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime_type).as_bytes());
        body.extend_from_slice(media);
        body.extend_from_slice(b"\r\n");

        body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
        Ok(body)
    }
}

/// Total size from a `Content-Range` value such as `bytes 0-99/1000` or `bytes */0`
fn parse_content_range(value: &str) -> Option<u64> {
    let (_, total) = value.trim().rsplit_once('/')?;
    total.trim().parse().ok()
}

#[async_trait]
impl DriveSession for GoogleDriveConnector {
    #[instrument(skip(self, metadata, media), fields(bytes = media.len(), mime_type = %mime_type))]
    async fn create(
        &self,
        metadata: &FileMetadata,
        media: Bytes,
        mime_type: &str,
        fields: &str,
    ) -> Result<FileMetadata> {
        let url = format!(
            "{}/files?uploadType=multipart&fields={}",
            self.upload_base_url,
            urlencoding::encode(fields)
        );

        let boundary = format!("drive-{}", Uuid::new_v4().simple());
        let body = Self::multipart_body(&boundary, metadata, &media, mime_type)?;

        let request = HttpRequest::new(HttpMethod::Post, url)
            .header(
                "Content-Type",
                format!("multipart/related; boundary={}", boundary),
            )
            .body(Bytes::from(body));

        let response = Self::check_status(self.send(request).await?)?;
        debug!("File created");
        Self::parse(&response, "created file")
    }

    #[instrument(skip(self))]
    async fn get(&self, file_id: &str) -> Result<FileMetadata> {
        let url = format!(
            "{}/files/{}",
            self.api_base_url,
            urlencoding::encode(file_id)
        );

        let request = HttpRequest::new(HttpMethod::Get, url).header("Accept", "application/json");
        let response = Self::check_status(self.send(request).await?)?;
        Self::parse(&response, "file metadata")
    }

    #[instrument(skip(self), fields(range = %range.header_value()))]
    async fn get_media(&self, file_id: &str, range: ByteRange) -> Result<MediaChunk> {
        let url = format!(
            "{}/files/{}?alt=media",
            self.api_base_url,
            urlencoding::encode(file_id)
        );

        let request =
            HttpRequest::new(HttpMethod::Get, url).header("Range", range.header_value());
        let response = self.send(request).await?;
        let content_range = response.header("Content-Range").and_then(parse_content_range);

        match response.status {
            200 | 206 => {
                // A plain 200 carries the whole file
                let total_size = content_range.or_else(|| {
                    (response.status == 200).then(|| range.start + response.body.len() as u64)
                });
                debug!(bytes = response.body.len(), total = ?total_size, "Received media chunk");
                Ok(MediaChunk {
                    data: response.body,
                    total_size,
                })
            }
            416 if content_range == Some(0) => {
                debug!("Remote file is empty");
                Ok(MediaChunk {
                    data: Bytes::new(),
                    total_size: Some(0),
                })
            }
            _ => Err(Self::api_error(&response)),
        }
    }

    #[instrument(skip(self, request), fields(has_page_token = request.page_token.is_some()))]
    async fn list(&self, request: &ListRequest) -> Result<FileListPage> {
        let mut url = format!(
            "{}/files?q={}&spaces={}&fields={}",
            self.api_base_url,
            urlencoding::encode(&request.query),
            urlencoding::encode(&request.spaces),
            urlencoding::encode(&request.fields)
        );

        if let Some(page_token) = &request.page_token {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(page_token)));
        }
        if let Some(page_size) = request.page_size {
            url.push_str(&format!("&pageSize={}", page_size));
        }

        let http_request =
            HttpRequest::new(HttpMethod::Get, url).header("Accept", "application/json");
        let response = Self::check_status(self.send(http_request).await?)?;

        let page: FileListPage = Self::parse(&response, "files list response")?;
        debug!(files = page.files.len(), has_next = page.next_page_token.is_some(), "Listed page");
        Ok(page)
    }
}
