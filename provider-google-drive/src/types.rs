//! Request and response shapes for the Drive v3 files API.
//!
//! File records are kept as raw JSON objects: which keys are present depends
//! entirely on the field selection the caller asked for.

use bytes::Bytes;
use serde::Deserialize;
use std::path::PathBuf;

/// A file resource as returned by the API, keyed by field name
pub type FileMetadata = serde_json::Map<String, serde_json::Value>;

pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

pub const DEFAULT_QUERY: &str = "trashed = false";
pub const DEFAULT_LIST_FIELDS: &str = "id, name, parents";
pub const DEFAULT_SPACES: &str = "drive";
pub const DEFAULT_UPLOAD_FIELDS: &str = "name, id";

/// Filter and projection for listing files.
///
/// ```
/// use provider_google_drive::ListQuery;
///
/// let query = ListQuery::new().query("'root' in parents").folders_only();
/// assert_eq!(
///     query.query,
///     "'root' in parents and mimeType = 'application/vnd.google-apps.folder'"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Drive search expression
    pub query: String,
    /// Fields to return for each file
    pub fields: String,
    /// Comma-separated spaces to search
    pub spaces: String,
    /// `None` leaves the page size to the client or server default
    pub page_size: Option<u32>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            query: DEFAULT_QUERY.to_string(),
            fields: DEFAULT_LIST_FIELDS.to_string(),
            spaces: DEFAULT_SPACES.to_string(),
            page_size: None,
        }
    }
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = fields.into();
        self
    }

    pub fn spaces(mut self, spaces: impl Into<String>) -> Self {
        self.spaces = spaces.into();
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Append a conjunct with `and`. An empty query becomes the conjunct.
    pub fn and(mut self, conjunct: &str) -> Self {
        let base = self.query.trim();
        self.query = if base.is_empty() {
            conjunct.to_string()
        } else {
            format!("{} and {}", base, conjunct)
        };
        self
    }

    /// Restrict to anything that is not a folder
    pub fn files_only(self) -> Self {
        self.and(&format!("mimeType != '{}'", FOLDER_MIME_TYPE))
    }

    /// Restrict to folders
    pub fn folders_only(self) -> Self {
        self.and(&format!("mimeType = '{}'", FOLDER_MIME_TYPE))
    }

    /// Field selection sent to files.list
    pub fn response_fields(&self) -> String {
        format!("nextPageToken, files({})", self.fields)
    }
}

/// A local file to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Name the file gets in Drive
    pub name: String,
    pub path: PathBuf,
    pub mime_type: String,
    /// Field selection for the returned resource
    pub return_fields: String,
}

impl UploadRequest {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            mime_type: mime_type.into(),
            return_fields: DEFAULT_UPLOAD_FIELDS.to_string(),
        }
    }

    pub fn return_fields(mut self, fields: impl Into<String>) -> Self {
        self.return_fields = fields.into();
        self
    }
}

/// One files.list call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub query: String,
    pub spaces: String,
    /// Full field selection, including `nextPageToken`
    pub fields: String,
    pub page_token: Option<String>,
    pub page_size: Option<u32>,
}

/// One page of a files.list response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListPage {
    #[serde(default)]
    pub files: Vec<FileMetadata>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Inclusive byte range for a media request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// `len` bytes starting at `start`; `len` must be non-zero
    pub fn starting_at(start: u64, len: u64) -> Self {
        Self {
            start,
            end: start + len.max(1) - 1,
        }
    }

    pub fn size(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

/// Bytes returned for a ranged media request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaChunk {
    pub data: Bytes,
    /// Full size of the file, when the server reported it
    pub total_size: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_defaults() {
        let query = ListQuery::default();
        assert_eq!(query.query, "trashed = false");
        assert_eq!(query.fields, "id, name, parents");
        assert_eq!(query.spaces, "drive");
        assert_eq!(query.response_fields(), "nextPageToken, files(id, name, parents)");
    }

    #[test]
    fn test_files_only_inserts_separator() {
        let query = ListQuery::default().files_only();
        assert_eq!(
            query.query,
            "trashed = false and mimeType != 'application/vnd.google-apps.folder'"
        );
    }

    #[test]
    fn test_folders_only_on_empty_query() {
        let query = ListQuery::new().query("").folders_only();
        assert_eq!(query.query, "mimeType = 'application/vnd.google-apps.folder'");

        let query = ListQuery::new().query("   ").folders_only();
        assert_eq!(query.query, "mimeType = 'application/vnd.google-apps.folder'");
    }

    #[test]
    fn test_upload_request_default_fields() {
        let request = UploadRequest::new("report.pdf", "/tmp/report.pdf", "application/pdf");
        assert_eq!(request.return_fields, "name, id");

        let request = request.return_fields("id, size");
        assert_eq!(request.return_fields, "id, size");
    }

    #[test]
    fn test_byte_range() {
        let range = ByteRange::starting_at(0, 1024);
        assert_eq!(range.header_value(), "bytes=0-1023");
        assert_eq!(range.size(), 1024);

        let range = ByteRange::starting_at(1024, 1024);
        assert_eq!(range.header_value(), "bytes=1024-2047");
    }

    #[test]
    fn test_file_list_page_tolerates_missing_keys() {
        let page: FileListPage = serde_json::from_str("{}").unwrap();
        assert!(page.files.is_empty());
        assert_eq!(page.next_page_token, None);

        let page: FileListPage =
            serde_json::from_str(r#"{"nextPageToken":"t2","files":[{"id":"a"}]}"#).unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("t2"));
        assert_eq!(page.files[0]["id"], "a");
    }
}
