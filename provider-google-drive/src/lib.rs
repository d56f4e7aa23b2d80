//! # Google Drive Provider
//!
//! Drive v3 operations over an authorized session.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`DriveSession`]: the four Drive calls the client needs (create, get,
//!   get media, list), implemented over HTTP by [`GoogleDriveConnector`]
//! - [`DriveClient`]: single-request multipart upload, chunked download
//!   into memory with progress, metadata lookup and paginated listing
//! - [`FilePager`]: lazy page-at-a-time listing
//!
//! ## Usage
//!
//! ```ignore
//! use provider_google_drive::{DriveClient, GoogleDriveConnector, ListQuery};
//! use std::sync::Arc;
//!
//! let connector = GoogleDriveConnector::new(http_client, credentials);
//! let client = DriveClient::new(Arc::new(connector));
//!
//! for file in client.list_files(&ListQuery::default()).await? {
//!     println!("{} {}", file["id"], file["name"]);
//! }
//! ```

pub mod client;
pub mod connector;
pub mod download;
pub mod error;
pub mod pager;
pub mod session;
pub mod types;

pub use client::DriveClient;
pub use connector::GoogleDriveConnector;
pub use download::{ConsoleProgress, DownloadProgress, DownloadStatus, NoProgress};
pub use error::{GoogleDriveError, Result};
pub use pager::FilePager;
pub use session::DriveSession;
pub use types::{
    ByteRange, FileListPage, FileMetadata, ListQuery, ListRequest, MediaChunk, UploadRequest,
    DEFAULT_LIST_FIELDS, DEFAULT_QUERY, DEFAULT_SPACES, DEFAULT_UPLOAD_FIELDS, FOLDER_MIME_TYPE,
};
