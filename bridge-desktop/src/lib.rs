//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`
//! - `SecureStore` using plain files through `tokio::fs` (the `token.json` layout)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{FileSecureStore, ReqwestHttpClient};
//! use std::path::Path;
//!
//! let http_client = ReqwestHttpClient::new()?;
//! let (store, key) = FileSecureStore::for_file(Path::new("token.json"))?;
//! ```

mod file_store;
mod http;

pub use file_store::FileSecureStore;
pub use http::ReqwestHttpClient;
