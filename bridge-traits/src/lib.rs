//! # Host Bridge Traits
//!
//! Capability traits the drive client needs from its host platform.
//!
//! ## Overview
//!
//! The core crates never talk to the network, the keychain or the clock
//! directly. They go through the traits defined here, which keeps every
//! remote call and every persisted credential injectable in tests.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Executes a single HTTP request
//! - [`SecureStore`](storage::SecureStore) - Credential persistence (token file, keychain)
//! - [`Clock`](time::Clock) - Time source for token expiry checks
//!
//! Desktop implementations live in `bridge-desktop`.
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Implementations convert their platform-specific errors into it and keep
//! `std::io::Error` intact through [`BridgeError::Io`](error::BridgeError::Io).
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so a single client can be shared
//! across tasks.

pub mod error;
pub mod http;
pub mod storage;
pub mod time;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use storage::SecureStore;
pub use time::{Clock, LogLevel, SystemClock};
