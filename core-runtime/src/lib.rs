//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by the drive crates:
//! - Logging and tracing infrastructure
//! - Configuration management
//!
//! ## Overview
//!
//! [`config::DriveConfig`] carries every tunable the client reads (scopes,
//! token and credential locations, API endpoints, chunk and page sizes).
//! [`logging::init_logging`] installs the `tracing` subscriber used by every
//! crate in the workspace.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{DriveConfig, DriveConfigBuilder};
pub use error::{Error, Result};
