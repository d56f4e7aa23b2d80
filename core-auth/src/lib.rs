//! # Authorization
//!
//! Google OAuth 2.0 credentials for the Drive client.
//!
//! ## Overview
//!
//! - [`ClientSecrets`]: the application's `credentials.json`
//! - [`OAuthFlowManager`]: authorization-code exchange with PKCE and the refresh grant
//! - [`TokenStore`]: the persisted credential (`token.json`) behind a `SecureStore`
//! - [`AuthorizationPrompt`]: loopback or console capture of the authorization code
//! - [`Authenticator`]: loads the stored credential or runs the flow once
//! - [`Credentials`]: hands out access tokens, refreshing and persisting lazily

pub mod authenticator;
pub mod credentials;
pub mod error;
pub mod oauth;
pub mod prompt;
pub mod secrets;
pub mod token_store;
pub mod types;

pub use authenticator::Authenticator;
pub use credentials::{AccessTokenProvider, Credentials};
pub use error::{AuthError, Result};
pub use oauth::{OAuthConfig, OAuthFlowManager, PkceVerifier};
pub use prompt::{AuthorizationPrompt, AuthorizationResponse, ConsolePrompt, LoopbackPrompt};
pub use secrets::ClientSecrets;
pub use token_store::TokenStore;
pub use types::{AuthState, OAuthTokens, StoredCredential};
