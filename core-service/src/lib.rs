//! Core service bootstrap.
//!
//! Wires host-provided bridge implementations (HTTP, secure storage, clock)
//! and an authorization prompt into an authorized [`DriveClient`]. Desktop
//! hosts enable the `desktop-shims` feature and call [`connect`]; everyone
//! else builds [`DriveDependencies`] and calls [`connect_with`].

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::{
    http::HttpClient,
    storage::SecureStore,
    time::{Clock, SystemClock},
};
use core_auth::{AccessTokenProvider, Authenticator, AuthorizationPrompt, TokenStore};
use core_runtime::config::DriveConfig;
use provider_google_drive::{DriveClient, GoogleDriveConnector};
use tracing::{info, instrument};

/// Aggregated handle to everything a connection needs from the host.
pub struct DriveDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub secure_store: Arc<dyn SecureStore>,
    /// Key the token document is stored under in `secure_store`
    pub token_key: String,
    pub prompt: Arc<dyn AuthorizationPrompt>,
    pub clock: Arc<dyn Clock>,
}

impl DriveDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        secure_store: Arc<dyn SecureStore>,
        token_key: impl Into<String>,
        prompt: Arc<dyn AuthorizationPrompt>,
    ) -> Self {
        Self {
            http_client,
            secure_store,
            token_key: token_key.into(),
            prompt,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Authorize and build a client from explicit dependencies.
///
/// Runs the interactive authorization flow at most once, only when the
/// stored credential is missing or unusable. Any failure on the way is
/// fatal.
#[instrument(skip(config, deps), fields(token_key = %deps.token_key))]
pub async fn connect_with(config: &DriveConfig, deps: DriveDependencies) -> Result<DriveClient> {
    config.validate()?;

    let store = TokenStore::new(deps.secure_store, deps.token_key);
    let authenticator = Authenticator::new(
        store,
        deps.prompt,
        deps.http_client.clone(),
        config.credentials_path.clone(),
        config.scopes.clone(),
    )
    .with_clock(deps.clock);

    let credentials = authenticator.authorize().await?;
    let tokens: Arc<dyn AccessTokenProvider> = Arc::new(credentials);

    let connector = GoogleDriveConnector::from_config(config, deps.http_client, tokens);
    info!("Drive client ready");

    Ok(DriveClient::from_config(Arc::new(connector), config))
}

/// Convenience bootstrapper for desktop hosts.
///
/// Uses `reqwest` for HTTP, the token file at `config.token_path`, and a
/// loopback listener on the first free port of `config.auth_ports` for the
/// authorization redirect. The listener is only bound when the stored
/// credential is unusable.
///
/// ```no_run
/// # async fn example() -> core_service::Result<()> {
/// use core_runtime::config::DriveConfig;
///
/// let client = core_service::connect(&DriveConfig::default()).await?;
/// let metadata = client.get_metadata("1AbC").await?;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub async fn connect(config: &DriveConfig) -> Result<DriveClient> {
    use bridge_desktop::{FileSecureStore, ReqwestHttpClient};
    use core_auth::LoopbackPrompt;

    config.validate()?;

    let http_client = match config.request_timeout {
        Some(timeout) => ReqwestHttpClient::with_timeout(timeout)?,
        None => ReqwestHttpClient::new()?,
    };
    let (store, token_key) = FileSecureStore::for_file(&config.token_path)?;
    let prompt = LoopbackPrompt::new(config.auth_ports.clone());

    let deps = DriveDependencies::new(
        Arc::new(http_client),
        Arc::new(store),
        token_key,
        Arc::new(prompt),
    );
    connect_with(config, deps).await
}
