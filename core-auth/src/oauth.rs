//! OAuth 2.0 Authorization Flow with PKCE
//!
//! Implements the authorization-code grant (RFC 6749) with PKCE (RFC 7636)
//! and the refresh-token grant against Google's token endpoint.
//!
//! # Overview
//!
//! - Building authorization URLs with a PKCE challenge and a CSRF state
//! - Exchanging authorization codes for tokens
//! - Refreshing access tokens
//!
//! Each token request is a single attempt. Sensitive values (tokens, codes,
//! verifiers) are never logged.
//!
//! # Example
//!
//! ```no_run
//! use core_auth::oauth::{OAuthConfig, OAuthFlowManager};
//! use std::sync::Arc;
//!
//! # async fn example() -> core_auth::Result<()> {
//! # use bridge_traits::http::HttpClient;
//! # let http_client: Arc<dyn HttpClient> = todo!();
//! let config = OAuthConfig {
//!     client_id: "your-client-id".to_string(),
//!     client_secret: Some("your-client-secret".to_string()),
//!     redirect_uri: "http://127.0.0.1:8080/".to_string(),
//!     scopes: vec!["https://www.googleapis.com/auth/drive".to_string()],
//!     auth_url: "https://accounts.google.com/o/oauth2/auth".to_string(),
//!     token_url: "https://oauth2.googleapis.com/token".to_string(),
//! };
//!
//! let flow = OAuthFlowManager::new(config, http_client);
//! let (auth_url, verifier) = flow.build_auth_url()?;
//! // Send the user to auth_url, then exchange the returned code
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::secrets::ClientSecrets;
use crate::types::OAuthTokens;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::time::{Clock, SystemClock};
use bytes::Bytes;
use rand::Rng;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// OAuth 2.0 client configuration for one flow.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret (optional for public clients)
    pub client_secret: Option<String>,
    /// Redirect URI registered with the authorization prompt
    pub redirect_uri: String,
    /// List of OAuth scopes to request
    pub scopes: Vec<String>,
    /// Authorization endpoint URL
    pub auth_url: String,
    /// Token endpoint URL
    pub token_url: String,
}

impl OAuthConfig {
    pub fn from_secrets(
        secrets: &ClientSecrets,
        redirect_uri: impl Into<String>,
        scopes: &[String],
    ) -> Self {
        Self {
            client_id: secrets.client_id.clone(),
            client_secret: secrets.client_secret.clone(),
            redirect_uri: redirect_uri.into(),
            scopes: scopes.to_vec(),
            auth_url: secrets.auth_uri.clone(),
            token_url: secrets.token_uri.clone(),
        }
    }
}

/// PKCE (Proof Key for Code Exchange) verifier.
///
/// Only the challenge derived from the verifier is sent with the
/// authorization request; the verifier itself goes with the code exchange.
#[derive(Debug, Clone)]
pub struct PkceVerifier {
    verifier: String,
    state: String,
}

impl PkceVerifier {
    /// Generates a 32-byte code verifier and a 16-byte state, both
    /// base64url-encoded without padding.
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();

        let mut verifier_bytes = [0u8; 32];
        rng.fill(&mut verifier_bytes);
        let verifier = URL_SAFE_NO_PAD.encode(verifier_bytes);

        let mut state_bytes = [0u8; 16];
        rng.fill(&mut state_bytes);
        let state = URL_SAFE_NO_PAD.encode(state_bytes);

        Self { verifier, state }
    }

    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    /// S256 challenge: BASE64URL(SHA256(code_verifier))
    pub fn challenge(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }
}

impl Default for PkceVerifier {
    fn default() -> Self {
        Self::new()
    }
}

/// OAuth 2.0 flow manager.
pub struct OAuthFlowManager {
    config: OAuthConfig,
    http_client: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
}

impl OAuthFlowManager {
    pub fn new(config: OAuthConfig, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            config,
            http_client,
            clock: Arc::new(SystemClock),
        }
    }

    /// Use a specific time source for computing token expiry
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Build the authorization URL with PKCE challenge.
    ///
    /// Returns the URL to show the user and the verifier to keep for
    /// [`exchange_code`](Self::exchange_code). Offline access is requested so
    /// the response includes a refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured authorization endpoint is not a URL.
    #[instrument(skip(self))]
    pub fn build_auth_url(&self) -> Result<(String, PkceVerifier)> {
        let verifier = PkceVerifier::new();
        let challenge = verifier.challenge();

        let mut url = Url::parse(&self.config.auth_url)
            .map_err(|e| AuthError::Other(format!("Invalid auth URL: {}", e)))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("client_id", &self.config.client_id);
            query.append_pair("redirect_uri", &self.config.redirect_uri);
            query.append_pair("response_type", "code");
            query.append_pair("scope", &self.config.scopes.join(" "));
            query.append_pair("state", verifier.state());
            query.append_pair("code_challenge", &challenge);
            query.append_pair("code_challenge_method", "S256");
            query.append_pair("access_type", "offline");
            query.append_pair("prompt", "consent");
        }

        debug!("Built authorization URL");

        Ok((url.to_string(), verifier))
    }

    /// Exchange an authorization code for OAuth tokens.
    ///
    /// `state` is whatever the prompt captured alongside the code. It is
    /// compared with the verifier's state when present; a pasted bare code
    /// carries none.
    ///
    /// # Errors
    ///
    /// - [`AuthError::StateMismatch`] if the returned state differs
    /// - [`AuthError::InvalidAuthCode`] if the token endpoint rejects the code
    /// - [`AuthError::NetworkError`] if the request cannot be sent
    #[instrument(skip(self, code, state, verifier))]
    pub async fn exchange_code(
        &self,
        code: &str,
        state: Option<&str>,
        verifier: &PkceVerifier,
    ) -> Result<OAuthTokens> {
        if let Some(state) = state {
            if state != verifier.state() {
                warn!("OAuth state mismatch in authorization response");
                return Err(AuthError::StateMismatch {
                    expected: verifier.state().to_string(),
                    actual: state.to_string(),
                });
            }
        }

        let mut params = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("code_verifier", verifier.verifier()),
        ];
        if let Some(ref client_secret) = self.config.client_secret {
            params.push(("client_secret", client_secret.as_str()));
        }

        debug!("Exchanging authorization code for tokens");

        let response = self.post_form(&params).await?;

        if !response.is_success() {
            let status = response.status;
            let error_body = error_text(&response);
            warn!(status = status, error = %error_body, "Authorization code exchange failed");

            return Err(AuthError::InvalidAuthCode(format!(
                "Token endpoint returned {}: {}",
                status, error_body
            )));
        }

        let token_response = parse_token_response(&response)?;

        info!(
            expires_in = token_response.expires_in,
            has_refresh_token = token_response.refresh_token.is_some(),
            "Exchanged authorization code for tokens"
        );

        Ok(OAuthTokens::issued_at(
            token_response.access_token,
            token_response.refresh_token,
            token_response.expires_in,
            self.clock.now(),
        ))
    }

    /// Refresh an access token using a refresh token.
    ///
    /// The returned tokens carry a refresh token only if the endpoint issued
    /// a new one.
    ///
    /// # Errors
    ///
    /// - [`AuthError::TokenRejected`] for 4xx responses (revoked or expired grant)
    /// - [`AuthError::TokenRefreshFailed`] for other non-2xx responses
    /// - [`AuthError::NetworkError`] if the request cannot be sent
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<OAuthTokens> {
        let mut params = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
        ];
        if let Some(ref client_secret) = self.config.client_secret {
            params.push(("client_secret", client_secret.as_str()));
        }

        debug!("Refreshing access token");

        let response = self.post_form(&params).await?;

        if !response.is_success() {
            let status = response.status;
            let error_body = error_text(&response);
            warn!(status = status, error = %error_body, "Token refresh failed");

            if response.is_client_error() {
                return Err(AuthError::TokenRejected {
                    status,
                    message: error_body,
                });
            }
            return Err(AuthError::TokenRefreshFailed(format!(
                "Token endpoint returned {}: {}",
                status, error_body
            )));
        }

        let token_response = parse_token_response(&response)?;

        info!(
            expires_in = token_response.expires_in,
            "Refreshed access token"
        );

        Ok(OAuthTokens::issued_at(
            token_response.access_token,
            token_response.refresh_token,
            token_response.expires_in,
            self.clock.now(),
        ))
    }

    async fn post_form(&self, params: &[(&str, &str)]) -> Result<HttpResponse> {
        let encoded_body = serde_urlencoded::to_string(params)
            .map_err(|e| AuthError::Other(format!("Failed to encode token request: {}", e)))?;

        let request = HttpRequest::new(HttpMethod::Post, self.config.token_url.clone())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Bytes::from(encoded_body));

        self.http_client
            .execute(request)
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))
    }
}

fn error_text(response: &HttpResponse) -> String {
    response
        .text()
        .unwrap_or_else(|_| "Unable to read error response".to_string())
}

fn parse_token_response(response: &HttpResponse) -> Result<TokenResponse> {
    response
        .json()
        .map_err(|e| AuthError::Other(format!("Failed to parse token response: {}", e)))
}

/// JSON body of a successful token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn config() -> OAuthConfig {
        OAuthConfig {
            client_id: "test-client".to_string(),
            client_secret: Some("secret".to_string()),
            redirect_uri: "http://127.0.0.1:8080/".to_string(),
            scopes: vec!["scope1".to_string(), "scope2".to_string()],
            auth_url: "https://provider.com/auth".to_string(),
            token_url: "https://provider.com/token".to_string(),
        }
    }

    fn json_response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    fn form(request: &HttpRequest) -> HashMap<String, String> {
        serde_urlencoded::from_bytes(request.body.as_deref().unwrap_or_default()).unwrap()
    }

    #[test]
    fn test_pkce_verifier_generation() {
        let verifier = PkceVerifier::new();

        assert_eq!(verifier.verifier().len(), 43);
        assert!(!verifier.state().is_empty());
        assert_eq!(verifier.challenge(), verifier.challenge());

        let other = PkceVerifier::new();
        assert_ne!(verifier.verifier(), other.verifier());
        assert_ne!(verifier.state(), other.state());
    }

    #[test]
    fn test_pkce_challenge_known_value() {
        // RFC 7636 appendix B
        let verifier = PkceVerifier {
            verifier: "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk".to_string(),
            state: "state".to_string(),
        };
        assert_eq!(
            verifier.challenge(),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_build_auth_url() {
        let manager = OAuthFlowManager::new(config(), Arc::new(MockHttpClient::new()));
        let (url, verifier) = manager.build_auth_url().unwrap();

        let parsed = Url::parse(&url).unwrap();
        let query: HashMap<_, _> = parsed.query_pairs().into_owned().collect();

        assert_eq!(query["client_id"], "test-client");
        assert_eq!(query["redirect_uri"], "http://127.0.0.1:8080/");
        assert_eq!(query["response_type"], "code");
        assert_eq!(query["scope"], "scope1 scope2");
        assert_eq!(query["state"], verifier.state());
        assert_eq!(query["code_challenge"], verifier.challenge());
        assert_eq!(query["code_challenge_method"], "S256");
        assert_eq!(query["access_type"], "offline");
    }

    #[test]
    fn test_build_auth_url_invalid_url() {
        let mut config = config();
        config.auth_url = "not a valid url".to_string();

        let manager = OAuthFlowManager::new(config, Arc::new(MockHttpClient::new()));
        assert!(manager.build_auth_url().is_err());
    }

    #[tokio::test]
    async fn test_exchange_code_success() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .withf(|request| {
                let form = form(request);
                request.url == "https://provider.com/token"
                    && form["grant_type"] == "authorization_code"
                    && form["code"] == "4/0Ab"
                    && form["client_secret"] == "secret"
                    && form.contains_key("code_verifier")
            })
            .times(1)
            .returning(|_| {
                Ok(json_response(
                    200,
                    r#"{"access_token":"ya29.a","refresh_token":"1//r","expires_in":3599,"token_type":"Bearer"}"#,
                ))
            });

        let manager = OAuthFlowManager::new(config(), Arc::new(http))
            .with_clock(Arc::new(FixedClock(noon())));
        let verifier = PkceVerifier::new();

        let tokens = manager
            .exchange_code("4/0Ab", Some(verifier.state()), &verifier)
            .await
            .unwrap();

        assert_eq!(tokens.access_token, "ya29.a");
        assert_eq!(tokens.refresh_token.as_deref(), Some("1//r"));
        assert_eq!(tokens.expires_at, noon() + Duration::seconds(3599));
    }

    #[tokio::test]
    async fn test_exchange_code_state_mismatch_sends_nothing() {
        let http = MockHttpClient::new();
        let manager = OAuthFlowManager::new(config(), Arc::new(http));
        let verifier = PkceVerifier::new();

        let err = manager
            .exchange_code("code", Some("forged"), &verifier)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::StateMismatch { .. }));
    }

    #[tokio::test]
    async fn test_exchange_code_without_state() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(json_response(200, r#"{"access_token":"token"}"#)));

        let manager = OAuthFlowManager::new(config(), Arc::new(http))
            .with_clock(Arc::new(FixedClock(noon())));
        let verifier = PkceVerifier::new();

        let tokens = manager.exchange_code("code", None, &verifier).await.unwrap();
        assert_eq!(tokens.refresh_token, None);
        assert_eq!(tokens.expires_at, noon() + Duration::seconds(3600));
    }

    #[tokio::test]
    async fn test_exchange_code_rejected() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(json_response(400, r#"{"error":"invalid_grant"}"#)));

        let manager = OAuthFlowManager::new(config(), Arc::new(http));
        let verifier = PkceVerifier::new();

        let err = manager.exchange_code("bad", None, &verifier).await.unwrap_err();
        match err {
            AuthError::InvalidAuthCode(message) => assert!(message.contains("invalid_grant")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_refresh_is_single_attempt() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(json_response(503, "backend unavailable")));

        let manager = OAuthFlowManager::new(config(), Arc::new(http));
        let err = manager.refresh_access_token("1//r").await.unwrap_err();
        assert!(matches!(err, AuthError::TokenRefreshFailed(_)));
    }

    #[tokio::test]
    async fn test_refresh_rejected_with_client_error() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .withf(|request| {
                let form = form(request);
                form["grant_type"] == "refresh_token" && form["refresh_token"] == "1//revoked"
            })
            .times(1)
            .returning(|_| Ok(json_response(400, r#"{"error":"invalid_grant"}"#)));

        let manager = OAuthFlowManager::new(config(), Arc::new(http));
        let err = manager.refresh_access_token("1//revoked").await.unwrap_err();
        assert!(matches!(err, AuthError::TokenRejected { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_refresh_transport_failure() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Err(BridgeError::OperationFailed("connection reset".to_string())));

        let manager = OAuthFlowManager::new(config(), Arc::new(http));
        let err = manager.refresh_access_token("1//r").await.unwrap_err();
        assert!(matches!(err, AuthError::NetworkError(_)));
    }

    #[test]
    fn test_token_response_deserialization_minimal() {
        let response: TokenResponse = serde_json::from_str(r#"{"access_token":"token"}"#).unwrap();
        assert_eq!(response.access_token, "token");
        assert_eq!(response.refresh_token, None);
        assert_eq!(response.expires_in, 3600);
    }
}
