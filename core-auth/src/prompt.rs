//! Authorization Prompts
//!
//! The user-facing half of the authorization-code flow: show the
//! authorization URL and capture the code the provider redirects back with.
//!
//! - [`LoopbackPrompt`] listens on a local port and receives the redirect
//!   directly from the browser.
//! - [`ConsolePrompt`] asks the user to paste the redirected URL (or just the
//!   code) into the terminal.

use crate::error::{AuthError, Result};
use async_trait::async_trait;
use core_runtime::logging::redact_if_sensitive;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use url::Url;

const SUCCESS_PAGE: &str = "<html><body><p>The authentication flow has completed. \
You may close this window.</p></body></html>";

const FAILURE_PAGE: &str = "<html><body><p>Authorization failed. \
Return to the application for details.</p></body></html>";

const NOT_FOUND: &[u8] = b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

/// How long an accepted connection may take to send its request head
const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// What the provider sent back after the user approved (or not) the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationResponse {
    pub code: String,
    /// Absent when the user pasted a bare code
    pub state: Option<String>,
}

/// Obtains an authorization code from the user.
#[async_trait]
pub trait AuthorizationPrompt: Send + Sync {
    /// Redirect URI to register in the authorization request.
    ///
    /// Only called when authorization is actually needed, so an
    /// implementation may claim resources (such as a port) here.
    async fn redirect_uri(&self) -> Result<String>;

    /// Present `auth_url` to the user and wait for the authorization response.
    ///
    /// # Errors
    ///
    /// - [`AuthError::AuthorizationDenied`] if the provider reports an error
    /// - [`AuthError::PromptFailed`] if no response can be obtained
    async fn authorize(&self, auth_url: &str) -> Result<AuthorizationResponse>;
}

/// Receives the redirect on a local TCP port.
///
/// The listener is bound on first use. Accepted connections are served
/// concurrently and the first one carrying a code or an error ends the wait.
/// A code is only accepted together with the `state` sent in the
/// authorization URL.
pub struct LoopbackPrompt {
    ports: Vec<u16>,
    slot: Mutex<ListenerSlot>,
}

#[derive(Default)]
struct ListenerSlot {
    listener: Option<TcpListener>,
    port: Option<u16>,
}

impl LoopbackPrompt {
    /// Prompt that binds the first free port from `ports` when it is first
    /// needed. Port `0` asks the OS for any free port.
    pub fn new(ports: impl Into<Vec<u16>>) -> Self {
        Self {
            ports: ports.into(),
            slot: Mutex::new(ListenerSlot::default()),
        }
    }

    /// Like [`new`](Self::new), binding right away.
    pub async fn bind(ports: &[u16]) -> Result<Self> {
        let prompt = Self::new(ports);
        prompt.ensure_bound().await?;
        Ok(prompt)
    }

    /// The bound port; `None` until the listener is bound
    pub async fn port(&self) -> Option<u16> {
        self.slot.lock().await.port
    }

    async fn ensure_bound(&self) -> Result<u16> {
        let mut slot = self.slot.lock().await;
        if let Some(port) = slot.port {
            return Ok(port);
        }

        let listener = bind_first_free(&self.ports).await?;
        let port = listener.local_addr()?.port();
        debug!(port = port, "Bound authorization callback listener");

        slot.listener = Some(listener);
        slot.port = Some(port);
        Ok(port)
    }
}

async fn bind_first_free(ports: &[u16]) -> Result<TcpListener> {
    let mut last_error = None;

    for &port in ports {
        match TcpListener::bind((Ipv4Addr::LOCALHOST, port)).await {
            Ok(listener) => return Ok(listener),
            Err(e) => {
                debug!(port = port, error = %e, "Callback port unavailable");
                last_error = Some(e);
            }
        }
    }

    Err(AuthError::PromptFailed(format!(
        "No callback port available in {:?}{}",
        ports,
        last_error
            .map(|e| format!(": {}", e))
            .unwrap_or_default()
    )))
}

#[async_trait]
impl AuthorizationPrompt for LoopbackPrompt {
    async fn redirect_uri(&self) -> Result<String> {
        let port = self.ensure_bound().await?;
        Ok(format!("http://127.0.0.1:{}/", port))
    }

    async fn authorize(&self, auth_url: &str) -> Result<AuthorizationResponse> {
        let port = self.ensure_bound().await?;
        let listener = self.slot.lock().await.listener.take().ok_or_else(|| {
            AuthError::PromptFailed("Callback listener was already used".to_string())
        })?;
        let expected_state = query_param(auth_url, "state");

        println!("Go to the following link in your browser:\n\n    {}\n", auth_url);
        info!(port = port, "Waiting for authorization redirect");

        // Dropping the set aborts connections still being served
        let mut connections = JoinSet::new();
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer) = accepted?;
                    connections.spawn(answer_redirect(stream, peer, expected_state.clone()));
                }
                Some(joined) = connections.join_next() => match joined {
                    Ok(Some(outcome)) => return outcome,
                    Ok(None) => {}
                    Err(e) => debug!(error = %e, "Callback connection task ended abnormally"),
                },
            }
        }
    }
}

/// Serve one connection to the callback listener. `None` when it carried no
/// authorization response.
async fn answer_redirect(
    mut stream: TcpStream,
    peer: SocketAddr,
    expected_state: Option<String>,
) -> Option<Result<AuthorizationResponse>> {
    let (reader, mut writer) = stream.split();
    let mut reader = BufReader::new(reader);

    let target = match tokio::time::timeout(REQUEST_READ_TIMEOUT, read_request_target(&mut reader))
        .await
    {
        Ok(Ok(target)) => target,
        Ok(Err(e)) => {
            debug!(peer = %peer, error = %e, "Failed to read callback request");
            return None;
        }
        Err(_) => {
            debug!(peer = %peer, "Callback connection sent no request in time");
            return None;
        }
    };

    let Some(outcome) = parse_callback(&target) else {
        // Favicon, preconnects and other stray requests
        debug!(peer = %peer, "Ignoring request without authorization response");
        if let Err(e) = writer.write_all(NOT_FOUND).await {
            debug!(peer = %peer, error = %e, "Failed to answer stray request");
        }
        return None;
    };

    debug!(peer = %peer, query = %loggable_query(&target), "Received authorization redirect");
    let outcome = outcome.and_then(|response| check_state(response, expected_state.as_deref()));

    let page = if outcome.is_ok() { SUCCESS_PAGE } else { FAILURE_PAGE };
    let reply = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        page.len(),
        page
    );
    if let Err(e) = writer.write_all(reply.as_bytes()).await {
        warn!(error = %e, "Failed to answer authorization redirect");
    }
    if let Err(e) = writer.shutdown().await {
        warn!(error = %e, "Failed to close authorization redirect connection");
    }

    Some(outcome)
}

/// Read the request line and drain the headers, so closing the socket does
/// not reset it. Returns the request target.
async fn read_request_target<R>(reader: &mut R) -> io::Result<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;

    let mut header = String::new();
    while reader.read_line(&mut header).await? > 2 {
        header.clear();
    }

    Ok(request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or("/")
        .to_string())
}

/// A code must come back with the state that was sent out.
fn check_state(
    response: AuthorizationResponse,
    expected: Option<&str>,
) -> Result<AuthorizationResponse> {
    match expected {
        Some(expected) if response.state.as_deref() != Some(expected) => {
            warn!(
                has_state = response.state.is_some(),
                "Authorization redirect carried a missing or foreign state"
            );
            Err(AuthError::StateMismatch {
                expected: expected.to_string(),
                actual: response.state.unwrap_or_default(),
            })
        }
        _ => Ok(response),
    }
}

fn query_param(url: &str, name: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

fn loggable_query(target: &str) -> String {
    redirect_url(target)
        .map(|url| {
            url.query_pairs()
                .map(|(key, value)| format!("{}={}", key, redact_if_sensitive(&key, &value)))
                .collect::<Vec<_>>()
                .join("&")
        })
        .unwrap_or_default()
}

fn redirect_url(target: &str) -> Option<Url> {
    Url::parse("http://127.0.0.1").ok()?.join(target).ok()
}

/// Reads the redirected URL or the bare code from a line of input.
pub struct ConsolePrompt<R> {
    input: Mutex<R>,
    redirect_uri: String,
}

impl ConsolePrompt<BufReader<Stdin>> {
    /// Prompt on standard input
    pub fn stdin(redirect_uri: impl Into<String>) -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), redirect_uri)
    }
}

impl<R> ConsolePrompt<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(input: R, redirect_uri: impl Into<String>) -> Self {
        Self {
            input: Mutex::new(input),
            redirect_uri: redirect_uri.into(),
        }
    }
}

#[async_trait]
impl<R> AuthorizationPrompt for ConsolePrompt<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn redirect_uri(&self) -> Result<String> {
        Ok(self.redirect_uri.clone())
    }

    async fn authorize(&self, auth_url: &str) -> Result<AuthorizationResponse> {
        println!("Go to the following link in your browser:\n\n    {}\n", auth_url);
        println!("Paste the address you were redirected to (or the code): ");

        let mut line = String::new();
        let read = self.input.lock().await.read_line(&mut line).await?;
        if read == 0 {
            return Err(AuthError::PromptFailed(
                "Input closed before an authorization code was entered".to_string(),
            ));
        }

        let input = line.trim();
        if input.is_empty() {
            return Err(AuthError::PromptFailed(
                "No authorization code entered".to_string(),
            ));
        }

        if input.starts_with("http://") || input.starts_with("https://") {
            let url = Url::parse(input)
                .map_err(|e| AuthError::PromptFailed(format!("Unreadable URL: {}", e)))?;
            return response_from_query(&url).unwrap_or_else(|| {
                Err(AuthError::PromptFailed(
                    "Redirected URL carries no authorization code".to_string(),
                ))
            });
        }

        Ok(AuthorizationResponse {
            code: input.to_string(),
            state: None,
        })
    }
}

/// Extract the authorization response from a redirect request target such as
/// `/?code=...&state=...`. Returns `None` for requests that carry neither a
/// code nor an error.
pub fn parse_callback(target: &str) -> Option<Result<AuthorizationResponse>> {
    response_from_query(&redirect_url(target)?)
}

fn response_from_query(url: &Url) -> Option<Result<AuthorizationResponse>> {
    let mut code = None;
    let mut state = None;
    let mut error = None;

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Some(Err(AuthError::AuthorizationDenied(error)));
    }

    code.map(|code| Ok(AuthorizationResponse { code, state }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpStream;

    #[test]
    fn test_parse_callback_code_and_state() {
        let response = parse_callback("/?state=xyz&code=4/0AbC&scope=drive")
            .unwrap()
            .unwrap();
        assert_eq!(response.code, "4/0AbC");
        assert_eq!(response.state.as_deref(), Some("xyz"));
    }

    #[test]
    fn test_parse_callback_error() {
        let outcome = parse_callback("/?error=access_denied").unwrap();
        assert!(matches!(outcome, Err(AuthError::AuthorizationDenied(e)) if e == "access_denied"));
    }

    #[test]
    fn test_parse_callback_ignores_stray_requests() {
        assert!(parse_callback("/favicon.ico").is_none());
        assert!(parse_callback("/").is_none());
    }

    #[tokio::test]
    async fn test_console_prompt_accepts_bare_code() {
        let prompt = ConsolePrompt::new(std::io::Cursor::new(b"4/0AbC\n".to_vec()), "http://localhost");
        let response = prompt.authorize("https://accounts.example/auth").await.unwrap();

        assert_eq!(response.code, "4/0AbC");
        assert_eq!(response.state, None);
        assert_eq!(prompt.redirect_uri().await.unwrap(), "http://localhost");
    }

    #[tokio::test]
    async fn test_console_prompt_accepts_redirected_url() {
        let input = b"http://localhost/?state=s1&code=4%2F0AbC\n".to_vec();
        let prompt = ConsolePrompt::new(std::io::Cursor::new(input), "http://localhost");
        let response = prompt.authorize("https://accounts.example/auth").await.unwrap();

        assert_eq!(response.code, "4/0AbC");
        assert_eq!(response.state.as_deref(), Some("s1"));
    }

    #[tokio::test]
    async fn test_console_prompt_empty_input() {
        let prompt = ConsolePrompt::new(std::io::Cursor::new(Vec::new()), "http://localhost");
        let err = prompt.authorize("https://accounts.example/auth").await.unwrap_err();
        assert!(matches!(err, AuthError::PromptFailed(_)));
    }

    const AUTH_URL: &str = "https://accounts.example/auth?client_id=abc&state=s1";

    /// Send one GET to the callback listener and return the raw reply.
    async fn send_request(port: u16, target: &str) -> String {
        let mut stream = TcpStream::connect((Ipv4Addr::LOCALHOST, port)).await.unwrap();
        stream
            .write_all(format!("GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n", target).as_bytes())
            .await
            .unwrap();
        let mut reply = String::new();
        stream.read_to_string(&mut reply).await.unwrap();
        reply
    }

    fn waiting_prompt(
        prompt: &std::sync::Arc<LoopbackPrompt>,
    ) -> tokio::task::JoinHandle<Result<AuthorizationResponse>> {
        let prompt = prompt.clone();
        tokio::spawn(async move { prompt.authorize(AUTH_URL).await })
    }

    #[tokio::test]
    async fn test_loopback_prompt_receives_redirect() {
        let prompt = std::sync::Arc::new(LoopbackPrompt::bind(&[0]).await.unwrap());
        let port = prompt.port().await.unwrap();
        assert_eq!(
            prompt.redirect_uri().await.unwrap(),
            format!("http://127.0.0.1:{}/", port)
        );

        let waiting = waiting_prompt(&prompt);

        // A stray request first, then the real redirect
        let reply = send_request(port, "/favicon.ico").await;
        assert!(reply.starts_with("HTTP/1.1 404"));

        let reply = send_request(port, "/?code=4%2F0AbC&state=s1").await;
        assert!(reply.contains("authentication flow has completed"));

        let response = waiting.await.unwrap().unwrap();
        assert_eq!(response.code, "4/0AbC");
        assert_eq!(response.state.as_deref(), Some("s1"));

        // The listener is consumed by the first authorization
        assert!(prompt.authorize(AUTH_URL).await.is_err());
    }

    #[tokio::test]
    async fn test_loopback_prompt_is_not_blocked_by_idle_connection() {
        let prompt = std::sync::Arc::new(LoopbackPrompt::bind(&[0]).await.unwrap());
        let port = prompt.port().await.unwrap();
        let waiting = waiting_prompt(&prompt);

        // Browsers open sockets ahead of time and may never use them
        let _idle = TcpStream::connect((Ipv4Addr::LOCALHOST, port)).await.unwrap();

        let reply = tokio::time::timeout(
            Duration::from_secs(5),
            send_request(port, "/?code=4%2F0AbC&state=s1"),
        )
        .await
        .expect("redirect answered while another connection is idle");
        assert!(reply.contains("authentication flow has completed"));

        let response = tokio::time::timeout(Duration::from_secs(5), waiting)
            .await
            .expect("authorization finished")
            .unwrap()
            .unwrap();
        assert_eq!(response.code, "4/0AbC");
    }

    #[tokio::test]
    async fn test_loopback_prompt_rejects_code_without_state() {
        let prompt = std::sync::Arc::new(LoopbackPrompt::bind(&[0]).await.unwrap());
        let port = prompt.port().await.unwrap();
        let waiting = waiting_prompt(&prompt);

        let reply = send_request(port, "/?code=injected-code").await;
        assert!(reply.contains("Authorization failed"));

        let err = waiting.await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            AuthError::StateMismatch { ref expected, ref actual } if expected == "s1" && actual.is_empty()
        ));
    }

    #[tokio::test]
    async fn test_loopback_prompt_rejects_foreign_state() {
        let prompt = std::sync::Arc::new(LoopbackPrompt::bind(&[0]).await.unwrap());
        let port = prompt.port().await.unwrap();
        let waiting = waiting_prompt(&prompt);

        send_request(port, "/?code=injected-code&state=other").await;

        let err = waiting.await.unwrap().unwrap_err();
        assert!(matches!(err, AuthError::StateMismatch { ref actual, .. } if actual == "other"));
    }

    #[tokio::test]
    async fn test_loopback_prompt_binds_only_when_needed() {
        let busy = std::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let busy_port = busy.local_addr().unwrap().port();

        let prompt = LoopbackPrompt::new(vec![busy_port]);
        assert_eq!(prompt.port().await, None);

        let err = prompt.redirect_uri().await.unwrap_err();
        assert!(matches!(err, AuthError::PromptFailed(_)));
    }

    #[test]
    fn test_check_state_passes_without_expected_state() {
        let response = AuthorizationResponse {
            code: "4/0AbC".to_string(),
            state: None,
        };
        assert_eq!(check_state(response.clone(), None).unwrap(), response);
    }

    #[test]
    fn test_loggable_query_redacts_code() {
        assert_eq!(
            loggable_query("/?code=4%2F0AbC&state=s1"),
            "code=[REDACTED]&state=s1"
        );
    }
}
