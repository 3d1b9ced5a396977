//! HTTP transport
//!
//! The download manager only needs "GET a URL, get back a status line, the
//! content length and a byte stream". [`Transport`] is that seam; [`UreqTransport`]
//! is the real implementation.

use std::io::Read;
use std::sync::OnceLock;
use std::time::Duration;

/// Default HTTP timeout in seconds
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Get HTTP timeout from environment variable or use default.
/// Cached for performance (only reads env var once).
pub fn http_timeout() -> Duration {
    static TIMEOUT: OnceLock<Duration> = OnceLock::new();
    *TIMEOUT.get_or_init(|| {
        let secs = std::env::var("PKGFETCH_HTTP_TIMEOUT")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
        // Clamp to reasonable range (5-300 seconds)
        Duration::from_secs(secs.clamp(5, 300))
    })
}

/// Response to a GET request, body not yet read.
pub struct HttpResponse {
    pub status: u16,
    pub reason: String,
    pub content_length: Option<u64>,
    pub body: Box<dyn Read + Send>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("reason", &self.reason)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Issues GET requests.
///
/// `Err` is a transport-level failure (DNS, connect, TLS, timeout). Any
/// response that arrives, including 4xx/5xx, is `Ok`.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpResponse, String>;
}

/// Blocking HTTP client backed by a shared ureq agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::with_timeout(http_timeout())
    }

    /// Timeout applies to connecting and to each read, not the whole body.
    pub fn with_timeout(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .user_agent(concat!("pkgfetch/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn into_response(response: ureq::Response) -> HttpResponse {
    let content_length = response
        .header("content-length")
        .and_then(|s| s.parse().ok());
    HttpResponse {
        status: response.status(),
        reason: response.status_text().to_string(),
        content_length,
        body: Box::new(response.into_reader()),
    }
}

impl Transport for UreqTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, String> {
        match self.agent.get(url).call() {
            Ok(response) => Ok(into_response(response)),
            // Error statuses still carry a full response
            Err(ureq::Error::Status(_, response)) => Ok(into_response(response)),
            Err(ureq::Error::Transport(t)) => Err(t.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_timeout_is_reasonable() {
        assert!(DEFAULT_HTTP_TIMEOUT_SECS >= 5);
        assert!(DEFAULT_HTTP_TIMEOUT_SECS <= 120);
        let timeout = http_timeout();
        assert!(timeout.as_secs() >= 5);
        assert!(timeout.as_secs() <= 300);
    }

    #[test]
    fn test_invalid_url_is_transport_error() {
        let result = UreqTransport::new().get("not-a-valid-url");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_get_success_exposes_length_and_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/core/x86_64/a.pkg.tar.zst"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 1000]))
            .mount(&mock_server)
            .await;

        let url = format!("{}/core/x86_64/a.pkg.tar.zst", mock_server.uri());
        let mut response = UreqTransport::new().get(&url).unwrap();

        assert!(response.is_success());
        assert_eq!(response.status, 200);
        assert_eq!(response.content_length, Some(1000));
        let mut body = Vec::new();
        response.body.read_to_end(&mut body).unwrap();
        assert_eq!(body.len(), 1000);
    }

    #[tokio::test]
    async fn test_get_404_is_response_not_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let url = format!("{}/missing", mock_server.uri());
        let response = UreqTransport::new().get(&url).unwrap();

        assert!(!response.is_success());
        assert_eq!(response.status, 404);
        assert_eq!(response.reason, "Not Found");
    }

    #[tokio::test]
    async fn test_get_500_is_response_not_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/error"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let url = format!("{}/error", mock_server.uri());
        let response = UreqTransport::new().get(&url).unwrap();
        assert_eq!(response.status, 500);
    }
}
