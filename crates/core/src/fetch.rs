//! Content fetching from URLs, files, and stdin.
//!
//! Every source yields a [`RawPage`]: the undecoded bytes plus whatever is
//! known about them. Decoding happens later in [`RawPage::decode`].

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::encoding::decode_markup;
use crate::{Result, Web2mdError};

/// HTTP client configuration for fetching web pages.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout: 30, user_agent: "Mozilla/5.0 (compatible; web2md/0.1)".to_string() }
    }
}

/// Raw bytes of a document, before any interpretation.
#[derive(Debug, Clone)]
pub struct RawPage {
    /// Final URL after redirects, if the page came from the network.
    pub url: Option<Url>,
    /// Declared Content-Type header value.
    pub content_type: Option<String>,
    /// Response body.
    pub bytes: Vec<u8>,
}

impl RawPage {
    /// Decode the bytes into HTML text.
    ///
    /// Consumes the page: the raw bytes are not needed once decoded.
    pub fn decode(self) -> Result<String> {
        decode_markup(&self.bytes, self.content_type.as_deref())
    }
}

/// Parse and validate a URL for fetching.
///
/// Only `http` and `https` are accepted.
pub fn parse_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| Web2mdError::InvalidUrl(format!("{url}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(Web2mdError::InvalidUrl(format!("unsupported scheme {scheme}:// (expected http or https)"))),
    }
}

/// Fetches a page from a URL.
///
/// Follows redirects and bounds the whole request by the configured timeout.
///
/// # Errors
///
/// - [`Web2mdError::InvalidUrl`] for unparsable or non-http(s) URLs
/// - [`Web2mdError::Timeout`] when the request exceeds `config.timeout`
/// - [`Web2mdError::HttpStatus`] for any non-2xx response
/// - [`Web2mdError::HttpError`] for every other transport failure
pub async fn fetch_url(url: &str, config: &FetchConfig) -> Result<RawPage> {
    let parsed_url = parse_url(url)?;

    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout))
        .user_agent(&config.user_agent)
        .build()
        .map_err(Web2mdError::HttpError)?;

    tracing::debug!(url = %parsed_url, timeout = config.timeout, "fetching page");

    let timeout = config.timeout;
    let map_err = |e: reqwest::Error| {
        if e.is_timeout() { Web2mdError::Timeout { timeout } } else { Web2mdError::HttpError(e) }
    };

    let response = client
        .get(parsed_url)
        .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
        .header("Accept-Language", "en-US,en;q=0.9")
        .send()
        .await
        .map_err(map_err)?;

    let status = response.status();
    let final_url = response.url().clone();

    if !status.is_success() {
        return Err(Web2mdError::HttpStatus { status: status.as_u16(), url: final_url.to_string() });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let bytes = response.bytes().await.map_err(map_err)?.to_vec();

    tracing::debug!(
        status = status.as_u16(),
        url = %final_url,
        content_type = content_type.as_deref().unwrap_or("-"),
        bytes = bytes.len(),
        "fetched page"
    );

    Ok(RawPage { url: Some(final_url), content_type, bytes })
}

/// Reads a page from a local file.
///
/// Callers should validate and sanitize the path when accepting user input.
pub fn fetch_file(path: impl AsRef<Path>) -> Result<RawPage> {
    let path_buf = PathBuf::from(path.as_ref());

    if !path_buf.is_file() {
        return Err(Web2mdError::FileNotFound(path_buf));
    }

    let bytes = fs::read(&path_buf)?;
    tracing::debug!(path = %path_buf.display(), bytes = bytes.len(), "read file");

    Ok(RawPage { url: None, content_type: None, bytes })
}

/// Reads a page from standard input until EOF.
pub fn fetch_stdin() -> Result<RawPage> {
    let mut bytes = Vec::new();
    std::io::stdin().read_to_end(&mut bytes)?;

    Ok(RawPage { url: None, content_type: None, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, 30);
        assert!(config.user_agent.contains("web2md"));
    }

    #[test]
    fn test_parse_url_rejects_missing_scheme() {
        assert!(matches!(parse_url("example.com"), Err(Web2mdError::InvalidUrl(_))));
    }

    #[test]
    fn test_parse_url_rejects_other_schemes() {
        assert!(matches!(parse_url("ftp://example.com/file"), Err(Web2mdError::InvalidUrl(_))));
        assert!(matches!(parse_url("file:///etc/passwd"), Err(Web2mdError::InvalidUrl(_))));
    }

    #[test]
    fn test_parse_url_accepts_http() {
        assert!(parse_url("http://example.com").is_ok());
        assert!(parse_url("https://example.com/a?b=c").is_ok());
    }

    #[tokio::test]
    async fn test_fetch_url_invalid() {
        let result = fetch_url("not-a-url", &FetchConfig::default()).await;
        assert!(matches!(result, Err(Web2mdError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_url_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/post")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body("<html><body><p>hello</p></body></html>")
            .expect(1)
            .create_async()
            .await;

        let page = fetch_url(&format!("{}/post", server.url()), &FetchConfig::default()).await.unwrap();

        assert_eq!(page.content_type.as_deref(), Some("text/html; charset=utf-8"));
        assert!(page.url.unwrap().as_str().ends_with("/post"));
        assert_eq!(page.bytes, b"<html><body><p>hello</p></body></html>");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_url_sends_user_agent() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .match_header("user-agent", "custom-agent/1.0")
            .with_status(200)
            .with_body("<p>ok</p>")
            .create_async()
            .await;

        let config = FetchConfig { user_agent: "custom-agent/1.0".to_string(), ..Default::default() };
        fetch_url(&server.url(), &config).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_url_not_found() {
        let mut server = Server::new_async().await;
        server.mock("GET", "/missing").with_status(404).with_body("gone").create_async().await;

        let result = fetch_url(&format!("{}/missing", server.url()), &FetchConfig::default()).await;
        assert!(matches!(result, Err(Web2mdError::HttpStatus { status: 404, .. })));
    }

    #[tokio::test]
    async fn test_fetch_url_server_error() {
        let mut server = Server::new_async().await;
        server.mock("GET", "/").with_status(503).create_async().await;

        let result = fetch_url(&server.url(), &FetchConfig::default()).await;
        assert!(matches!(result, Err(Web2mdError::HttpStatus { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_fetch_url_unreachable() {
        // Port 9 (discard) is closed on loopback in test environments
        let config = FetchConfig { timeout: 5, ..Default::default() };
        let result = fetch_url("http://127.0.0.1:9/", &config).await;
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), crate::ErrorKind::Fetch);
    }

    #[tokio::test]
    async fn test_fetch_url_timeout() {
        // Accepts connections and never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let config = FetchConfig { timeout: 1, ..Default::default() };
        let err = fetch_url(&format!("http://{addr}/slow"), &config).await.unwrap_err();
        server.abort();

        assert!(matches!(err, Web2mdError::Timeout { timeout: 1 }), "got {err:?}");
        assert_eq!(err.kind(), crate::ErrorKind::Fetch);
    }

    #[test]
    fn test_fetch_file_not_found() {
        let result = fetch_file("/nonexistent/path/file.html");
        assert!(matches!(result, Err(Web2mdError::FileNotFound(_))));
    }

    #[test]
    fn test_fetch_file_reads_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<p>local</p>").unwrap();

        let page = fetch_file(&path).unwrap();
        assert!(page.url.is_none());
        assert_eq!(page.decode().unwrap(), "<p>local</p>");
    }

    #[test]
    fn test_error_timeout_message() {
        let err = Web2mdError::Timeout { timeout: 30 };
        assert!(err.to_string().contains("30"));
    }
}
