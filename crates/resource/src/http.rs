//! HTTP(S) document provider.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::ETAG;
use reqwest::{Client, Url};
use schsvg_traits::{Cancellation, DocumentSource, SourceError, SourceProvider};
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches documents over `http` or `https`.
///
/// The response body is buffered before tokenizing starts, so a slow origin
/// never holds the output stream half-written. An upstream `ETag` becomes
/// the document's validator.
#[derive(Debug, Clone)]
pub struct HttpSourceProvider {
    client: Client,
}

impl HttpSourceProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// A provider with its own client and the given request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("schsvg/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::Io(e.to_string()))?;
        Ok(Self::new(client))
    }

    /// Parses `location` and checks that it uses a supported scheme.
    pub fn parse_location(location: &str) -> Result<Url, SourceError> {
        let url = Url::parse(location)
            .map_err(|e| SourceError::InvalidLocation(format!("{location}: {e}")))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(SourceError::InvalidLocation(format!(
                "{location}: unsupported scheme '{other}'"
            ))),
        }
    }

    async fn fetch(&self, url: Url, location: &str) -> Result<DocumentSource, SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| request_error(location, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("GET {location} answered {status}");
            return Err(match status.as_u16() {
                404 => SourceError::NotFound(location.to_string()),
                403 => SourceError::AccessDenied(location.to_string()),
                code => SourceError::Upstream {
                    location: location.to_string(),
                    status: code,
                },
            });
        }

        let validator = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| request_error(location, e))?;

        debug!("fetched {} bytes from {location}", body.len());
        Ok(DocumentSource::from_bytes(location, body.to_vec()).with_validator(validator))
    }
}

impl Default for HttpSourceProvider {
    fn default() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT).unwrap_or_else(|_| Self::new(Client::new()))
    }
}

fn request_error(location: &str, err: reqwest::Error) -> SourceError {
    if err.is_timeout() {
        SourceError::Upstream {
            location: location.to_string(),
            status: 504,
        }
    } else {
        SourceError::Io(format!("{location}: {err}"))
    }
}

#[async_trait]
impl SourceProvider for HttpSourceProvider {
    async fn open(
        &self,
        location: &str,
        cancel: &Cancellation,
    ) -> Result<DocumentSource, SourceError> {
        let url = Self::parse_location(location)?;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                Err(SourceError::Io(format!("fetching '{location}' was cancelled")))
            }
            result = self.fetch(url, location) => result,
        }
    }

    /// Sibling documents share the directory and query string of `base`.
    fn resolve(&self, base: &str, name: &str) -> String {
        let Ok(base_url) = Url::parse(base) else {
            return name.to_string();
        };
        match base_url.join(name) {
            Ok(mut joined) => {
                joined.set_query(base_url.query());
                joined.to_string()
            }
            Err(_) => name.to_string(),
        }
    }

    fn name(&self) -> &'static str {
        "HttpSourceProvider"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned HTTP response and returns the base URL.
    async fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = vec![0u8; 4096];
            let _ = socket.read(&mut request).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn test_rejects_unsupported_schemes() {
        for location in ["ftp://example.com/a.sch", "file:///etc/passwd", "not a url"] {
            assert!(matches!(
                HttpSourceProvider::parse_location(location),
                Err(SourceError::InvalidLocation(_))
            ));
        }
        assert!(HttpSourceProvider::parse_location("https://example.com/a.sch").is_ok());
    }

    #[test]
    fn test_resolve_keeps_directory_and_query() {
        let provider = HttpSourceProvider::new(Client::new());
        assert_eq!(
            provider.resolve("https://example.com/boards/main.sch?token=abc", "power.lib"),
            "https://example.com/boards/power.lib?token=abc"
        );
        assert_eq!(
            provider.resolve("https://example.com/main.sch", "device.lib"),
            "https://example.com/device.lib"
        );
    }

    #[tokio::test]
    async fn test_fetch_reads_body_and_etag() {
        let base = serve_once(
            "HTTP/1.1 200 OK\r\nETag: \"v1\"\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
        )
        .await;
        let provider = HttpSourceProvider::new(Client::new());
        let location = format!("{base}/doc.sch");

        let mut source = provider
            .open(&location, &Cancellation::never())
            .await
            .unwrap();
        assert_eq!(source.validator.as_deref(), Some("\"v1\""));
        let mut body = String::new();
        source.reader.read_to_string(&mut body).await.unwrap();
        assert_eq!(body, "hello");
    }

    #[tokio::test]
    async fn test_fetch_maps_upstream_status() {
        let base = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let provider = HttpSourceProvider::new(Client::new());
        let err = provider
            .open(&format!("{base}/missing.sch"), &Cancellation::never())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }
}
