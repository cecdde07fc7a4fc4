//! Retrying HTTP fetcher for PDF payloads.

pub mod retry;

pub use retry::RetryPolicy;

use std::time::Duration;

use crate::config::Config;
use crate::error::FetchError;

/// How far into the response body the `%PDF-` marker may appear.
/// Some servers prepend junk bytes before the header.
const PDF_MAGIC_WINDOW: usize = 1024;

pub struct Fetcher {
    client: reqwest::Client,
    insecure_client: reqwest::Client,
    policy: RetryPolicy,
    verify_tls: bool,
    insecure_domains: Vec<String>,
}

impl Fetcher {
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let timeout = Duration::from_secs(config.fetch.timeout_secs);
        Self::new(
            RetryPolicy::from_config(&config.fetch),
            timeout,
            config.verify_tls,
            config.insecure_domains.clone(),
        )
    }

    pub fn new(
        policy: RetryPolicy,
        timeout: Duration,
        verify_tls: bool,
        insecure_domains: Vec<String>,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let insecure_client = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;

        Ok(Self {
            client,
            insecure_client,
            policy,
            verify_tls,
            insecure_domains,
        })
    }

    /// Fetches the URL, retrying per the policy. Returns the raw PDF
    /// bytes or the error from the final attempt.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let parsed = validate_url(url)?;

        let mut last_error = FetchError::Request("no attempts made".to_string());
        for attempt in 1..=self.policy.max_attempts {
            match self.fetch_once(&parsed).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) => {
                    tracing::warn!(
                        url,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        error = %e,
                        "Fetch attempt failed"
                    );
                    last_error = e;
                }
            }

            if attempt < self.policy.max_attempts && !self.policy.delay.is_zero() {
                tokio::time::sleep(self.policy.delay).await;
            }
        }

        Err(last_error)
    }

    async fn fetch_once(&self, url: &reqwest::Url) -> Result<Vec<u8>, FetchError> {
        let client = if self.skip_verification(url) {
            &self.insecure_client
        } else {
            &self.client
        };

        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        let bytes = response.bytes().await.map_err(classify_error)?;

        if !looks_like_pdf(&bytes) {
            return Err(FetchError::InvalidContent(format!(
                "no PDF header found (content-type: {})",
                if content_type.is_empty() {
                    "unknown"
                } else {
                    &content_type
                }
            )));
        }

        Ok(bytes.to_vec())
    }

    fn skip_verification(&self, url: &reqwest::Url) -> bool {
        if !self.verify_tls {
            return true;
        }
        url.host_str()
            .map(|host| self.insecure_domains.iter().any(|d| d == host))
            .unwrap_or(false)
    }
}

fn validate_url(url: &str) -> Result<reqwest::Url, FetchError> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| FetchError::InvalidContent(format!("malformed URL '{}': {}", url, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FetchError::InvalidContent(format!(
            "unsupported URL scheme '{}'",
            other
        ))),
    }
}

/// Maps reqwest failures onto the fetch error taxonomy.
fn classify_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        return FetchError::Timeout;
    }

    // TLS failures surface as connect errors; inspect the source chain.
    let mut source: Option<&(dyn std::error::Error + 'static)> = std::error::Error::source(&e);
    while let Some(inner) = source {
        let msg = inner.to_string().to_ascii_lowercase();
        if msg.contains("certificate") || msg.contains("handshake") || msg.contains("tls") {
            return FetchError::Tls(inner.to_string());
        }
        source = inner.source();
    }

    FetchError::Request(e.to_string())
}

/// True when the payload carries a `%PDF-` marker near the start.
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(PDF_MAGIC_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Answers every connection with the given canned response and
    /// counts connections. One connection per fetch attempt, since the
    /// response closes the connection.
    fn spawn_response_server(response: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        (format!("http://{}", addr), hits)
    }

    fn test_fetcher() -> Fetcher {
        Fetcher::new(
            RetryPolicy::no_delay(2),
            Duration::from_secs(5),
            true,
            vec!["bad-certs.example.org".to_string()],
        )
        .unwrap()
    }

    #[test]
    fn test_looks_like_pdf() {
        assert!(looks_like_pdf(b"%PDF-1.5 rest of document"));
        assert!(looks_like_pdf(b"\xef\xbb\xbfjunk%PDF-1.4"));
        assert!(!looks_like_pdf(b"<html><body>404</body></html>"));
        assert!(!looks_like_pdf(b""));
        assert!(!looks_like_pdf(b"%PDF"));
    }

    #[test]
    fn test_validate_url_accepts_http_https() {
        assert!(validate_url("http://example.com/a.pdf").is_ok());
        assert!(validate_url("https://example.com/a.pdf").is_ok());
    }

    #[test]
    fn test_validate_url_rejects_other_schemes() {
        let err = validate_url("ftp://example.com/a.pdf").unwrap_err();
        assert!(matches!(err, FetchError::InvalidContent(_)));
    }

    #[test]
    fn test_validate_url_rejects_garbage() {
        assert!(validate_url("not a url").is_err());
    }

    #[tokio::test]
    async fn test_http_404_exhausts_all_attempts() {
        let (base, hits) = spawn_response_server(
            "HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        );
        let fetcher = Fetcher::new(
            RetryPolicy::no_delay(3),
            Duration::from_secs(5),
            true,
            vec![],
        )
        .unwrap();

        let err = fetcher.fetch(&format!("{}/a.pdf", base)).await.unwrap_err();
        assert!(matches!(err, FetchError::HttpStatus { status: 404 }));
        assert_eq!(err.kind(), "http_status");
        // Every configured attempt reached the server.
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fetch_returns_pdf_payload() {
        let (base, hits) = spawn_response_server(
            "HTTP/1.1 200 OK\r\ncontent-length: 9\r\nconnection: close\r\n\r\n%PDF-1.5 ",
        );
        let fetcher = test_fetcher();

        let bytes = fetcher.fetch(&format!("{}/a.pdf", base)).await.unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        // Success on the first attempt, no retries.
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_pdf_body_is_invalid_content() {
        let (base, _hits) = spawn_response_server(
            "HTTP/1.1 200 OK\r\ncontent-length: 14\r\nconnection: close\r\n\r\n<html>x</html>",
        );
        let fetcher = Fetcher::new(
            RetryPolicy::no_delay(1),
            Duration::from_secs(5),
            true,
            vec![],
        )
        .unwrap();

        let err = fetcher.fetch(&format!("{}/a.pdf", base)).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_content");
    }

    #[tokio::test]
    async fn test_fetch_invalid_scheme_fails_without_retry() {
        let fetcher = test_fetcher();
        let err = fetcher.fetch("file:///etc/passwd").await.unwrap_err();
        assert_eq!(err.kind(), "invalid_content");
    }

    #[test]
    fn test_skip_verification_for_listed_domain() {
        let fetcher = test_fetcher();
        let listed = reqwest::Url::parse("https://bad-certs.example.org/x.pdf").unwrap();
        let other = reqwest::Url::parse("https://example.com/x.pdf").unwrap();
        assert!(fetcher.skip_verification(&listed));
        assert!(!fetcher.skip_verification(&other));
    }

    #[test]
    fn test_skip_verification_when_globally_disabled() {
        let fetcher =
            Fetcher::new(RetryPolicy::no_delay(1), Duration::from_secs(5), false, vec![]).unwrap();
        let url = reqwest::Url::parse("https://example.com/x.pdf").unwrap();
        assert!(fetcher.skip_verification(&url));
    }
}
