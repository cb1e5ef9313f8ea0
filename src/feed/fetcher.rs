//! Feed retrieval.
//!
//! The sync engine only depends on the [`Fetcher`] trait; [`ReqwestFetcher`]
//! is the HTTP implementation used by the binary.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::config::FetchConfig;
use crate::feed::charset::decode_document;

/// Transport-level failure reported by a [`Fetcher`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request could not be sent or the response could not be read.
    #[error("request failed: {0}")]
    Request(String),

    /// The server answered with a non-success status.
    #[error("HTTP error: {0}")]
    Status(u16),

    /// The response body exceeds the configured limit.
    #[error("response too large: {actual} bytes (max {max} bytes)")]
    TooLarge {
        /// Configured limit.
        max: u64,
        /// Observed or announced size.
        actual: u64,
    },

    /// The HTTP client itself could not be set up.
    #[error("failed to create HTTP client: {0}")]
    Client(String),
}

/// Retrieves raw response bodies.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url` and return the body as UTF-8 text.
    async fn get(&self, url: &str) -> Result<String, TransportError>;
}

/// HTTP fetcher with timeouts, a redirect limit and a body size limit.
pub struct ReqwestFetcher {
    client: Client,
    max_body_bytes: u64,
}

impl ReqwestFetcher {
    /// Create a fetcher from the fetch configuration.
    pub fn new(config: &FetchConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn get(&self, url: &str) -> Result<String, TransportError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TransportError::Status(response.status().as_u16()));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_body_bytes {
                return Err(TransportError::TooLarge {
                    max: self.max_body_bytes,
                    actual: content_length,
                });
            }
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Request(format!("failed to read response: {e}")))?;

        if bytes.len() as u64 > self.max_body_bytes {
            return Err(TransportError::TooLarge {
                max: self.max_body_bytes,
                actual: bytes.len() as u64,
            });
        }

        Ok(decode_document(&bytes, content_type.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::parser::{FeedParser, FeedRsParser};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(max_body_bytes: u64) -> ReqwestFetcher {
        let config = FetchConfig {
            max_body_bytes,
            ..FetchConfig::default()
        };
        ReqwestFetcher::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_get_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rss"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<rss/>"))
            .mount(&server)
            .await;

        let body = fetcher(1024)
            .get(&format!("{}/rss", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<rss/>");
    }

    #[tokio::test]
    async fn test_get_decodes_declared_charset() {
        let server = MockServer::start().await;
        let doc = r#"<?xml version="1.0" encoding="windows-1251"?>
<rss version="2.0"><channel><title>Новости</title><description>d</description>
<item><title>Первая</title><link>https://example.com/1</link><guid>1</guid></item>
</channel></rss>"#;
        let (bytes, _, _) = encoding_rs::WINDOWS_1251.encode(doc);
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(bytes.into_owned(), "application/rss+xml"),
            )
            .mount(&server)
            .await;

        let body = fetcher(4096).get(&server.uri()).await.unwrap();
        let feed = FeedRsParser.parse(&body).unwrap();

        assert_eq!(feed.title, "Новости");
        assert_eq!(feed.entries[0].title, "Первая");
    }

    #[tokio::test]
    async fn test_get_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = fetcher(1024).get(&server.uri()).await;
        assert_eq!(result, Err(TransportError::Status(503)));
    }

    #[tokio::test]
    async fn test_get_body_too_large() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(64)))
            .mount(&server)
            .await;

        let result = fetcher(16).get(&server.uri()).await;
        assert!(matches!(
            result,
            Err(TransportError::TooLarge { max: 16, .. })
        ));
    }

    #[tokio::test]
    async fn test_get_connection_refused() {
        // Bind and drop a listener to get a port nobody is listening on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = fetcher(1024).get(&format!("http://{addr}/rss")).await;
        assert!(matches!(result, Err(TransportError::Request(_))));
    }

    #[test]
    fn test_transport_error_display() {
        assert_eq!(TransportError::Status(404).to_string(), "HTTP error: 404");
        assert_eq!(
            TransportError::TooLarge { max: 10, actual: 20 }.to_string(),
            "response too large: 20 bytes (max 10 bytes)"
        );
    }
}
