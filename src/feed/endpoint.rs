//! Retrieval endpoint: how a feed URL is turned into a request and how the
//! response is turned back into a feed document.

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::feed::charset::relabel_declaration;

/// Default retrieval endpoint (an allorigins-compatible proxy).
pub const DEFAULT_ENDPOINT: &str = "https://allorigins.hexlet.app/get";

/// Query parameter carrying the target feed URL.
const URL_PARAM: &str = "url";

/// Query parameter disabling the endpoint's cache.
const DISABLE_CACHE_PARAM: &str = "disableCache";

/// Failures of the endpoint transform.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EndpointError {
    /// The request URL could not be built.
    #[error("cannot build request URL: {0}")]
    RequestUrl(String),

    /// The endpoint reported that the upstream fetch failed.
    #[error("upstream fetch failed: {0}")]
    Upstream(String),

    /// The endpoint's response is not a valid envelope.
    #[error("malformed endpoint response: {0}")]
    Envelope(String),
}

/// Where feed documents are retrieved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalEndpoint {
    /// Fetch through a proxy answering with a JSON envelope.
    Proxy(Url),
    /// Fetch the feed URL itself.
    Direct,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    contents: Option<String>,
    #[serde(default)]
    status: Option<EnvelopeStatus>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeStatus {
    #[serde(default)]
    http_code: Option<u16>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

impl RetrievalEndpoint {
    /// Proxy endpoint at `base`.
    pub fn proxy(base: &str) -> Result<Self, EndpointError> {
        let url = Url::parse(base).map_err(|e| EndpointError::RequestUrl(e.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(EndpointError::RequestUrl(format!(
                "endpoint is not a base URL: {base}"
            )));
        }
        Ok(RetrievalEndpoint::Proxy(url))
    }

    /// Build the URL to request for `target`.
    pub fn request_url(&self, target: &str) -> Result<String, EndpointError> {
        match self {
            RetrievalEndpoint::Proxy(base) => {
                let mut url = base.clone();
                url.query_pairs_mut()
                    .append_pair(DISABLE_CACHE_PARAM, "true")
                    .append_pair(URL_PARAM, target);
                Ok(url.into())
            }
            RetrievalEndpoint::Direct => Url::parse(target)
                .map(String::from)
                .map_err(|e| EndpointError::RequestUrl(e.to_string())),
        }
    }

    /// Extract the feed document from a response body.
    pub fn extract_document(&self, body: String) -> Result<String, EndpointError> {
        match self {
            RetrievalEndpoint::Direct => Ok(body),
            RetrievalEndpoint::Proxy(_) => {
                let envelope: Envelope = serde_json::from_str(&body)
                    .map_err(|e| EndpointError::Envelope(e.to_string()))?;

                if let Some(status) = &envelope.status {
                    if let Some(error) = status.error.as_ref().filter(|e| !e.is_null()) {
                        return Err(EndpointError::Upstream(error_message(error)));
                    }
                    if let Some(code) = status.http_code {
                        if !(200..300).contains(&code) {
                            return Err(EndpointError::Upstream(format!("HTTP error: {code}")));
                        }
                    }
                }

                // The endpoint has already decoded the document.
                envelope
                    .contents
                    .map(|contents| relabel_declaration(&contents))
                    .ok_or_else(|| EndpointError::Upstream("no contents".to_string()))
            }
        }
    }
}

impl Default for RetrievalEndpoint {
    fn default() -> Self {
        // The constant is a valid absolute URL.
        match Url::parse(DEFAULT_ENDPOINT) {
            Ok(url) => RetrievalEndpoint::Proxy(url),
            Err(_) => RetrievalEndpoint::Direct,
        }
    }
}

fn error_message(error: &serde_json::Value) -> String {
    match error {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Object(map) => map
            .get("message")
            .or_else(|| map.get("code"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
        other => other.to_string(),
    }
}
