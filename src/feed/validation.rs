//! URL validation for feed subscriptions.

use std::collections::HashSet;

use thiserror::Error;

use crate::feedback::FeedbackKey;

/// Why a submitted URL was rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Nothing was entered.
    #[error("URL must not be empty")]
    EmptyField,

    /// The input is not an absolute URL.
    #[error("invalid URL")]
    InvalidUrl,

    /// The URL is already subscribed.
    #[error("URL is already subscribed")]
    DuplicateUrl,
}

impl ValidationError {
    /// Feedback reported to the form for this error.
    pub fn feedback_key(&self) -> FeedbackKey {
        match self {
            ValidationError::EmptyField => FeedbackKey::EmptyField,
            ValidationError::InvalidUrl => FeedbackKey::InvalidUrl,
            ValidationError::DuplicateUrl => FeedbackKey::DuplicateUrl,
        }
    }
}

/// Validate a candidate feed URL against the already subscribed links.
///
/// A subscribed URL is always reported as [`ValidationError::DuplicateUrl`];
/// anything else must be non-empty and parse as an absolute `http` or
/// `https` URL with a host.
/// The input is returned unchanged on success.
///
/// # Examples
///
/// ```
/// use std::collections::HashSet;
/// use feedwatch::feed::validation::{validate, ValidationError};
///
/// let mut links = HashSet::new();
/// assert_eq!(validate("https://example.com/rss", &links).unwrap(), "https://example.com/rss");
/// links.insert("https://example.com/rss".to_string());
/// assert_eq!(validate("https://example.com/rss", &links), Err(ValidationError::DuplicateUrl));
/// assert_eq!(validate("", &links), Err(ValidationError::EmptyField));
/// ```
pub fn validate(
    candidate_url: &str,
    validated_links: &HashSet<String>,
) -> Result<String, ValidationError> {
    if validated_links.contains(candidate_url) {
        return Err(ValidationError::DuplicateUrl);
    }

    if candidate_url.is_empty() {
        return Err(ValidationError::EmptyField);
    }

    if !is_feed_url(candidate_url) {
        return Err(ValidationError::InvalidUrl);
    }

    Ok(candidate_url.to_string())
}

/// Schemes a feed can be fetched over.
const FEED_SCHEMES: [&str; 2] = ["http", "https"];

/// Check that the input parses as an absolute http(s) URL with a host.
fn is_feed_url(candidate: &str) -> bool {
    match url::Url::parse(candidate) {
        Ok(parsed) => FEED_SCHEMES.contains(&parsed.scheme()) && parsed.host().is_some(),
        Err(_) => false,
    }
}
