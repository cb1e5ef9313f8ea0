//! Feedback taxonomy shared by the form, the dispatcher and the translator.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Prefix of translation keys for error feedback.
const ERROR_KEY_PREFIX: &str = "formFeedback.errors";

/// Feedback shown to the user after a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedbackKey {
    /// The URL field was empty.
    EmptyField,
    /// The input was not a well-formed URL.
    InvalidUrl,
    /// The URL is already subscribed.
    DuplicateUrl,
    /// The resource does not contain a valid feed.
    ParserError,
    /// The resource could not be retrieved.
    Network,
    /// The feed was added.
    Success,
}

impl FeedbackKey {
    /// Every key a translator must provide.
    pub const ALL: [FeedbackKey; 6] = [
        FeedbackKey::EmptyField,
        FeedbackKey::InvalidUrl,
        FeedbackKey::DuplicateUrl,
        FeedbackKey::ParserError,
        FeedbackKey::Network,
        FeedbackKey::Success,
    ];

    /// The stable key string.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackKey::EmptyField => "emptyField",
            FeedbackKey::InvalidUrl => "invalidUrl",
            FeedbackKey::DuplicateUrl => "duplicateUrl",
            FeedbackKey::ParserError => "parserError",
            FeedbackKey::Network => "network",
            FeedbackKey::Success => "success",
        }
    }

    /// The key used to look this feedback up in a locale.
    pub fn translation_key(&self) -> String {
        match self {
            FeedbackKey::Success => "formFeedback.success".to_string(),
            other => format!("{ERROR_KEY_PREFIX}.{}", other.as_str()),
        }
    }

    /// Whether this feedback reports a failure.
    pub fn is_error(&self) -> bool {
        !matches!(self, FeedbackKey::Success)
    }
}

impl fmt::Display for FeedbackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A feedback key outside the taxonomy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown feedback key: {0}")]
pub struct UnknownFeedbackKey(pub String);

impl FromStr for FeedbackKey {
    type Err = UnknownFeedbackKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeedbackKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownFeedbackKey(s.to_string()))
    }
}
