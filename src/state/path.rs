//! Observable paths of the application state.

use std::fmt;
use std::str::FromStr;

use crate::state::StateError;

/// A field of the application state that subscribers can watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatePath {
    /// `form.processState`
    FormProcessState,
    /// `form.feedback`
    FormFeedback,
    /// `validatedLinks`
    ValidatedLinks,
    /// `data.feeds`
    Feeds,
    /// `data.posts`
    Posts,
    /// `uiState.readPostIds`
    ReadPostIds,
    /// `uiState.activePostId`
    ActivePostId,
}

impl StatePath {
    /// Every observable path.
    pub const ALL: [StatePath; 7] = [
        StatePath::FormProcessState,
        StatePath::FormFeedback,
        StatePath::ValidatedLinks,
        StatePath::Feeds,
        StatePath::Posts,
        StatePath::ReadPostIds,
        StatePath::ActivePostId,
    ];

    /// Dotted path name.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatePath::FormProcessState => "form.processState",
            StatePath::FormFeedback => "form.feedback",
            StatePath::ValidatedLinks => "validatedLinks",
            StatePath::Feeds => "data.feeds",
            StatePath::Posts => "data.posts",
            StatePath::ReadPostIds => "uiState.readPostIds",
            StatePath::ActivePostId => "uiState.activePostId",
        }
    }
}

impl fmt::Display for StatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatePath {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatePath::ALL
            .into_iter()
            .find(|path| path.as_str() == s)
            .ok_or_else(|| StateError::UnknownPath(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_names_roundtrip() {
        for path in StatePath::ALL {
            assert_eq!(path.as_str().parse::<StatePath>().unwrap(), path);
        }
    }

    #[test]
    fn test_unknown_path() {
        assert_eq!(
            "form.error".parse::<StatePath>(),
            Err(StateError::UnknownPath("form.error".to_string()))
        );
        // Prefixes are not paths.
        assert!("form".parse::<StatePath>().is_err());
    }
}
