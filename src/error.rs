//! Error types for feedwatch.

use thiserror::Error;

use crate::feed::sync::SyncError;
use crate::feed::validation::ValidationError;
use crate::i18n::I18nError;
use crate::state::StateError;

/// Common error type for feedwatch.
#[derive(Error, Debug)]
pub enum FeedwatchError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A submitted URL was rejected.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Retrieving or parsing a feed failed.
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    /// A state mutation was rejected.
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// Translations could not be loaded or are incomplete.
    #[error("i18n error: {0}")]
    I18n(#[from] I18nError),

    /// The renderer failed to write its output.
    #[error("render error: {0}")]
    Render(String),
}

/// Result type alias for feedwatch operations.
pub type Result<T> = std::result::Result<T, FeedwatchError>;
