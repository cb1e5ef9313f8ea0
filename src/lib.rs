//! feedwatch - RSS subscription and polling engine
//!
//! Validates submitted feed URLs, loads and deduplicates feed entries, polls
//! every subscribed feed on a fixed interval and keeps an observable
//! application state in sync for the presentation layer.

pub mod config;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod feed;
pub mod feedback;
pub mod i18n;
pub mod logging;
pub mod state;

pub use config::Config;
pub use controller::{App, SubmitOutcome};
pub use dispatch::{Dispatcher, Renderer, TextRenderer};
pub use error::{FeedwatchError, Result};
pub use feed::{
    validate, Feed, FeedId, FeedSyncEngine, PollScheduler, Post, PostId, SyncError,
    ValidationError,
};
pub use feedback::FeedbackKey;
pub use i18n::{I18n, Translator};
pub use state::{ProcessState, StatePath, StateStore, StateValue};
