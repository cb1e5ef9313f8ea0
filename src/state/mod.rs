//! Observable application state.
//!
//! All state lives in a single [`ApplicationState`] owned by a
//! [`StateStore`]. Mutations go through [`StateStore::set`], which notifies
//! the handlers registered for the changed [`StatePath`].

pub mod path;
pub mod process;
pub mod store;

use std::collections::HashSet;

use thiserror::Error;

use crate::feed::ids::{FeedId, PostId};
use crate::feed::types::{Feed, Post};
use crate::feedback::FeedbackKey;

pub use path::StatePath;
pub use process::ProcessState;
pub use store::{Handler, StateStore};

/// State-related errors. Every variant indicates a defect in the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// A textual path does not name an observable field.
    #[error("unknown state path: {0}")]
    UnknownPath(String),

    /// A textual process state is not part of the state machine.
    #[error("unknown process state: {0}")]
    UnknownProcessState(String),

    /// The form cannot move between these states.
    #[error("invalid process state transition: {from} -> {to}")]
    InvalidTransition {
        /// Current state.
        from: ProcessState,
        /// Requested state.
        to: ProcessState,
    },

    /// A post refers to a feed that does not exist.
    #[error("unknown feed: {0}")]
    UnknownFeed(FeedId),

    /// A post id that does not exist.
    #[error("unknown post: {0}")]
    UnknownPost(PostId),

    /// A feed with this URL is already present.
    #[error("feed already present: {0}")]
    DuplicateFeed(String),

    /// The URL is already a validated link.
    #[error("link already validated: {0}")]
    DuplicateLink(String),

    /// A validated link must belong to a feed.
    #[error("no feed for link: {0}")]
    LinkWithoutFeed(String),

    /// A guid already present for the feed.
    #[error("duplicate guid {guid} for {feed_id}")]
    DuplicateGuid {
        /// Owning feed.
        feed_id: FeedId,
        /// Repeated guid.
        guid: String,
    },

    /// An identifier that is already in use.
    #[error("identifier already in use: {0}")]
    DuplicateId(String),
}

/// Form state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    /// Current process state.
    pub process_state: ProcessState,
    /// Feedback for the last submission.
    pub feedback: Option<FeedbackKey>,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            process_state: ProcessState::Initialized,
            feedback: None,
        }
    }
}

/// Presentation state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    /// Posts the user has opened.
    pub read_post_ids: HashSet<PostId>,
    /// Post currently shown in detail.
    pub active_post_id: Option<PostId>,
}

/// Feeds and posts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataState {
    /// Feeds in subscription order.
    pub feeds: Vec<Feed>,
    /// Posts, most recent batch first.
    pub posts: Vec<Post>,
}

/// Root of the application state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationState {
    /// Subscription form.
    pub form: FormState,
    /// URLs already subscribed.
    pub validated_links: HashSet<String>,
    /// Presentation state.
    pub ui_state: UiState,
    /// Feeds and posts.
    pub data: DataState,
}

/// Value of a path, as passed to handlers and returned by
/// [`StateStore::get`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateValue {
    /// `form.processState`
    ProcessState(ProcessState),
    /// `form.feedback`
    Feedback(Option<FeedbackKey>),
    /// `validatedLinks`
    ValidatedLinks(HashSet<String>),
    /// `data.feeds`
    Feeds(Vec<Feed>),
    /// `data.posts`
    Posts(Vec<Post>),
    /// `uiState.readPostIds`
    ReadPostIds(HashSet<PostId>),
    /// `uiState.activePostId`
    ActivePostId(Option<PostId>),
}

/// A single mutation of the application state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateUpdate {
    /// Move the form to another process state.
    ProcessState(ProcessState),
    /// Replace the form feedback.
    Feedback(Option<FeedbackKey>),
    /// Record a subscribed URL.
    AddValidatedLink(String),
    /// Append a feed.
    PushFeed(Feed),
    /// Put a batch of posts in front of the existing ones.
    PrependPosts(Vec<Post>),
    /// Mark a post as read.
    MarkRead(PostId),
    /// Show a post in detail, or nothing.
    ActivePost(Option<PostId>),
}

impl StateUpdate {
    /// Path changed by this update.
    pub fn path(&self) -> StatePath {
        match self {
            StateUpdate::ProcessState(_) => StatePath::FormProcessState,
            StateUpdate::Feedback(_) => StatePath::FormFeedback,
            StateUpdate::AddValidatedLink(_) => StatePath::ValidatedLinks,
            StateUpdate::PushFeed(_) => StatePath::Feeds,
            StateUpdate::PrependPosts(_) => StatePath::Posts,
            StateUpdate::MarkRead(_) => StatePath::ReadPostIds,
            StateUpdate::ActivePost(_) => StatePath::ActivePostId,
        }
    }
}
