//! The observable state container.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::feed::ids::{FeedId, PostId};
use crate::feed::types::{Feed, Post};
use crate::feedback::FeedbackKey;
use crate::state::{
    ApplicationState, ProcessState, StateError, StatePath, StateUpdate, StateValue,
};

/// Callback invoked with the changed path and its new value.
pub type Handler = Box<dyn FnMut(StatePath, &StateValue)>;

/// Holds the application state and notifies subscribers of every change.
///
/// Handlers are matched on the exact path, run synchronously after the
/// mutation, in registration order. A mutation that changes nothing
/// notifies nobody.
pub struct StateStore {
    state: ApplicationState,
    handlers: HashMap<StatePath, Vec<Handler>>,
}

impl StateStore {
    /// Create a store with the initial state.
    pub fn new() -> Self {
        Self {
            state: ApplicationState::default(),
            handlers: HashMap::new(),
        }
    }

    /// The whole state tree.
    pub fn state(&self) -> &ApplicationState {
        &self.state
    }

    /// Current value of a path.
    pub fn get(&self, path: StatePath) -> StateValue {
        match path {
            StatePath::FormProcessState => StateValue::ProcessState(self.state.form.process_state),
            StatePath::FormFeedback => StateValue::Feedback(self.state.form.feedback),
            StatePath::ValidatedLinks => {
                StateValue::ValidatedLinks(self.state.validated_links.clone())
            }
            StatePath::Feeds => StateValue::Feeds(self.state.data.feeds.clone()),
            StatePath::Posts => StateValue::Posts(self.state.data.posts.clone()),
            StatePath::ReadPostIds => {
                StateValue::ReadPostIds(self.state.ui_state.read_post_ids.clone())
            }
            StatePath::ActivePostId => StateValue::ActivePostId(self.state.ui_state.active_post_id),
        }
    }

    /// Register a handler for `path`.
    pub fn subscribe<H>(&mut self, path: StatePath, handler: H)
    where
        H: FnMut(StatePath, &StateValue) + 'static,
    {
        self.handlers
            .entry(path)
            .or_default()
            .push(Box::new(handler));
    }

    /// Register a handler for a path given by name.
    ///
    /// Fails with [`StateError::UnknownPath`] if the name is not an
    /// observable path; nothing is registered in that case.
    pub fn subscribe_named<H>(&mut self, name: &str, handler: H) -> Result<StatePath, StateError>
    where
        H: FnMut(StatePath, &StateValue) + 'static,
    {
        let path: StatePath = name.parse()?;
        self.subscribe(path, handler);
        Ok(path)
    }

    /// Number of handlers registered for `path`.
    pub fn subscriber_count(&self, path: StatePath) -> usize {
        self.handlers.get(&path).map_or(0, Vec::len)
    }

    /// Apply a mutation and notify the path's handlers.
    ///
    /// Returns whether the state changed. Invalid mutations are rejected
    /// before anything is modified.
    pub fn set(&mut self, update: StateUpdate) -> Result<bool, StateError> {
        let path = update.path();
        if !self.apply(update)? {
            return Ok(false);
        }

        let value = self.get(path);
        trace!("state changed: {}", path);
        if let Some(handlers) = self.handlers.get_mut(&path) {
            for handler in handlers.iter_mut() {
                handler(path, &value);
            }
        }
        Ok(true)
    }

    /// Move the form to `next`.
    pub fn set_process_state(&mut self, next: ProcessState) -> Result<(), StateError> {
        self.set(StateUpdate::ProcessState(next)).map(|_| ())
    }

    /// Replace the form feedback.
    pub fn set_feedback(&mut self, feedback: Option<FeedbackKey>) -> Result<(), StateError> {
        self.set(StateUpdate::Feedback(feedback)).map(|_| ())
    }

    /// Record a subscribed URL. The feed must already be present.
    pub fn add_validated_link(&mut self, url: impl Into<String>) -> Result<(), StateError> {
        self.set(StateUpdate::AddValidatedLink(url.into()))
            .map(|_| ())
    }

    /// Append a feed.
    pub fn push_feed(&mut self, feed: Feed) -> Result<(), StateError> {
        self.set(StateUpdate::PushFeed(feed)).map(|_| ())
    }

    /// Put a batch of posts in front of the existing ones.
    pub fn prepend_posts(&mut self, posts: Vec<Post>) -> Result<(), StateError> {
        self.set(StateUpdate::PrependPosts(posts)).map(|_| ())
    }

    /// Mark a post as read.
    pub fn mark_read(&mut self, post_id: PostId) -> Result<(), StateError> {
        self.set(StateUpdate::MarkRead(post_id)).map(|_| ())
    }

    /// Show a post in detail, or clear the detail view.
    pub fn set_active_post(&mut self, post_id: Option<PostId>) -> Result<(), StateError> {
        self.set(StateUpdate::ActivePost(post_id)).map(|_| ())
    }

    /// Record a new subscription: the feed, its first posts and its URL.
    ///
    /// Everything is checked up front, so either all three paths change
    /// (notified in the order `data.feeds`, `data.posts`, `validatedLinks`)
    /// or nothing does.
    pub fn add_subscription(&mut self, feed: Feed, posts: Vec<Post>) -> Result<(), StateError> {
        if self.state.validated_links.contains(&feed.url) {
            return Err(StateError::DuplicateLink(feed.url));
        }
        self.check_new_feed(&feed)?;
        self.check_new_posts(&posts, Some(feed.id))?;

        let url = feed.url.clone();
        self.push_feed(feed)?;
        self.prepend_posts(posts)?;
        self.add_validated_link(url)
    }

    /// Guids already known for a feed.
    pub fn known_guids(&self, feed_id: FeedId) -> HashSet<String> {
        self.state
            .data
            .posts
            .iter()
            .filter(|post| post.feed_id == feed_id)
            .map(|post| post.guid.clone())
            .collect()
    }

    /// Look up a feed.
    pub fn feed(&self, feed_id: FeedId) -> Option<&Feed> {
        self.state.data.feeds.iter().find(|feed| feed.id == feed_id)
    }

    /// Look up a post.
    pub fn post(&self, post_id: PostId) -> Option<&Post> {
        self.state.data.posts.iter().find(|post| post.id == post_id)
    }

    /// Apply a mutation without notifying. Returns whether anything changed.
    fn apply(&mut self, update: StateUpdate) -> Result<bool, StateError> {
        match update {
            StateUpdate::ProcessState(next) => {
                let current = self.state.form.process_state;
                if !current.can_transition_to(next) {
                    return Err(StateError::InvalidTransition {
                        from: current,
                        to: next,
                    });
                }
                self.state.form.process_state = next;
                Ok(true)
            }
            StateUpdate::Feedback(feedback) => {
                if self.state.form.feedback == feedback {
                    return Ok(false);
                }
                self.state.form.feedback = feedback;
                Ok(true)
            }
            StateUpdate::AddValidatedLink(url) => {
                if self.state.validated_links.contains(&url) {
                    return Err(StateError::DuplicateLink(url));
                }
                if !self.state.data.feeds.iter().any(|feed| feed.url == url) {
                    return Err(StateError::LinkWithoutFeed(url));
                }
                self.state.validated_links.insert(url);
                Ok(true)
            }
            StateUpdate::PushFeed(feed) => {
                self.check_new_feed(&feed)?;
                self.state.data.feeds.push(feed);
                Ok(true)
            }
            StateUpdate::PrependPosts(posts) => {
                if posts.is_empty() {
                    return Ok(false);
                }
                self.check_new_posts(&posts, None)?;
                let mut merged = posts;
                merged.append(&mut self.state.data.posts);
                self.state.data.posts = merged;
                Ok(true)
            }
            StateUpdate::MarkRead(post_id) => {
                if self.post(post_id).is_none() {
                    return Err(StateError::UnknownPost(post_id));
                }
                Ok(self.state.ui_state.read_post_ids.insert(post_id))
            }
            StateUpdate::ActivePost(post_id) => {
                if let Some(id) = post_id {
                    if self.post(id).is_none() {
                        return Err(StateError::UnknownPost(id));
                    }
                }
                if self.state.ui_state.active_post_id == post_id {
                    return Ok(false);
                }
                self.state.ui_state.active_post_id = post_id;
                Ok(true)
            }
        }
    }

    fn check_new_feed(&self, feed: &Feed) -> Result<(), StateError> {
        for existing in &self.state.data.feeds {
            if existing.id == feed.id {
                return Err(StateError::DuplicateId(feed.id.to_string()));
            }
            if existing.url == feed.url {
                return Err(StateError::DuplicateFeed(feed.url.clone()));
            }
        }
        Ok(())
    }

    /// Check that a batch only refers to known feeds (or `pending_feed`,
    /// which is about to be added) and brings no duplicate guid or id.
    fn check_new_posts(
        &self,
        posts: &[Post],
        pending_feed: Option<FeedId>,
    ) -> Result<(), StateError> {
        let feed_ids: HashSet<FeedId> = self
            .state
            .data
            .feeds
            .iter()
            .map(|feed| feed.id)
            .chain(pending_feed)
            .collect();
        let mut guids: HashSet<(FeedId, &str)> = self
            .state
            .data
            .posts
            .iter()
            .map(|post| (post.feed_id, post.guid.as_str()))
            .collect();
        let mut ids: HashSet<PostId> = self.state.data.posts.iter().map(|post| post.id).collect();

        for post in posts {
            if !feed_ids.contains(&post.feed_id) {
                return Err(StateError::UnknownFeed(post.feed_id));
            }
            if !guids.insert((post.feed_id, post.guid.as_str())) {
                return Err(StateError::DuplicateGuid {
                    feed_id: post.feed_id,
                    guid: post.guid.clone(),
                });
            }
            if !ids.insert(post.id) {
                return Err(StateError::DuplicateId(post.id.to_string()));
            }
        }
        Ok(())
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}
