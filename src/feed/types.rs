//! Feed and post types.

use crate::feed::ids::{FeedId, PostId};

/// Maximum length for a post description, in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 10000;

/// Maximum feed document size in bytes (5MB).
pub const MAX_FEED_SIZE: u64 = 5 * 1024 * 1024;

/// Default delay between two poll cycles of the same feed, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;

/// A subscribed feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    /// Feed ID.
    pub id: FeedId,
    /// URL the user subscribed to.
    pub url: String,
    /// Feed title.
    pub title: String,
    /// Feed description.
    pub description: String,
}

/// A post discovered in a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Post ID.
    pub id: PostId,
    /// Feed this post belongs to.
    pub feed_id: FeedId,
    /// Feed-intrinsic identity of the entry (RSS guid or Atom id).
    pub guid: String,
    /// Post title.
    pub title: String,
    /// Post description (HTML tags stripped).
    pub description: String,
    /// Link to the original article.
    pub link: String,
}

/// Channel-level data extracted from a feed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFeed {
    /// Feed title.
    pub title: String,
    /// Feed description.
    pub description: String,
    /// Entries in document order.
    pub entries: Vec<ParsedEntry>,
}

impl ParsedFeed {
    /// Create a parsed feed without entries.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            entries: Vec::new(),
        }
    }

    /// Append an entry.
    pub fn with_entry(mut self, entry: ParsedEntry) -> Self {
        self.entries.push(entry);
        self
    }
}

/// Entry data extracted from a feed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEntry {
    /// Unique identifier.
    pub guid: String,
    /// Entry title.
    pub title: String,
    /// Entry description.
    pub description: String,
    /// Link to the original article.
    pub link: String,
}

impl ParsedEntry {
    /// Create an entry with empty description and link.
    pub fn new(guid: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            title: title.into(),
            description: String::new(),
            link: String::new(),
        }
    }

    /// Set the link.
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let desc = description.into();
        if desc.chars().count() > MAX_DESCRIPTION_LENGTH {
            self.description = desc.chars().take(MAX_DESCRIPTION_LENGTH).collect();
        } else {
            self.description = desc;
        }
        self
    }

    /// Turn this entry into a post owned by `feed_id`.
    pub fn into_post(self, id: PostId, feed_id: FeedId) -> Post {
        Post {
            id,
            feed_id,
            guid: self.guid,
            title: self.title,
            description: self.description,
            link: self.link,
        }
    }
}

/// Result of a first load: the new feed and its initial posts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// The newly minted feed.
    pub feed: Feed,
    /// Posts in parser order.
    pub posts: Vec<Post>,
}
