//! Fetch → parse → deduplicate pipeline.
//!
//! [`FeedSyncEngine::subscribe`] performs the first load of a feed and
//! [`FeedSyncEngine::refresh`] finds entries that appeared since. Both share
//! the same retrieval and parsing step.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::feed::endpoint::{EndpointError, RetrievalEndpoint};
use crate::feed::fetcher::{Fetcher, TransportError};
use crate::feed::ids::IdGenerator;
use crate::feed::parser::{FeedParser, ParseError};
use crate::feed::types::{Feed, ParsedEntry, ParsedFeed, Post, Subscription};
use crate::feedback::FeedbackKey;

/// Failure of a subscribe or refresh run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The feed could not be retrieved.
    #[error("network error: {0}")]
    Network(String),

    /// The retrieved document is not a usable feed.
    #[error("parser error: {0}")]
    Parser(String),

    /// Anything else; callers must not swallow it.
    #[error("unknown error: {0}")]
    Unknown(String),
}

impl SyncError {
    /// Feedback for recoverable errors, `None` for [`SyncError::Unknown`].
    pub fn feedback_key(&self) -> Option<FeedbackKey> {
        match self {
            SyncError::Network(_) => Some(FeedbackKey::Network),
            SyncError::Parser(_) => Some(FeedbackKey::ParserError),
            SyncError::Unknown(_) => None,
        }
    }
}

impl From<TransportError> for SyncError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Client(_) => SyncError::Unknown(e.to_string()),
            _ => SyncError::Network(e.to_string()),
        }
    }
}

impl From<EndpointError> for SyncError {
    fn from(e: EndpointError) -> Self {
        match e {
            EndpointError::RequestUrl(_) => SyncError::Unknown(e.to_string()),
            EndpointError::Upstream(_) | EndpointError::Envelope(_) => {
                SyncError::Network(e.to_string())
            }
        }
    }
}

impl From<ParseError> for SyncError {
    fn from(e: ParseError) -> Self {
        SyncError::Parser(e.to_string())
    }
}

/// Retrieves feeds and mints feed/post records.
pub struct FeedSyncEngine {
    fetcher: Arc<dyn Fetcher>,
    parser: Arc<dyn FeedParser>,
    ids: Arc<dyn IdGenerator>,
    endpoint: RetrievalEndpoint,
}

impl FeedSyncEngine {
    /// Create an engine from its collaborators.
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        parser: Arc<dyn FeedParser>,
        ids: Arc<dyn IdGenerator>,
        endpoint: RetrievalEndpoint,
    ) -> Self {
        Self {
            fetcher,
            parser,
            ids,
            endpoint,
        }
    }

    /// The endpoint requests are routed through.
    pub fn endpoint(&self) -> &RetrievalEndpoint {
        &self.endpoint
    }

    /// Load a feed for the first time.
    ///
    /// Mints a new [`Feed`] and one [`Post`] per distinct entry, in parser
    /// order. Nothing is minted when retrieval or parsing fails.
    pub async fn subscribe(&self, url: &str) -> Result<Subscription, SyncError> {
        let parsed = self.load(url).await?;

        let feed = Feed {
            id: self.ids.next_feed_id(),
            url: url.to_string(),
            title: parsed.title,
            description: parsed.description,
        };
        let posts = self.mint_posts(&feed, parsed.entries, &HashSet::new());

        debug!(
            "Subscribed to {} ({}): {} post(s)",
            feed.url,
            feed.id,
            posts.len()
        );

        Ok(Subscription { feed, posts })
    }

    /// Fetch `feed` again and return posts for entries whose guid is not in
    /// `known_guids`, in parser order.
    pub async fn refresh(
        &self,
        feed: &Feed,
        known_guids: &HashSet<String>,
    ) -> Result<Vec<Post>, SyncError> {
        let parsed = self.load(&feed.url).await?;
        let posts = self.mint_posts(feed, parsed.entries, known_guids);

        debug!("Refreshed {}: {} new post(s)", feed.id, posts.len());

        Ok(posts)
    }

    /// Retrieve and parse the document behind `url`.
    async fn load(&self, url: &str) -> Result<ParsedFeed, SyncError> {
        let request_url = self.endpoint.request_url(url)?;
        let body = self.fetcher.get(&request_url).await?;
        let document = self.endpoint.extract_document(body)?;
        Ok(self.parser.parse(&document)?)
    }

    /// Mint posts for entries with unseen guids. An entry repeating a guid
    /// earlier in the same document is dropped.
    fn mint_posts(
        &self,
        feed: &Feed,
        entries: Vec<ParsedEntry>,
        known_guids: &HashSet<String>,
    ) -> Vec<Post> {
        let mut seen: HashSet<String> = HashSet::new();
        entries
            .into_iter()
            .filter(|entry| !known_guids.contains(&entry.guid))
            .filter(|entry| seen.insert(entry.guid.clone()))
            .map(|entry| entry.into_post(self.ids.next_post_id(), feed.id))
            .collect()
    }
}
