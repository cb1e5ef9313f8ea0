//! Feed retrieval, parsing, deduplication and polling.

pub mod charset;
pub mod endpoint;
pub mod fetcher;
pub mod ids;
pub mod parser;
pub mod scheduler;
pub mod sync;
pub mod types;
pub mod validation;

pub use endpoint::{EndpointError, RetrievalEndpoint, DEFAULT_ENDPOINT};
pub use fetcher::{Fetcher, ReqwestFetcher, TransportError};
pub use ids::{FeedId, IdGenerator, PostId, RandomIds, SequentialIds};
pub use parser::{FeedParser, FeedRsParser, ParseError};
pub use scheduler::{PollScheduler, PollStats};
pub use sync::{FeedSyncEngine, SyncError};
pub use types::{
    Feed, ParsedEntry, ParsedFeed, Post, Subscription, DEFAULT_POLL_INTERVAL_MS,
    MAX_DESCRIPTION_LENGTH, MAX_FEED_SIZE,
};
pub use validation::{validate, ValidationError};
