//! Identifiers for feeds and posts.
//!
//! Identifiers are minted by an [`IdGenerator`] owned by the sync engine, so
//! two engines never share a counter and tests can use deterministic ids.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Identifier of a subscribed feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeedId(Uuid);

impl FeedId {
    /// Wrap a raw UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "feed-{}", self.0)
    }
}

/// Identifier of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PostId(Uuid);

impl PostId {
    /// Wrap a raw UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "post-{}", self.0)
    }
}

/// Source of fresh identifiers.
///
/// Implementations must never hand out the same identifier twice.
pub trait IdGenerator: Send + Sync {
    /// Mint a new feed identifier.
    fn next_feed_id(&self) -> FeedId;

    /// Mint a new post identifier.
    fn next_post_id(&self) -> PostId;
}

/// Monotonic counter shared by feed and post ids.
///
/// The n-th id minted by an instance is `Uuid::from_u128(n)`, starting at 1.
#[derive(Debug, Default)]
pub struct SequentialIds {
    last: AtomicU64,
}

impl SequentialIds {
    /// Create a counter starting at 1.
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&self) -> Uuid {
        let n = self.last.fetch_add(1, Ordering::Relaxed) + 1;
        Uuid::from_u128(u128::from(n))
    }
}

impl IdGenerator for SequentialIds {
    fn next_feed_id(&self) -> FeedId {
        FeedId(self.next())
    }

    fn next_post_id(&self) -> PostId {
        PostId(self.next())
    }
}

/// Random (UUID v4) identifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_feed_id(&self) -> FeedId {
        FeedId(Uuid::new_v4())
    }

    fn next_post_id(&self) -> PostId {
        PostId(Uuid::new_v4())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sequential_ids_are_monotonic() {
        let ids = SequentialIds::new();
        let feed = ids.next_feed_id();
        let first = ids.next_post_id();
        let second = ids.next_post_id();

        assert_eq!(feed.as_uuid(), Uuid::from_u128(1));
        assert_eq!(first.as_uuid(), Uuid::from_u128(2));
        assert_eq!(second.as_uuid(), Uuid::from_u128(3));
    }

    #[test]
    fn test_sequential_ids_are_per_instance() {
        let a = SequentialIds::new();
        let b = SequentialIds::new();
        assert_eq!(a.next_post_id(), b.next_post_id());
    }

    #[test]
    fn test_random_ids_unique() {
        let ids = RandomIds;
        let minted: HashSet<PostId> = (0..100).map(|_| ids.next_post_id()).collect();
        assert_eq!(minted.len(), 100);
    }

    #[test]
    fn test_id_display() {
        let feed = FeedId::from_uuid(Uuid::from_u128(1));
        let post = PostId::from_uuid(Uuid::from_u128(2));
        assert_eq!(
            feed.to_string(),
            "feed-00000000-0000-0000-0000-000000000001"
        );
        assert!(post.to_string().starts_with("post-"));
    }
}
