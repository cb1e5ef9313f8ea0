//! Per-feed polling.
//!
//! Each polled feed gets its own task on the current `LocalSet`. A cycle
//! refreshes the feed, hands the new posts to the caller, then sleeps for the
//! poll interval, so cycles of one feed never overlap.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::feed::ids::FeedId;
use crate::feed::sync::{FeedSyncEngine, SyncError};
use crate::feed::types::{Feed, Post, DEFAULT_POLL_INTERVAL_MS};

/// Poll diagnostics for one feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollStats {
    /// Completed cycles, successful or not.
    pub cycles: u64,
    /// Failed cycles.
    pub failures: u64,
    /// Failed cycles since the last success.
    pub consecutive_failures: u32,
    /// Posts delivered to the caller.
    pub new_posts: u64,
    /// Message of the most recent failure.
    pub last_error: Option<String>,
    /// When the last successful cycle completed.
    pub last_success_at: Option<DateTime<Utc>>,
}

impl PollStats {
    fn record_success(&mut self, new_posts: usize) {
        self.cycles += 1;
        self.consecutive_failures = 0;
        self.new_posts += new_posts as u64;
        self.last_success_at = Some(Utc::now());
    }

    fn record_failure(&mut self, e: &SyncError) {
        self.cycles += 1;
        self.failures += 1;
        self.consecutive_failures += 1;
        self.last_error = Some(e.to_string());
    }
}

struct PollHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Runs one recurring refresh cycle per feed.
pub struct PollScheduler {
    engine: Arc<FeedSyncEngine>,
    interval: Duration,
    tasks: HashMap<FeedId, PollHandle>,
    stats: Rc<RefCell<HashMap<FeedId, PollStats>>>,
}

impl PollScheduler {
    /// Create a scheduler with the default 5 second interval.
    pub fn new(engine: Arc<FeedSyncEngine>) -> Self {
        Self::with_interval(engine, Duration::from_millis(DEFAULT_POLL_INTERVAL_MS))
    }

    /// Create a scheduler with a custom interval.
    pub fn with_interval(engine: Arc<FeedSyncEngine>, interval: Duration) -> Self {
        Self {
            engine,
            interval,
            tasks: HashMap::new(),
            stats: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Delay between two cycles of the same feed.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start polling `feed`.
    ///
    /// Every cycle reads the guids already known for the feed through
    /// `known_guids`, refreshes the feed and passes the new posts (possibly
    /// none) to `on_new_posts`. Failed cycles are logged and counted in
    /// [`PollStats`]; the next cycle is scheduled regardless.
    ///
    /// Must be called from within a `LocalSet`. Returns `false` if the feed
    /// is already being polled.
    pub fn start<G, F>(&mut self, feed: Feed, known_guids: G, on_new_posts: F) -> bool
    where
        G: Fn() -> HashSet<String> + 'static,
        F: FnMut(Vec<Post>) + 'static,
    {
        if self.tasks.contains_key(&feed.id) {
            debug!("Feed {} is already polled", feed.id);
            return false;
        }

        let feed_id = feed.id;
        let cancel = CancellationToken::new();
        self.stats.borrow_mut().insert(feed_id, PollStats::default());

        let task = tokio::task::spawn_local(poll_loop(
            Arc::clone(&self.engine),
            feed,
            self.interval,
            cancel.clone(),
            Rc::clone(&self.stats),
            known_guids,
            on_new_posts,
        ));

        self.tasks.insert(feed_id, PollHandle { cancel, task });
        info!(
            "Polling feed {} every {} ms",
            feed_id,
            self.interval.as_millis()
        );
        true
    }

    /// Stop polling a feed.
    ///
    /// Once this returns no further cycle of the feed runs and the result of
    /// an in-flight refresh is discarded. Returns `false` if the feed was not
    /// polled.
    pub fn stop(&mut self, feed_id: FeedId) -> bool {
        match self.tasks.remove(&feed_id) {
            Some(handle) => {
                handle.cancel.cancel();
                handle.task.abort();
                info!("Stopped polling feed {}", feed_id);
                true
            }
            None => false,
        }
    }

    /// Stop polling every feed.
    pub fn stop_all(&mut self) {
        let ids: Vec<FeedId> = self.tasks.keys().copied().collect();
        for id in ids {
            self.stop(id);
        }
    }

    /// Whether `feed_id` is being polled.
    pub fn is_polling(&self, feed_id: FeedId) -> bool {
        self.tasks.contains_key(&feed_id)
    }

    /// Feeds currently polled.
    pub fn polled_feeds(&self) -> Vec<FeedId> {
        self.tasks.keys().copied().collect()
    }

    /// Diagnostics for a feed that is or was polled.
    pub fn stats(&self, feed_id: FeedId) -> Option<PollStats> {
        self.stats.borrow().get(&feed_id).cloned()
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.stop_all();
    }
}

async fn poll_loop<G, F>(
    engine: Arc<FeedSyncEngine>,
    feed: Feed,
    interval: Duration,
    cancel: CancellationToken,
    stats: Rc<RefCell<HashMap<FeedId, PollStats>>>,
    known_guids: G,
    mut on_new_posts: F,
) where
    G: Fn() -> HashSet<String>,
    F: FnMut(Vec<Post>),
{
    loop {
        let known = known_guids();

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = engine.refresh(&feed, &known) => result,
        };

        if cancel.is_cancelled() {
            break;
        }

        match result {
            Ok(posts) => {
                if let Some(entry) = stats.borrow_mut().get_mut(&feed.id) {
                    entry.record_success(posts.len());
                }
                if !posts.is_empty() {
                    info!("Feed {}: {} new post(s)", feed.id, posts.len());
                }
                on_new_posts(posts);
            }
            Err(e) => {
                match &e {
                    SyncError::Unknown(_) => error!("Polling feed {} failed: {}", feed.id, e),
                    _ => warn!("Polling feed {} failed: {}", feed.id, e),
                }
                if let Some(entry) = stats.borrow_mut().get_mut(&feed.id) {
                    entry.record_failure(&e);
                }
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = sleep(interval) => {}
        }
    }

    debug!("Poll loop for feed {} finished", feed.id);
}
