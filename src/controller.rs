//! Application controller.
//!
//! [`App`] drives a submission through validation, the first load, the state
//! update and the hand-over to polling, and applies read-tracking requests.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use tokio::time::Duration;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::feed::endpoint::RetrievalEndpoint;
use crate::feed::fetcher::{Fetcher, ReqwestFetcher};
use crate::feed::ids::{FeedId, IdGenerator, PostId, RandomIds};
use crate::feed::parser::{FeedParser, FeedRsParser};
use crate::feed::scheduler::{PollScheduler, PollStats};
use crate::feed::sync::{FeedSyncEngine, SyncError};
use crate::feed::types::Feed;
use crate::feed::validation::{validate, ValidationError};
use crate::feedback::FeedbackKey;
use crate::state::{ProcessState, StateStore};
use crate::{FeedwatchError, Result};

/// How a submission ended, short of an unexpected error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The feed was subscribed and is now polled.
    Added(FeedId),
    /// The URL was rejected before any request was made.
    Rejected(ValidationError),
    /// The feed could not be retrieved or parsed.
    Failed(SyncError),
}

impl SubmitOutcome {
    /// Feedback shown for this outcome.
    pub fn feedback_key(&self) -> FeedbackKey {
        match self {
            SubmitOutcome::Added(_) => FeedbackKey::Success,
            SubmitOutcome::Rejected(e) => e.feedback_key(),
            SubmitOutcome::Failed(e) => e.feedback_key().unwrap_or(FeedbackKey::Network),
        }
    }
}

/// Ties the store, the sync engine and the poll scheduler together.
///
/// Must be used from within a `LocalSet`: subscribed feeds are polled by
/// local tasks.
pub struct App {
    store: Rc<RefCell<StateStore>>,
    engine: Arc<FeedSyncEngine>,
    scheduler: PollScheduler,
}

impl App {
    /// Create an app over `store` polling every `interval`.
    pub fn new(
        store: Rc<RefCell<StateStore>>,
        engine: Arc<FeedSyncEngine>,
        interval: Duration,
    ) -> Self {
        let scheduler = PollScheduler::with_interval(Arc::clone(&engine), interval);
        Self {
            store,
            engine,
            scheduler,
        }
    }

    /// Create an app with the HTTP fetcher, the feed-rs parser and random ids.
    pub fn from_config(config: &Config, store: Rc<RefCell<StateStore>>) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher> =
            Arc::new(ReqwestFetcher::new(&config.fetch).map_err(SyncError::from)?);
        let parser: Arc<dyn FeedParser> = Arc::new(FeedRsParser);
        let ids: Arc<dyn IdGenerator> = Arc::new(RandomIds);
        let endpoint: RetrievalEndpoint = config.fetch.retrieval_endpoint()?;

        let engine = FeedSyncEngine::new(fetcher, parser, ids, endpoint);
        Ok(Self::new(
            store,
            Arc::new(engine),
            Duration::from_millis(config.poll.interval_ms),
        ))
    }

    /// The shared state store.
    pub fn store(&self) -> Rc<RefCell<StateStore>> {
        Rc::clone(&self.store)
    }

    /// The sync engine.
    pub fn engine(&self) -> &Arc<FeedSyncEngine> {
        &self.engine
    }

    /// The poll scheduler.
    pub fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }

    /// Poll diagnostics for a feed.
    pub fn poll_stats(&self, feed_id: FeedId) -> Option<PollStats> {
        self.scheduler.stats(feed_id)
    }

    /// Submit a feed URL.
    ///
    /// Validation failures and network or parser errors are reported through
    /// the form state and returned as a [`SubmitOutcome`]. Anything else is
    /// returned as an error after handing the form back to the user.
    pub async fn submit(&mut self, input: &str) -> Result<SubmitOutcome> {
        self.begin_input()?;
        self.set_state(ProcessState::Validating)?;

        let validated = {
            let store = self.store.borrow();
            validate(input, &store.state().validated_links)
        };
        let url = match validated {
            Ok(url) => url,
            Err(e) => {
                info!("Rejected {:?}: {}", input, e);
                self.report(e.feedback_key(), ProcessState::Invalidated)?;
                return Ok(SubmitOutcome::Rejected(e));
            }
        };

        self.set_state(ProcessState::Validated)?;
        self.set_state(ProcessState::Loading)?;

        let subscription = match self.engine.subscribe(&url).await {
            Ok(subscription) => subscription,
            Err(e) => return self.fail(&url, e),
        };

        let feed = subscription.feed.clone();
        let recorded = self
            .store
            .borrow_mut()
            .add_subscription(subscription.feed, subscription.posts);
        if let Err(e) = recorded {
            error!("Cannot record subscription to {}: {}", url, e);
            self.set_state(ProcessState::Filling)?;
            return Err(e.into());
        }

        self.report(FeedbackKey::Success, ProcessState::Added)?;
        info!("Subscribed to {} as {}", feed.url, feed.id);

        let feed_id = feed.id;
        self.start_polling(feed);
        self.set_state(ProcessState::Filling)?;

        Ok(SubmitOutcome::Added(feed_id))
    }

    /// Show a post in detail and mark it as read.
    pub fn open_post(&self, post_id: PostId) -> Result<()> {
        let mut store = self.store.borrow_mut();
        store.set_active_post(Some(post_id))?;
        store.mark_read(post_id)?;
        Ok(())
    }

    /// Close the detail view.
    pub fn close_post(&self) -> Result<()> {
        self.store.borrow_mut().set_active_post(None)?;
        Ok(())
    }

    /// Mark a post as read without opening it.
    pub fn mark_post_read(&self, post_id: PostId) -> Result<()> {
        self.store.borrow_mut().mark_read(post_id)?;
        Ok(())
    }

    /// Stop polling every feed.
    pub fn shutdown(&mut self) {
        self.scheduler.stop_all();
        info!("Polling stopped");
    }

    fn start_polling(&mut self, feed: Feed) {
        let feed_id = feed.id;
        let guids_store = Rc::clone(&self.store);
        let posts_store = Rc::clone(&self.store);

        self.scheduler.start(
            feed,
            move || guids_store.borrow().known_guids(feed_id),
            move |posts| {
                if let Err(e) = posts_store.borrow_mut().prepend_posts(posts) {
                    error!("Cannot merge posts of {}: {}", feed_id, e);
                }
            },
        );
    }

    /// Put the form back into `Filling` and clear the previous feedback.
    fn begin_input(&self) -> Result<()> {
        let mut store = self.store.borrow_mut();
        if store.state().form.process_state != ProcessState::Filling {
            store.set_process_state(ProcessState::Filling)?;
        }
        store.set_feedback(None)?;
        Ok(())
    }

    fn fail(&self, url: &str, e: SyncError) -> Result<SubmitOutcome> {
        match e.feedback_key() {
            Some(key) => {
                warn!("Cannot load {}: {}", url, e);
                let state = if key == FeedbackKey::ParserError {
                    ProcessState::ParserError
                } else {
                    ProcessState::NetworkError
                };
                self.report(key, state)?;
                Ok(SubmitOutcome::Failed(e))
            }
            None => {
                error!("Unexpected failure loading {}: {}", url, e);
                self.set_state(ProcessState::Filling)?;
                Err(FeedwatchError::Sync(e))
            }
        }
    }

    fn report(&self, feedback: FeedbackKey, state: ProcessState) -> Result<()> {
        let mut store = self.store.borrow_mut();
        store.set_feedback(Some(feedback))?;
        store.set_process_state(state)?;
        Ok(())
    }

    fn set_state(&self, state: ProcessState) -> Result<()> {
        self.store.borrow_mut().set_process_state(state)?;
        Ok(())
    }
}
