//! Test helpers for integration tests.
//!
//! Provides a scripted fetcher, RSS document builders and an [`App`] wired
//! to them.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, Instant};

use feedwatch::feed::{
    FeedParser, FeedRsParser, FeedSyncEngine, Fetcher, RetrievalEndpoint, SequentialIds,
    TransportError,
};
use feedwatch::{App, StateStore};

/// Poll interval used by the tests.
pub const INTERVAL: Duration = Duration::from_millis(5000);

/// Fetcher answering from per-URL response queues.
///
/// When a URL's queue is down to one response, that response is repeated.
/// Unknown URLs fail with a transport error. A URL can be given a latency,
/// during which its request stays in flight.
#[derive(Default)]
pub struct ScriptedFetcher {
    responses: Mutex<HashMap<String, VecDeque<Result<String, TransportError>>>>,
    latencies: Mutex<HashMap<String, Duration>>,
    requests: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later request for `url` take `latency` before answering.
    pub fn delay(&self, url: &str, latency: Duration) {
        self.latencies
            .lock()
            .unwrap()
            .insert(url.to_string(), latency);
    }

    /// Queue a successful response for `url`.
    pub fn respond(&self, url: &str, body: impl Into<String>) {
        self.push(url, Ok(body.into()));
    }

    /// Queue a transport failure for `url`.
    pub fn fail(&self, url: &str) {
        self.push(url, Err(TransportError::Request("connection reset".to_string())));
    }

    fn push(&self, url: &str, response: Result<String, TransportError>) {
        self.responses
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(response);
    }

    /// Every requested URL, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    /// When each request for `url` was issued, relative to `origin`.
    pub fn request_offsets(&self, url: &str, origin: Instant) -> Vec<Duration> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(requested, _)| requested.as_str() == url)
            .map(|(_, at)| at.saturating_duration_since(origin))
            .collect()
    }

    /// Number of requests made for `url`.
    pub fn request_count(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(requested, _)| requested.as_str() == url)
            .count()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn get(&self, url: &str) -> Result<String, TransportError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), Instant::now()));

        let latency = self.latencies.lock().unwrap().get(url).copied();
        if let Some(latency) = latency {
            sleep(latency).await;
        }

        let mut responses = self.responses.lock().unwrap();
        let Some(queue) = responses.get_mut(url) else {
            return Err(TransportError::Request(format!("no route to {url}")));
        };
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue
                .front()
                .cloned()
                .unwrap_or_else(|| Err(TransportError::Request("no response".to_string())))
        }
    }
}

/// An RSS 2.0 document with one item per guid.
pub fn rss(title: &str, guids: &[&str]) -> String {
    let items: String = guids
        .iter()
        .map(|guid| {
            format!(
                "<item><title>Post {guid}</title><link>https://example.com/{guid}</link>\
                 <description>About {guid}</description><guid>{guid}</guid></item>"
            )
        })
        .collect();
    format!(
        "<?xml version=\"1.0\"?><rss version=\"2.0\"><channel><title>{title}</title>\
         <link>https://example.com</link><description>{title} feed</description>\
         {items}</channel></rss>"
    )
}

/// Engine over `fetcher`, the feed-rs parser and sequential ids, fetching
/// directly.
pub fn engine(fetcher: Arc<ScriptedFetcher>) -> Arc<FeedSyncEngine> {
    let parser: Arc<dyn FeedParser> = Arc::new(FeedRsParser);
    Arc::new(FeedSyncEngine::new(
        fetcher,
        parser,
        Arc::new(SequentialIds::new()),
        RetrievalEndpoint::Direct,
    ))
}

/// App over a fresh store, polling every [`INTERVAL`].
pub fn app(fetcher: Arc<ScriptedFetcher>) -> App {
    App::new(
        Rc::new(RefCell::new(StateStore::new())),
        engine(fetcher),
        INTERVAL,
    )
}

/// Guids of the posts in the store, in display order.
pub fn post_guids(app: &App) -> Vec<String> {
    let store = app.store();
    let guids = store
        .borrow()
        .state()
        .data
        .posts
        .iter()
        .map(|post| post.guid.clone())
        .collect();
    guids
}
