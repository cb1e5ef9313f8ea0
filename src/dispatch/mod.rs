//! Binds state notifications to a renderer.
//!
//! The [`Dispatcher`] registers one handler per rendered [`StatePath`] on a
//! [`StateStore`]. Each handler forwards the new value to the matching
//! [`Renderer`] callback together with the translator.

pub mod text;

use std::cell::RefCell;
use std::collections::HashSet;
use std::io;
use std::rc::Rc;

use tracing::{debug, error};

use crate::feed::ids::PostId;
use crate::feed::types::{Feed, Post};
use crate::feedback::FeedbackKey;
use crate::i18n::{I18nError, Translator};
use crate::state::{ProcessState, StatePath, StateStore, StateValue};
use crate::{FeedwatchError, Result};

pub use text::TextRenderer;

/// Message keys used by renderers besides the feedback taxonomy.
pub const VIEW_KEYS: [&str; 5] = ["feeds", "posts", "view", "read_full", "loading"];

/// Paths the dispatcher renders. `validatedLinks` is not presented.
pub const RENDERED_PATHS: [StatePath; 6] = [
    StatePath::FormProcessState,
    StatePath::FormFeedback,
    StatePath::Feeds,
    StatePath::Posts,
    StatePath::ReadPostIds,
    StatePath::ActivePostId,
];

/// Presentation callbacks, one per rendered path.
pub trait Renderer {
    /// The form moved to `state`.
    fn render_process_state(&mut self, state: ProcessState, t: &dyn Translator) -> io::Result<()>;

    /// The form feedback changed.
    fn render_feedback(&mut self, feedback: Option<FeedbackKey>, t: &dyn Translator)
        -> io::Result<()>;

    /// The feed list changed.
    fn render_feeds(&mut self, feeds: &[Feed], t: &dyn Translator) -> io::Result<()>;

    /// The post list changed.
    fn render_posts(
        &mut self,
        posts: &[Post],
        read: &HashSet<PostId>,
        t: &dyn Translator,
    ) -> io::Result<()>;

    /// The set of read posts changed.
    fn render_read_posts(
        &mut self,
        posts: &[Post],
        read: &HashSet<PostId>,
        t: &dyn Translator,
    ) -> io::Result<()>;

    /// The post shown in detail changed.
    fn render_active_post(&mut self, post: Option<&Post>, t: &dyn Translator) -> io::Result<()>;
}

/// Posts and read marks as last notified.
#[derive(Default)]
struct View {
    posts: Vec<Post>,
    read: HashSet<PostId>,
}

struct Context<R> {
    renderer: Rc<RefCell<R>>,
    translator: Rc<dyn Translator>,
    view: RefCell<View>,
}

impl<R: Renderer> Context<R> {
    fn dispatch(&self, path: StatePath, value: &StateValue) -> io::Result<()> {
        let t = self.translator.as_ref();
        let mut renderer = self.renderer.borrow_mut();

        match value {
            StateValue::ProcessState(state) => renderer.render_process_state(*state, t),
            StateValue::Feedback(feedback) => renderer.render_feedback(*feedback, t),
            StateValue::Feeds(feeds) => renderer.render_feeds(feeds, t),
            StateValue::Posts(posts) => {
                let mut view = self.view.borrow_mut();
                view.posts = posts.clone();
                renderer.render_posts(&view.posts, &view.read, t)
            }
            StateValue::ReadPostIds(read) => {
                let mut view = self.view.borrow_mut();
                view.read = read.clone();
                renderer.render_read_posts(&view.posts, &view.read, t)
            }
            StateValue::ActivePostId(id) => {
                let view = self.view.borrow();
                let post = id.and_then(|id| view.posts.iter().find(|post| post.id == id));
                renderer.render_active_post(post, t)
            }
            StateValue::ValidatedLinks(_) => {
                debug!("No renderer for {}", path);
                Ok(())
            }
        }
    }
}

/// The path → handler table connecting a store to a renderer.
pub struct Dispatcher<R> {
    context: Rc<Context<R>>,
}

impl<R: Renderer + 'static> Dispatcher<R> {
    /// Register rendering handlers on `store`.
    ///
    /// Fails before registering anything if `translator` lacks a message for
    /// any feedback key or view label.
    pub fn attach(
        store: &mut StateStore,
        renderer: Rc<RefCell<R>>,
        translator: Rc<dyn Translator>,
    ) -> Result<Self> {
        let feedback_keys: Vec<String> = FeedbackKey::ALL
            .iter()
            .map(FeedbackKey::translation_key)
            .collect();
        let required: Vec<&str> = feedback_keys
            .iter()
            .map(String::as_str)
            .chain(VIEW_KEYS.iter().copied())
            .collect();
        let missing = translator.missing_keys(&required);
        if !missing.is_empty() {
            return Err(FeedwatchError::I18n(I18nError::MissingKeys(missing)));
        }

        let context = Rc::new(Context {
            renderer,
            translator,
            view: RefCell::new(View::default()),
        });

        for path in RENDERED_PATHS {
            let context = Rc::clone(&context);
            store.subscribe(path, move |path, value| {
                if let Err(e) = context.dispatch(path, value) {
                    error!("Rendering {} failed: {}", path, e);
                }
            });
        }

        Ok(Self { context })
    }

    /// Render every path from the current state of `store`.
    pub fn render_all(&self, store: &StateStore) -> Result<()> {
        for path in RENDERED_PATHS {
            self.context
                .dispatch(path, &store.get(path))
                .map_err(|e| FeedwatchError::Render(format!("{path}: {e}")))?;
        }
        Ok(())
    }

    /// The renderer notifications are forwarded to.
    pub fn renderer(&self) -> Rc<RefCell<R>> {
        Rc::clone(&self.context.renderer)
    }
}
