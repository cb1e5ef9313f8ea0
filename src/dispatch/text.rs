//! Line-oriented renderer.

use std::collections::HashSet;
use std::io::{self, Write};

use crate::dispatch::Renderer;
use crate::feed::ids::PostId;
use crate::feed::types::{Feed, Post};
use crate::feedback::FeedbackKey;
use crate::i18n::Translator;
use crate::state::ProcessState;

/// Renders state changes as plain text lines.
///
/// Posts are numbered from 1 in display order; unread posts are marked with
/// `*`.
pub struct TextRenderer<W> {
    out: W,
    process_state: ProcessState,
}

impl<W: Write> TextRenderer<W> {
    /// Render into `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            process_state: ProcessState::Initialized,
        }
    }

    /// Last rendered process state.
    pub fn process_state(&self) -> ProcessState {
        self.process_state
    }

    /// The underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Consume the renderer, returning the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_posts(
        &mut self,
        posts: &[Post],
        read: &HashSet<PostId>,
        t: &dyn Translator,
    ) -> io::Result<()> {
        writeln!(self.out, "== {} ==", t.translate("posts"))?;
        for (index, post) in posts.iter().enumerate() {
            let mark = if read.contains(&post.id) { ' ' } else { '*' };
            writeln!(
                self.out,
                "{mark} {:>3}. {} <{}>",
                index + 1,
                post.title,
                post.link
            )?;
        }
        self.out.flush()
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn render_process_state(
        &mut self,
        state: ProcessState,
        t: &dyn Translator,
    ) -> io::Result<()> {
        self.process_state = state;
        if state == ProcessState::Loading {
            writeln!(self.out, "... {}", t.translate("loading"))?;
            self.out.flush()?;
        }
        Ok(())
    }

    fn render_feedback(
        &mut self,
        feedback: Option<FeedbackKey>,
        t: &dyn Translator,
    ) -> io::Result<()> {
        let Some(key) = feedback else {
            return Ok(());
        };
        let prefix = if key.is_error() { "!" } else { "+" };
        writeln!(self.out, "{prefix} {}", t.translate(&key.translation_key()))?;
        self.out.flush()
    }

    fn render_feeds(&mut self, feeds: &[Feed], t: &dyn Translator) -> io::Result<()> {
        writeln!(self.out, "== {} ==", t.translate("feeds"))?;
        for feed in feeds {
            writeln!(self.out, "# {}", feed.title)?;
            if !feed.description.is_empty() {
                writeln!(self.out, "  {}", feed.description)?;
            }
        }
        self.out.flush()
    }

    fn render_posts(
        &mut self,
        posts: &[Post],
        read: &HashSet<PostId>,
        t: &dyn Translator,
    ) -> io::Result<()> {
        self.write_posts(posts, read, t)
    }

    fn render_read_posts(
        &mut self,
        posts: &[Post],
        read: &HashSet<PostId>,
        t: &dyn Translator,
    ) -> io::Result<()> {
        self.write_posts(posts, read, t)
    }

    fn render_active_post(&mut self, post: Option<&Post>, t: &dyn Translator) -> io::Result<()> {
        let Some(post) = post else {
            return Ok(());
        };
        writeln!(self.out, "-- {}: {} --", t.translate("view"), post.title)?;
        if !post.description.is_empty() {
            writeln!(self.out, "{}", post.description)?;
        }
        writeln!(self.out, "{}: {}", t.translate("read_full"), post.link)?;
        self.out.flush()
    }
}
