//! Feed document parsing.
//!
//! [`FeedRsParser`] accepts RSS 0.9x/1.0/2.0, Atom and JSON Feed documents and
//! rejects anything that lacks the elements a post needs.

use feed_rs::parser;
use thiserror::Error;

use crate::feed::types::{ParsedEntry, ParsedFeed};

/// Why a document could not be turned into a feed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The document is not a well-formed feed.
    #[error("malformed feed document: {0}")]
    Malformed(String),

    /// A required element is absent.
    #[error("missing required element: {0}")]
    MissingElement(&'static str),
}

/// Turns raw feed documents into [`ParsedFeed`]s.
pub trait FeedParser: Send + Sync {
    /// Parse `body`; partial data is never returned.
    fn parse(&self, body: &str) -> Result<ParsedFeed, ParseError>;
}

/// Parser backed by `feed-rs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FeedRsParser;

impl FeedParser for FeedRsParser {
    fn parse(&self, body: &str) -> Result<ParsedFeed, ParseError> {
        let feed =
            parser::parse(body.as_bytes()).map_err(|e| ParseError::Malformed(e.to_string()))?;

        let title = feed
            .title
            .map(|t| strip_html(&t.content))
            .filter(|t| !t.is_empty())
            .ok_or(ParseError::MissingElement("feed title"))?;

        let description = feed
            .description
            .map(|d| strip_html(&d.content))
            .unwrap_or_default();

        let mut parsed = ParsedFeed::new(title, description);

        for entry in feed.entries {
            if entry.id.is_empty() {
                return Err(ParseError::MissingElement("entry guid"));
            }
            let entry_title = entry
                .title
                .map(|t| strip_html(&t.content))
                .ok_or(ParseError::MissingElement("entry title"))?;
            let link = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .ok_or(ParseError::MissingElement("entry link"))?;
            let entry_description = entry
                .summary
                .map(|t| t.content)
                .or(entry.content.and_then(|c| c.body))
                .map(|d| strip_html(&d))
                .unwrap_or_default();

            parsed = parsed.with_entry(
                ParsedEntry::new(entry.id, entry_title)
                    .with_link(link)
                    .with_description(entry_description),
            );
        }

        Ok(parsed)
    }
}

/// Longest entity name looked at after `&`.
const MAX_ENTITY_LEN: usize = 10;

/// Plain text of an HTML fragment: tags dropped, entities decoded, runs of
/// whitespace collapsed to one space.
fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(pos) = rest.find(|c: char| c == '<' || c == '&') {
        text.push_str(&rest[..pos]);
        rest = &rest[pos..];

        if rest.starts_with('<') {
            // An unterminated tag swallows the remainder.
            rest = rest.find('>').map_or("", |end| &rest[end + 1..]);
        } else if let Some((ch, len)) = decode_entity(rest) {
            text.push(ch);
            rest = &rest[len..];
        } else {
            text.push('&');
            rest = &rest[1..];
        }
    }
    text.push_str(rest);

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode the entity at the start of `s` (which begins with `&`), returning
/// the character and the entity's length in bytes.
fn decode_entity(s: &str) -> Option<(char, usize)> {
    let end = s.get(1..)?.find(';')?;
    if end == 0 || end > MAX_ENTITY_LEN {
        return None;
    }
    let name = &s[1..=end];

    let ch = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)?
        }
    };

    Some((ch, end + 2))
}
