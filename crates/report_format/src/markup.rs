//! Reading and writing the markup dialect.
//!
//! One line is one block. A line opening with one to six `#` followed by a
//! space is a heading, after any leading blanks or byte order mark; the marker is kept as a hint for the classifier and
//! stripped from the text. Anything else, including seven or more `#`, is
//! inline text handed to the tokenizer.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::classifier::{ClassifiedBlock, HeadingOrigin};
use crate::document::{Block, Document, SourceKind, StructureHint};
use crate::tokenizer;

static HEADING_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\x{FEFF}?[ \t]*(#{1,6}) (.*)$").unwrap_or_else(|e| panic!("heading marker: {e}")));

/// Splits a markup line into its heading marker count and the remaining text.
pub fn split_heading_marker(line: &str) -> Option<(usize, &str)> {
    let caps = HEADING_MARKER.captures(line)?;
    let marker = caps.get(1)?.as_str();
    let rest = caps.get(2)?.as_str();
    Some((marker.len(), rest))
}

pub fn parse_markup(text: &str) -> Document {
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    let blocks: Vec<Block> = text
        .lines()
        .map(|line| match split_heading_marker(line) {
            Some((count, rest)) => {
                Block::new(tokenizer::tokenize(rest.trim_end()), StructureHint::HeadingMarker(count))
            }
            None => Block::new(tokenizer::tokenize(line.trim_end()), StructureHint::None),
        })
        .collect();
    tracing::debug!(blocks = blocks.len(), "parsed markup");
    Document::new(SourceKind::Markup, blocks)
}

/// Writes classified blocks as markup lines joined with `\n`.
///
/// Declared headings keep their `#` markers. Inferred headings are written
/// as body text; their bold comes from the spans.
pub fn render_markup(blocks: &[ClassifiedBlock<'_>]) -> String {
    blocks
        .iter()
        .map(|c| {
            let body = tokenizer::render(&c.block.spans);
            match c.roles.heading {
                Some(h) if h.origin == HeadingOrigin::Declared && !body.is_empty() => {
                    format!("{} {}", "#".repeat(usize::from(h.level.get())), body)
                }
                _ => body,
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
