//! Conversions between markup and plain text.
//!
//! Going to plain text is lossy: heading markers and emphasis delimiters are
//! dropped and only the line structure remains. Coming back, emphasis is
//! re-inferred from position and section keywords, so the two directions
//! are not inverses.

use crate::classifier::{ClassifiedBlock, classify};
use crate::document::{Block, Document, SourceKind, StyledSpan};
use crate::markup::split_heading_marker;
use crate::rules::FormatRules;
use crate::tokenizer;

/// Removes heading markers, emphasis delimiters and escapes line by line.
/// A trailing newline in the input is kept.
pub fn markup_to_plain(markup: &str) -> String {
    markup
        .split('\n')
        .map(|line| {
            let line = line.strip_suffix('\r').unwrap_or(line);
            let content = split_heading_marker(line).map_or(line, |(_, rest)| rest);
            tokenizer::strip(content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn parse_plain(text: &str) -> Document {
    let blocks = text
        .lines()
        .map(|line| match line.trim() {
            "" => Block::empty(),
            trimmed => Block::from_text(trimmed),
        })
        .collect();
    Document::new(SourceKind::PlainText, blocks)
}

/// Emphasis given to a whole plain-text line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum LineEmphasis {
    #[default]
    None,
    Bold,
    Italic,
}

type EmphasisPass = fn(LineEmphasis, &ClassifiedBlock<'_>) -> LineEmphasis;

/// Later passes override earlier ones.
const EMPHASIS_PASSES: [EmphasisPass; 2] = [opening_or_section_pass, last_line_pass];

fn opening_or_section_pass(emphasis: LineEmphasis, c: &ClassifiedBlock<'_>) -> LineEmphasis {
    if c.roles.first_line || c.roles.heading.is_some() {
        LineEmphasis::Bold
    } else {
        emphasis
    }
}

fn last_line_pass(emphasis: LineEmphasis, c: &ClassifiedBlock<'_>) -> LineEmphasis {
    if c.roles.last_line { LineEmphasis::Italic } else { emphasis }
}

fn render_line(classified: &ClassifiedBlock<'_>) -> String {
    let text = classified.block.text();
    if text.is_empty() {
        return String::new();
    }
    let emphasis = EMPHASIS_PASSES
        .iter()
        .fold(LineEmphasis::default(), |emphasis, pass| pass(emphasis, classified));
    let span = match emphasis {
        LineEmphasis::None => StyledSpan::plain(text),
        LineEmphasis::Bold => StyledSpan::bold(text),
        LineEmphasis::Italic => StyledSpan::italic(text),
    };
    tokenizer::render(&[span])
}

/// Trims every line and emphasises the first line, section headers (bold)
/// and the last line (italic).
pub fn plain_to_markup(text: &str, rules: &FormatRules) -> String {
    let doc = parse_plain(text);
    let classified = classify(&doc, rules);
    let mut markup = classified.iter().map(render_line).collect::<Vec<_>>().join("\n");
    if text.ends_with('\n') {
        markup.push('\n');
    }
    tracing::debug!(lines = classified.len(), "converted plain text to markup");
    markup
}
