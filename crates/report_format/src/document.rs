//! Format-neutral document model shared by every reader and writer.
//!
//! A [`Document`] is built by one reader, handed to the classifier and a
//! writer, and dropped. Structural roles are never stored here; see
//! [`crate::classifier`].

use itertools::Itertools;

/// A run of text with uniform emphasis.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyledSpan {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl StyledSpan {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
            ..Default::default()
        }
    }

    pub fn italic(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            italic: true,
            ..Default::default()
        }
    }

    pub fn underline(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            underline: true,
            ..Default::default()
        }
    }

    /// Whether two spans carry the same emphasis flags.
    pub fn same_style(&self, other: &StyledSpan) -> bool {
        self.bold == other.bold && self.italic == other.italic && self.underline == other.underline
    }
}

/// Drops empty spans and merges neighbours with identical emphasis.
pub fn normalize_spans(spans: Vec<StyledSpan>) -> Vec<StyledSpan> {
    let mut out: Vec<StyledSpan> = Vec::with_capacity(spans.len());
    for span in spans.into_iter().filter(|s| !s.text.is_empty()) {
        match out.last_mut() {
            Some(last) if last.same_style(&span) => last.text.push_str(&span.text),
            _ => out.push(span),
        }
    }
    out
}

/// What the source format declared about a block, before classification.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StructureHint {
    /// Paragraph style name from a rich document (`None` when the paragraph
    /// had no explicit style).
    Style(Option<String>),
    /// Number of leading `#` markers read from a markup line.
    HeadingMarker(usize),
    #[default]
    None,
}

/// Which reader produced a document. Selects the classifier's rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    RichDocument,
    Markup,
    PlainText,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Block {
    pub spans: Vec<StyledSpan>,
    pub hint: StructureHint,
}

impl Block {
    pub fn new(spans: Vec<StyledSpan>, hint: StructureHint) -> Self {
        Self { spans, hint }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            spans: vec![StyledSpan::plain(text)],
            hint: StructureHint::None,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Concatenated span text without any emphasis.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).join("")
    }

    pub fn is_blank(&self) -> bool {
        self.spans.iter().all(|s| s.text.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub source: SourceKind,
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new(source: SourceKind, blocks: Vec<Block>) -> Self {
        Self { source, blocks }
    }

    /// Index of the first and last non-blank blocks.
    pub fn written_bounds(&self) -> Option<(usize, usize)> {
        let mut written = self.blocks.iter().positions(|b| !b.is_blank());
        let first = written.next()?;
        let last = written.last().unwrap_or(first);
        Some((first, last))
    }
}
