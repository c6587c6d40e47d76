//! Linter module for report templates.
//!
//! Conversions never fail on odd input: unbalanced emphasis is kept as
//! literal text and unknown styles become body text. The linter reports
//! those recoveries so a template author can fix the source, without
//! changing what the conversions produce.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::classifier::{HeadingOrigin, classify, styles::StyleTable};
use crate::markup::{parse_markup, split_heading_marker};
use crate::rich::RichParagraph;
use crate::rules::FormatRules;
use crate::tokenizer::{Delimiter, TokenizeError, try_tokenize};

static EXCESS_HEADING_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\x{FEFF}?[ \t]*(#{7,}) ").unwrap_or_else(|e| panic!("excess heading marker: {e}")));

/// Severity level of a lint warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Error: Should be fixed
    Error,
    /// Warning: Recommended to fix
    Warning,
    /// Info: Informational only
    Info,
}

/// Kind of lint warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintWarningKind {
    /// Emphasis delimiter opened but never closed; the line is kept literal.
    UnterminatedEmphasis(Delimiter),
    /// More than six `#`; the line is body text.
    ExcessHeadingMarkers(usize),
    /// Paragraph style that is neither a heading nor a known body style.
    UnknownStyle(String),
    /// Nothing but blank lines. The only error-level lint.
    EmptyDocument,
    /// Line recognised as a section header from its wording.
    InferredSectionHeading,
}

/// A lint warning with location and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintWarning {
    pub kind: LintWarningKind,
    /// 1-indexed line of a markup file, or paragraph of a rich document.
    pub line: usize,
    /// 0-indexed character column, when the problem has one.
    pub column: Option<usize>,
    pub severity: Severity,
    pub message: String,
}

impl LintWarning {
    pub fn new(kind: LintWarningKind, line: usize, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            column: None,
            severity,
            message: message.into(),
        }
    }

    pub fn error(kind: LintWarningKind, line: usize, message: impl Into<String>) -> Self {
        Self::new(kind, line, Severity::Error, message)
    }

    pub fn warning(kind: LintWarningKind, line: usize, message: impl Into<String>) -> Self {
        Self::new(kind, line, Severity::Warning, message)
    }

    pub fn info(kind: LintWarningKind, line: usize, message: impl Into<String>) -> Self {
        Self::new(kind, line, Severity::Info, message)
    }

    pub fn at_column(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }
}

/// Lint markup text.
pub fn lint_markup(text: &str, rules: &FormatRules) -> Vec<LintWarning> {
    let mut warnings = Vec::new();

    for (index, line) in text.lines().enumerate() {
        check_heading_markers(line, index + 1, &mut warnings);
        check_emphasis(line, index + 1, &mut warnings);
    }

    let doc = parse_markup(text);
    if doc.written_bounds().is_none() {
        warnings.push(LintWarning::error(
            LintWarningKind::EmptyDocument,
            1,
            "document has no text; it converts to a single empty paragraph",
        ));
    }
    for (index, classified) in classify(&doc, rules).iter().enumerate() {
        if classified.roles.heading.is_some_and(|h| h.origin == HeadingOrigin::Inferred) {
            warnings.push(LintWarning::info(
                LintWarningKind::InferredSectionHeading,
                index + 1,
                format!(
                    "\"{}\" is treated as a section header and set in bold",
                    classified.block.text()
                ),
            ));
        }
    }

    warnings.sort_by_key(|w| w.line);
    warnings
}

/// Lint paragraphs read from a rich document.
pub fn lint_rich_document(paragraphs: &[RichParagraph]) -> Vec<LintWarning> {
    let mut warnings = Vec::new();
    let table = StyleTable::standard();

    for (index, paragraph) in paragraphs.iter().enumerate() {
        let Some(style) = paragraph.style.as_deref() else {
            continue;
        };
        if table.level_for(style).is_none() && !StyleTable::is_body_style(style) {
            warnings.push(LintWarning::warning(
                LintWarningKind::UnknownStyle(style.to_string()),
                index + 1,
                format!("style \"{style}\" is not a heading style; the paragraph becomes body text"),
            ));
        }
    }

    let has_text = paragraphs
        .iter()
        .any(|p| p.runs.iter().any(|r| !r.text.trim().is_empty()));
    if !has_text {
        warnings.push(LintWarning::error(
            LintWarningKind::EmptyDocument,
            1,
            "document has no text",
        ));
    }
    warnings
}

fn check_heading_markers(line: &str, number: usize, warnings: &mut Vec<LintWarning>) {
    if let Some(caps) = EXCESS_HEADING_MARKER.captures(line) {
        let count = caps[1].len();
        warnings.push(LintWarning::warning(
            LintWarningKind::ExcessHeadingMarkers(count),
            number,
            format!("{count} heading markers; at most 6 are allowed, so this line stays body text"),
        ));
    }
}

fn check_emphasis(line: &str, number: usize, warnings: &mut Vec<LintWarning>) {
    let (offset, content) = match split_heading_marker(line) {
        Some((_, rest)) => (line[..line.len() - rest.len()].chars().count(), rest),
        None => (0, line),
    };
    if let Err(TokenizeError::Unterminated { delimiter, column }) = try_tokenize(content) {
        warnings.push(
            LintWarning::warning(
                LintWarningKind::UnterminatedEmphasis(delimiter),
                number,
                format!(
                    "`{}` is never closed; the line is kept as literal text",
                    delimiter.marker()
                ),
            )
            .at_column(offset + column),
        );
    }
}
