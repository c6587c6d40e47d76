//! # report_format
//!
//! Converts medical report templates between DOCX, a Markdown dialect and
//! plain text while keeping the house layout: a bold centered opening line,
//! bold section headers, and an italic 8pt centered closing line.
//!
//! ## Quick Start (Simple)
//!
//! ```ignore
//! use report_format::{markup_to_rich_document, rich_document_to_markup};
//!
//! let docx: Vec<u8> = markup_to_rich_document("# Technique\nBody text.\nLast line.")?;
//! let markup = rich_document_to_markup(&docx)?;
//! ```
//!
//! ## Custom Rules
//!
//! ```ignore
//! use report_format::{Converter, FormatRules};
//!
//! let rules: FormatRules = toml::from_str(r#"font_family = "Calibri""#)?;
//! let converter = Converter::new(rules);
//! let markup = converter.plain_text_to_markup(text);
//! ```

use thiserror::Error;

pub mod classifier;
pub mod cleaner;
pub mod document;
pub mod docx_generator;
pub mod docx_reader;
pub mod legacy;
pub mod linter;
pub mod markup;
pub mod plain;
pub mod rich;
pub mod rules;
pub mod tokenizer;

pub use classifier::{ClassifiedBlock, Heading, HeadingLevel, HeadingOrigin, Role, Roles, classify};
pub use cleaner::clean;
pub use document::{Block, Document, SourceKind, StructureHint, StyledSpan};
pub use docx_generator::DocxGenerator;
pub use linter::{LintWarning, LintWarningKind, Severity};
pub use rules::{FormatRules, LegacyRules};
pub use tokenizer::{render, strip, tokenize};

/// Failure at the DOCX container boundary. Malformed markup and unknown
/// styles are recovered from and never surface here.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("not a readable DOCX archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("DOCX archive has no {0} part")]
    MissingPart(String),
    #[error("malformed document XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs the conversions with a fixed set of [`FormatRules`].
#[derive(Debug, Clone, Default)]
pub struct Converter {
    rules: FormatRules,
}

impl Converter {
    pub fn new(rules: FormatRules) -> Self {
        Self { rules }
    }

    pub fn rich_document_to_markup(&self, bytes: &[u8]) -> Result<String, ConversionError> {
        let paragraphs = docx_reader::read_rich_document(bytes)?;
        let doc = rich::blocks_from_rich(paragraphs);
        let markup = markup::render_markup(&classify(&doc, &self.rules));
        tracing::debug!(blocks = doc.blocks.len(), "converted rich document to markup");
        Ok(markup)
    }

    pub fn markup_to_rich_document(&self, text: &str) -> Result<Vec<u8>, ConversionError> {
        let doc = markup::parse_markup(text);
        let paragraphs = rich::format_paragraphs(&classify(&doc, &self.rules), &self.rules);
        tracing::debug!(paragraphs = paragraphs.len(), "converted markup to rich document");
        DocxGenerator::new(paragraphs, &self.rules).write_to_vec()
    }

    pub fn markup_to_plain_text(&self, text: &str) -> String {
        plain::markup_to_plain(text)
    }

    pub fn plain_text_to_markup(&self, text: &str) -> String {
        plain::plain_to_markup(text, &self.rules)
    }

    pub fn legacy_to_markup(&self, bytes: &[u8]) -> String {
        legacy::legacy_to_markup(bytes, &self.rules)
    }

    pub fn check_markup(&self, text: &str) -> Vec<LintWarning> {
        linter::lint_markup(text, &self.rules)
    }

    pub fn check_rich_document(&self, bytes: &[u8]) -> Result<Vec<LintWarning>, ConversionError> {
        let paragraphs = docx_reader::read_rich_document(bytes)?;
        Ok(linter::lint_rich_document(&paragraphs))
    }
}

/// Converts a DOCX file to markup using the default rules.
pub fn rich_document_to_markup(bytes: &[u8]) -> Result<String, ConversionError> {
    Converter::default().rich_document_to_markup(bytes)
}

/// Converts markup to a DOCX file using the default rules.
///
/// Empty input produces a document with one empty paragraph.
pub fn markup_to_rich_document(text: &str) -> Result<Vec<u8>, ConversionError> {
    Converter::default().markup_to_rich_document(text)
}

pub fn markup_to_plain_text(text: &str) -> String {
    plain::markup_to_plain(text)
}

pub fn plain_text_to_markup(text: &str) -> String {
    Converter::default().plain_text_to_markup(text)
}

/// Converts a legacy RTF template to markup using the default rules.
pub fn legacy_to_markup(bytes: &[u8]) -> String {
    Converter::default().legacy_to_markup(bytes)
}

pub fn check_markup(text: &str) -> Vec<LintWarning> {
    Converter::default().check_markup(text)
}

pub fn check_rich_document(bytes: &[u8]) -> Result<Vec<LintWarning>, ConversionError> {
    Converter::default().check_rich_document(bytes)
}
