//! Paragraph-level model of a rich document and the formatting passes that
//! turn classified blocks into it.
//!
//! Formatting is cumulative. Each pass takes a paragraph by value and
//! returns it with its own attributes applied; passes run in the order of
//! [`PASSES`], so the last-line pass has the final say on alignment, size
//! and emphasis.

use crate::classifier::{ClassifiedBlock, HeadingOrigin, Roles};
use crate::document::{Block, Document, SourceKind, StructureHint, StyledSpan, normalize_spans};
use crate::rules::FormatRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Justify,
    Center,
}

impl Alignment {
    /// Value of the `w:jc` element.
    pub fn as_docx(self) -> &'static str {
        match self {
            Alignment::Justify => "both",
            Alignment::Center => "center",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RichRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl From<StyledSpan> for RichRun {
    fn from(span: StyledSpan) -> Self {
        Self {
            text: span.text,
            bold: span.bold,
            italic: span.italic,
            underline: span.underline,
        }
    }
}

impl From<RichRun> for StyledSpan {
    fn from(run: RichRun) -> Self {
        Self {
            text: run.text,
            bold: run.bold,
            italic: run.italic,
            underline: run.underline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RichParagraph {
    /// Paragraph style name; `None` means the document default.
    pub style: Option<String>,
    pub alignment: Alignment,
    pub font_family: String,
    /// Size in half-points, the unit `w:sz` uses.
    pub half_points: u32,
    pub runs: Vec<RichRun>,
}

impl RichParagraph {
    fn map_runs(mut self, f: impl Fn(&mut RichRun)) -> Self {
        self.runs.iter_mut().for_each(f);
        self
    }
}

type Pass = fn(RichParagraph, &Roles, &FormatRules) -> RichParagraph;

const PASSES: [(&str, Pass); 4] = [
    ("base", base_pass),
    ("heading", heading_pass),
    ("first line", first_line_pass),
    ("last line", last_line_pass),
];

fn base_pass(paragraph: RichParagraph, _roles: &Roles, rules: &FormatRules) -> RichParagraph {
    RichParagraph {
        alignment: Alignment::Justify,
        font_family: rules.font_family.clone(),
        half_points: rules.body_half_points(),
        ..paragraph
    }
}

fn heading_pass(paragraph: RichParagraph, roles: &Roles, _rules: &FormatRules) -> RichParagraph {
    let Some(heading) = roles.heading else {
        return paragraph;
    };
    let style = match heading.origin {
        HeadingOrigin::Declared => Some(format!("Heading {}", heading.level.get())),
        HeadingOrigin::Inferred => paragraph.style.clone(),
    };
    RichParagraph { style, ..paragraph }.map_runs(|r| r.bold = true)
}

fn first_line_pass(paragraph: RichParagraph, roles: &Roles, _rules: &FormatRules) -> RichParagraph {
    if !roles.first_line {
        return paragraph;
    }
    RichParagraph {
        alignment: Alignment::Center,
        ..paragraph
    }
    .map_runs(|r| r.bold = true)
}

fn last_line_pass(paragraph: RichParagraph, roles: &Roles, rules: &FormatRules) -> RichParagraph {
    if !roles.last_line {
        return paragraph;
    }
    RichParagraph {
        alignment: Alignment::Center,
        half_points: rules.last_line_half_points(),
        ..paragraph
    }
    .map_runs(|r| r.italic = true)
}

/// Builds the formatted paragraph for one classified block.
pub fn format_paragraph(classified: &ClassifiedBlock<'_>, rules: &FormatRules) -> RichParagraph {
    let start = RichParagraph {
        runs: classified.block.spans.iter().cloned().map(RichRun::from).collect(),
        ..Default::default()
    };
    PASSES.iter().fold(start, |paragraph, (name, pass)| {
        let next = pass(paragraph, &classified.roles, rules);
        tracing::trace!(pass = name, "applied formatting pass");
        next
    })
}

pub fn format_paragraphs(blocks: &[ClassifiedBlock<'_>], rules: &FormatRules) -> Vec<RichParagraph> {
    blocks.iter().map(|c| format_paragraph(c, rules)).collect()
}

/// Turns paragraphs read from a rich document into blocks. Runs are
/// normalised, so adjacent runs with the same emphasis become one span.
pub fn blocks_from_rich(paragraphs: Vec<RichParagraph>) -> Document {
    let blocks = paragraphs
        .into_iter()
        .map(|p| {
            let spans = normalize_spans(p.runs.into_iter().map(StyledSpan::from).collect());
            Block::new(spans, StructureHint::Style(p.style))
        })
        .collect();
    Document::new(SourceKind::RichDocument, blocks)
}
