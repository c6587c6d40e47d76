//! Structural roles of blocks.
//!
//! Roles are derived from the source hint and the block's position every
//! time a document is converted; they are never stored on [`Block`].
//!
//! | source        | heading from                                   |
//! |---------------|------------------------------------------------|
//! | rich document | paragraph style via [`styles::StyleTable`]     |
//! | markup        | 1–6 `#` markers, else a section keyword        |
//! | plain text    | section keyword or a short `…:` line           |
//!
//! FirstLine and LastLine are the first and last non-blank blocks for every
//! source. A document with one non-blank block gives it both roles.

pub mod styles;

use crate::document::{Block, Document, SourceKind, StructureHint};
use crate::rules::FormatRules;
use styles::StyleTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 6;

    /// `None` outside `1..=6`.
    pub fn new(level: usize) -> Option<Self> {
        u8::try_from(level)
            .ok()
            .filter(|l| (Self::MIN..=Self::MAX).contains(l))
            .map(HeadingLevel)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

/// How confident the classifier is about a heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingOrigin {
    /// A style name or explicit `#` markers declared the level.
    Declared,
    /// Recognised from a section keyword; the level is always 1.
    Inferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heading {
    pub level: HeadingLevel,
    pub origin: HeadingOrigin,
}

impl Heading {
    fn declared(level: HeadingLevel) -> Self {
        Self { level, origin: HeadingOrigin::Declared }
    }

    fn inferred() -> Self {
        Self {
            level: HeadingLevel(1),
            origin: HeadingOrigin::Inferred,
        }
    }

    pub fn is_declared(&self) -> bool {
        self.origin == HeadingOrigin::Declared
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Heading(HeadingLevel),
    Body,
    FirstLine,
    LastLine,
}

/// The set of roles one block holds. Heading and Body are exclusive; the
/// positional roles combine with either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Roles {
    pub heading: Option<Heading>,
    pub first_line: bool,
    pub last_line: bool,
}

impl Roles {
    pub fn contains(&self, role: Role) -> bool {
        match role {
            Role::Heading(level) => self.heading.is_some_and(|h| h.level == level),
            Role::Body => self.heading.is_none(),
            Role::FirstLine => self.first_line,
            Role::LastLine => self.last_line,
        }
    }

    /// Roles in pipeline order: structural role first, then FirstLine, then LastLine.
    pub fn to_vec(&self) -> Vec<Role> {
        let mut roles = vec![match self.heading {
            Some(h) => Role::Heading(h.level),
            None => Role::Body,
        }];
        if self.first_line {
            roles.push(Role::FirstLine);
        }
        if self.last_line {
            roles.push(Role::LastLine);
        }
        roles
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifiedBlock<'a> {
    pub block: &'a Block,
    pub roles: Roles,
}

pub fn classify<'a>(doc: &'a Document, rules: &FormatRules) -> Vec<ClassifiedBlock<'a>> {
    let mut classified: Vec<ClassifiedBlock<'a>> = doc
        .blocks
        .iter()
        .map(|block| ClassifiedBlock {
            block,
            roles: Roles {
                heading: structural_heading(block, doc.source, rules),
                ..Default::default()
            },
        })
        .collect();

    if let Some((first, last)) = doc.written_bounds() {
        classified[first].roles.first_line = true;
        classified[last].roles.last_line = true;
    }

    tracing::debug!(
        source = ?doc.source,
        blocks = classified.len(),
        headings = classified.iter().filter(|c| c.roles.heading.is_some()).count(),
        "classified document"
    );
    classified
}

fn structural_heading(block: &Block, source: SourceKind, rules: &FormatRules) -> Option<Heading> {
    if block.is_blank() {
        return None;
    }
    match source {
        SourceKind::RichDocument => match &block.hint {
            StructureHint::Style(Some(name)) => {
                let level = StyleTable::standard().level_for(name);
                if level.is_none() && !StyleTable::is_body_style(name) {
                    tracing::debug!(style = %name, "style not in heading table, treating as body");
                }
                level.map(Heading::declared)
            }
            _ => None,
        },
        SourceKind::Markup => marker_heading(&block.hint).or_else(|| {
            rules
                .starts_with_section_keyword(&block.text())
                .then(Heading::inferred)
        }),
        SourceKind::PlainText => {
            let text = block.text();
            (rules.starts_with_section_keyword(&text) || rules.is_colon_heading(&text))
                .then(Heading::inferred)
        }
    }
}

fn marker_heading(hint: &StructureHint) -> Option<Heading> {
    match hint {
        StructureHint::HeadingMarker(count) => HeadingLevel::new(*count).map(Heading::declared),
        _ => None,
    }
}

#[cfg(test)]
mod tests;
