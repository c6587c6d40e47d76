//! Paragraph style name → heading level lookup.
//!
//! Rich documents name their heading styles "Heading 1" … "Heading 6" (and
//! "Title"), while the XML refers to them by ids such as `Heading2`. Both
//! forms go through [`canonical_style_name`] before lookup.

use once_cell::sync::Lazy;
use thiserror::Error;

use super::HeadingLevel;

/// The table shipped with the crate.
const HEADING_STYLES: [(&str, u8); 7] = [
    ("Title", 1),
    ("Heading 1", 1),
    ("Heading 2", 2),
    ("Heading 3", 3),
    ("Heading 4", 4),
    ("Heading 5", 5),
    ("Heading 6", 6),
];

/// Styles that are known and deliberately map to body text.
const BODY_STYLES: [&str; 4] = ["Normal", "Body Text", "Default Paragraph Font", "List Paragraph"];

static STANDARD: Lazy<StyleTable> = Lazy::new(|| {
    StyleTable::new(&HEADING_STYLES).unwrap_or_else(|e| panic!("built-in style table is invalid: {e}"))
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StyleTableError {
    #[error("style {0:?} appears more than once")]
    Duplicate(String),
    #[error("style {name:?} maps to level {level}, outside 1..=6")]
    LevelOutOfRange { name: String, level: u8 },
    #[error("expected style {0:?} is missing")]
    Missing(String),
}

#[derive(Debug, Clone)]
struct StyleEntry {
    canonical: String,
    level: HeadingLevel,
}

#[derive(Debug, Clone)]
pub struct StyleTable {
    entries: Vec<StyleEntry>,
}

impl StyleTable {
    /// Builds a table, checking it covers every "Heading N" name with no
    /// duplicates or out-of-range levels.
    pub fn new(styles: &[(&str, u8)]) -> Result<Self, StyleTableError> {
        let mut entries: Vec<StyleEntry> = Vec::with_capacity(styles.len());
        for (name, level) in styles {
            let canonical = canonical_style_name(name);
            if entries.iter().any(|e| e.canonical == canonical) {
                return Err(StyleTableError::Duplicate(name.to_string()));
            }
            let level = HeadingLevel::new(usize::from(*level)).ok_or_else(|| {
                StyleTableError::LevelOutOfRange {
                    name: name.to_string(),
                    level: *level,
                }
            })?;
            entries.push(StyleEntry { canonical, level });
        }

        for expected in expected_heading_names() {
            let canonical = canonical_style_name(&expected);
            if !entries.iter().any(|e| e.canonical == canonical) {
                return Err(StyleTableError::Missing(expected));
            }
        }
        Ok(Self { entries })
    }

    pub fn standard() -> &'static StyleTable {
        &STANDARD
    }

    /// `None` means the style is not a heading style.
    pub fn level_for(&self, style_name: &str) -> Option<HeadingLevel> {
        let canonical = canonical_style_name(style_name);
        self.entries
            .iter()
            .find(|e| e.canonical == canonical)
            .map(|e| e.level)
    }

    pub fn is_body_style(style_name: &str) -> bool {
        let canonical = canonical_style_name(style_name);
        BODY_STYLES.iter().any(|s| canonical_style_name(s) == canonical)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn expected_heading_names() -> impl Iterator<Item = String> {
    (HeadingLevel::MIN..=HeadingLevel::MAX).map(|n| format!("Heading {n}"))
}

/// Lowercases, collapses whitespace and separates a trailing number, so
/// `Heading2`, `heading 2` and ` HEADING  2 ` compare equal.
pub fn canonical_style_name(name: &str) -> String {
    let collapsed = name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    let digits_at = collapsed
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i);

    match digits_at {
        Some(i) if i > 0 && !collapsed[..i].ends_with(' ') => {
            format!("{} {}", &collapsed[..i], &collapsed[i..])
        }
        _ => collapsed,
    }
}
