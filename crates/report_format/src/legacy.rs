//! Intake of legacy RTF templates.
//!
//! The text is recovered by walking the RTF group structure, then passed
//! through [`crate::cleaner::clean`], filtered for residue lines and given
//! markup emphasis by a few house-style heuristics:
//!
//! * an all-caps exam title becomes a level 2 heading,
//! * a line naming a report section becomes bold (or a heading when
//!   written in capitals),
//! * disclaimer lines become italic.

use std::borrow::Cow;

use encoding_rs::{UTF_8, WINDOWS_1252};

use crate::cleaner::clean;
use crate::document::StyledSpan;
use crate::rules::{FormatRules, LegacyRules};
use crate::tokenizer::render;

/// Destinations whose content is never document text.
const SKIPPED_DESTINATIONS: [&str; 22] = [
    "fonttbl",
    "colortbl",
    "stylesheet",
    "info",
    "pict",
    "object",
    "header",
    "headerl",
    "headerr",
    "headerf",
    "footer",
    "footerl",
    "footerr",
    "footerf",
    "fldinst",
    "listtable",
    "listoverridetable",
    "rsidtbl",
    "generator",
    "xmlnstbl",
    "themedata",
    "latentstyles",
];

/// Decodes RTF bytes, preferring UTF-8 and falling back to Windows-1252.
pub fn decode(bytes: &[u8]) -> Cow<'_, str> {
    match UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
        Some(text) => text,
        None => {
            let (text, _, _) = WINDOWS_1252.decode(bytes);
            text
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Group {
    skip: bool,
    /// Fallback characters after `\uN`, set by `\ucN`.
    unicode_fallback: usize,
}

impl Default for Group {
    fn default() -> Self {
        Self {
            skip: false,
            unicode_fallback: 1,
        }
    }
}

fn skipping(groups: &[Group]) -> bool {
    groups.last().is_some_and(|g| g.skip)
}

/// Extracts the document text from RTF source.
///
/// Paragraph and line breaks become `\n`, `\tab` a tab. Hex (`\'hh`) and
/// unicode (`\uN`) escapes are left in place for the cleaner to decode; the
/// fallback characters after a unicode escape (one, or as set by `\ucN`)
/// are dropped.
pub fn extract_text(rtf: &str) -> String {
    let chars: Vec<char> = rtf.chars().collect();
    let mut pos: usize = 0;
    let mut groups: Vec<Group> = vec![Group::default()];
    let mut out = String::new();

    while pos < chars.len() {
        let c = chars[pos];
        match c {
            '{' => {
                let inherited = groups.last().copied().unwrap_or_default();
                groups.push(inherited);
                pos += 1;
            }
            '}' => {
                if groups.len() > 1 {
                    groups.pop();
                }
                pos += 1;
            }
            '\r' | '\n' => pos += 1,
            '\\' => {
                let (consumed, emitted) = control(&chars, pos, &mut groups);
                if !skipping(&groups) {
                    out.push_str(&emitted);
                }
                pos += consumed;
            }
            _ => {
                if !skipping(&groups) {
                    out.push(c);
                }
                pos += 1;
            }
        }
    }
    out
}

/// Reads the control sequence starting at `chars[start]` (a backslash).
/// Returns the number of chars consumed and the text it stands for.
fn control(chars: &[char], start: usize, groups: &mut [Group]) -> (usize, String) {
    let Some(&next) = chars.get(start + 1) else {
        return (1, String::new());
    };

    if !next.is_ascii_alphabetic() {
        return match next {
            '*' => {
                if let Some(group) = groups.last_mut() {
                    group.skip = true;
                }
                (2, String::new())
            }
            '\'' => {
                let hex: String = chars.iter().skip(start + 2).take(2).collect();
                (2 + hex.chars().count(), format!("\\'{hex}"))
            }
            '{' | '}' | '\\' => (2, format!("\\{next}")),
            '~' => (2, "\u{00A0}".to_string()),
            '_' => (2, "-".to_string()),
            '\r' | '\n' => (2, "\n".to_string()),
            _ => (2, String::new()),
        };
    }

    let mut pos = start + 1;
    let word: String = chars[pos..].iter().take_while(|c| c.is_ascii_alphabetic()).collect();
    pos += word.len();
    let param: String = chars[pos..]
        .iter()
        .enumerate()
        .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && **c == '-'))
        .map(|(_, c)| *c)
        .collect();
    pos += param.len();
    if chars.get(pos) == Some(&' ') {
        pos += 1;
    }

    if SKIPPED_DESTINATIONS.contains(&word.as_str()) {
        if let Some(group) = groups.last_mut() {
            group.skip = true;
        }
        return (pos - start, String::new());
    }

    let emitted = match word.as_str() {
        "par" | "line" | "sect" | "page" => "\n".to_string(),
        "tab" => "\t".to_string(),
        "uc" => {
            if let (Some(group), Ok(count)) = (groups.last_mut(), param.parse::<usize>()) {
                group.unicode_fallback = count;
            }
            String::new()
        }
        "u" => {
            // each fallback character is either literal or a hex escape
            let fallback = groups.last().map_or(1, |g| g.unicode_fallback);
            for _ in 0..fallback {
                match (chars.get(pos), chars.get(pos + 1)) {
                    (Some('\\'), Some('\'')) => pos = (pos + 4).min(chars.len()),
                    (Some(c), _) if !matches!(c, '\\' | '{' | '}') => pos += 1,
                    _ => break,
                }
            }
            format!("\\u{param}?")
        }
        _ => String::new(),
    };
    (pos - start, emitted)
}

/// Python-like `isupper`: at least one cased letter and no lowercase ones.
fn is_all_caps(line: &str) -> bool {
    line.chars().any(char::is_uppercase) && !line.chars().any(char::is_lowercase)
}

fn contains_ignore_case(line: &str, needle: &str) -> bool {
    line.to_uppercase().contains(&needle.to_uppercase())
}

fn is_residue(line: &str, rules: &LegacyRules) -> bool {
    let lowered = line.to_lowercase();
    let char_count = line.chars().count();
    rules.font_names.iter().any(|f| f.to_lowercase() == lowered)
        || line.chars().all(|c| c.is_ascii_digit() || c.is_whitespace() || c == '-')
        || (char_count < 3 && !line.chars().all(char::is_alphanumeric))
}

fn heading_line(line: &str) -> String {
    format!("## {}", render(&[StyledSpan::plain(line)]))
}

fn format_line(line: &str, rules: &LegacyRules) -> String {
    let length = line.chars().count();
    let upper = line.to_uppercase();

    if is_all_caps(line)
        && length > 15
        && length < 120
        && !line.ends_with('.')
        && rules.title_keywords.iter().any(|k| contains_ignore_case(line, k))
    {
        return heading_line(line);
    }

    if rules.section_phrases.iter().any(|p| contains_ignore_case(line, p)) {
        if is_all_caps(line) && length > 10 {
            return heading_line(line);
        }
        if rules.section_starts.iter().any(|s| upper.starts_with(&s.to_uppercase())) {
            return render(&[StyledSpan::bold(line)]);
        }
        return render(&[StyledSpan::plain(line)]);
    }

    if rules.footnote_keywords.iter().any(|k| contains_ignore_case(line, k)) {
        return render(&[StyledSpan::italic(line)]);
    }

    render(&[StyledSpan::plain(line)])
}

/// Converts a legacy RTF template into markup. Never fails; anything that
/// cannot be understood is dropped or passed through as text.
pub fn legacy_to_markup(bytes: &[u8], rules: &FormatRules) -> String {
    let source = decode(bytes);
    let text = clean(&extract_text(&source));

    let mut lines: Vec<String> = Vec::new();
    let mut dropped = 0usize;
    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            // blank runs collapse to one line
            if lines.last().is_some_and(|l| !l.is_empty()) {
                lines.push(String::new());
            }
            continue;
        }
        if is_residue(line, &rules.legacy) {
            dropped += 1;
            continue;
        }
        lines.push(format_line(line, &rules.legacy));
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    tracing::debug!(lines = lines.len(), dropped, "converted legacy document");
    lines.join("\n")
}
