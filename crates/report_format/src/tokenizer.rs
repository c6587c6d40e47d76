use crate::document::{StyledSpan, normalize_spans};

/// Characters a backslash makes literal.
const ESCAPABLE: [char; 4] = ['\\', '*', '_', '#'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// `**`
    Bold,
    /// `*` or `_`
    Italic,
    /// `__`, the private underline marker
    Underline,
}

impl Delimiter {
    pub fn marker(self) -> &'static str {
        match self {
            Delimiter::Bold => "**",
            Delimiter::Italic => "*",
            Delimiter::Underline => "__",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    /// A delimiter opened at `column` (0-indexed, in characters) was never closed.
    Unterminated { delimiter: Delimiter, column: usize },
}

#[derive(Debug, Clone, Copy, Default)]
struct OpenDelimiters {
    bold: Option<usize>,
    italic: Option<usize>,
    underline: Option<usize>,
}

impl OpenDelimiters {
    fn toggle(&mut self, delimiter: Delimiter, column: usize) {
        let slot = match delimiter {
            Delimiter::Bold => &mut self.bold,
            Delimiter::Italic => &mut self.italic,
            Delimiter::Underline => &mut self.underline,
        };
        *slot = if slot.is_some() { None } else { Some(column) };
    }

    fn span(&self, text: String) -> StyledSpan {
        StyledSpan {
            text,
            bold: self.bold.is_some(),
            italic: self.italic.is_some(),
            underline: self.underline.is_some(),
        }
    }

    fn first_unclosed(&self) -> Option<(Delimiter, usize)> {
        [
            (Delimiter::Bold, self.bold),
            (Delimiter::Italic, self.italic),
            (Delimiter::Underline, self.underline),
        ]
        .into_iter()
        .filter_map(|(d, col)| col.map(|c| (d, c)))
        .min_by_key(|(_, col)| *col)
    }
}

/// Splits a markup line into styled spans, failing on unterminated delimiters.
pub fn try_tokenize(line: &str) -> Result<Vec<StyledSpan>, TokenizeError> {
    let chars: Vec<char> = line.chars().collect();
    let mut pos: usize = 0;
    let mut open = OpenDelimiters::default();
    let mut buffer = String::new();
    let mut spans: Vec<StyledSpan> = Vec::new();

    while pos < chars.len() {
        let c = chars[pos];
        let next = chars.get(pos + 1).copied();
        let delimiter = match (c, next) {
            ('\\', Some(n)) if ESCAPABLE.contains(&n) => {
                buffer.push(n);
                pos += 2;
                continue;
            }
            ('*', Some('*')) => Delimiter::Bold,
            ('*', _) => Delimiter::Italic,
            ('_', Some('_')) => Delimiter::Underline,
            ('_', _) => Delimiter::Italic,
            _ => {
                buffer.push(c);
                pos += 1;
                continue;
            }
        };

        spans.push(open.span(std::mem::take(&mut buffer)));
        open.toggle(delimiter, pos);
        pos += delimiter.marker().len();
    }
    spans.push(open.span(buffer));

    if let Some((delimiter, column)) = open.first_unclosed() {
        return Err(TokenizeError::Unterminated { delimiter, column });
    }
    Ok(normalize_spans(spans))
}

/// Splits a markup line into styled spans.
///
/// A line whose delimiters do not balance is returned as one unstyled span
/// holding the raw line, delimiters included.
pub fn tokenize(line: &str) -> Vec<StyledSpan> {
    match try_tokenize(line) {
        Ok(spans) => spans,
        Err(e) => {
            tracing::debug!(?e, "emphasis left open, keeping line literal");
            if line.is_empty() {
                Vec::new()
            } else {
                vec![StyledSpan::plain(line)]
            }
        }
    }
}

/// Inverse of [`tokenize`]: writes spans back with delimiters.
///
/// Only the delimiters whose state changes between neighbouring spans are
/// written, so every boundary produces at most one `**`, one `__` and one `*`.
pub fn render(spans: &[StyledSpan]) -> String {
    let mut out = String::new();
    let mut current = StyledSpan::default();

    for span in spans.iter().filter(|s| !s.text.is_empty()) {
        push_transition(&mut out, &current, span);
        push_escaped(&mut out, &span.text);
        current = StyledSpan {
            text: String::new(),
            ..span.clone()
        };
    }
    push_transition(&mut out, &current, &StyledSpan::default());
    out
}

/// Span text with every delimiter and escape removed.
pub fn strip(line: &str) -> String {
    tokenize(line).into_iter().map(|s| s.text).collect()
}

fn push_transition(out: &mut String, from: &StyledSpan, to: &StyledSpan) {
    if from.bold != to.bold {
        out.push_str(Delimiter::Bold.marker());
    }
    if from.underline != to.underline {
        out.push_str(Delimiter::Underline.marker());
    }
    if from.italic != to.italic {
        out.push_str(Delimiter::Italic.marker());
    }
}

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        // `#` is only meaningful after the leading blanks of a markup line
        let needs_escape = match c {
            '#' => out.chars().all(|c| c == ' ' || c == '\t'),
            c => ESCAPABLE.contains(&c),
        };
        if needs_escape {
            out.push('\\');
        }
        out.push(c);
    }
}
