//! Removal of legacy rich-text artifacts from extracted prose.
//!
//! Text pulled out of RTF templates tends to carry escape sequences, control
//! words and typographic quotes. [`clean`] runs a fixed, ordered table of
//! substitutions over it. The table is arranged so that no rule can produce
//! input for an earlier one: after one pass the text contains no backslash,
//! brace or control character, which makes the cleaner idempotent.

use encoding_rs::WINDOWS_1252;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

enum Replacement {
    Literal(&'static str),
    With(fn(&Captures) -> String),
}

struct Rule {
    name: &'static str,
    pattern: Regex,
    replacement: Replacement,
}

impl Rule {
    fn new(name: &'static str, pattern: &str, replacement: Replacement) -> Self {
        Self {
            name,
            // Patterns are constants; a bad one is a programming error caught by the tests.
            pattern: Regex::new(pattern).unwrap_or_else(|e| panic!("cleaner rule {name}: {e}")),
            replacement,
        }
    }

    fn apply(&self, text: &str) -> String {
        match &self.replacement {
            Replacement::Literal(s) => self.pattern.replace_all(text, *s).into_owned(),
            Replacement::With(f) => self.pattern.replace_all(text, |c: &Captures| f(c)).into_owned(),
        }
    }
}

static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    use Replacement::*;
    vec![
        Rule::new("hex escape", r"\\'([0-9a-fA-F]{2})", With(decode_hex_escape)),
        Rule::new("unicode escape", r"\\u(-?\d{1,5})\??", With(decode_unicode_escape)),
        Rule::new("escaped symbol", r"\\[{}\\]", Literal("")),
        Rule::new("control word", r"\\[a-zA-Z]+-?\d* ?", Literal(" ")),
        Rule::new("control symbol", r"\\(?s:.)?", Literal("")),
        Rule::new("brace", r"[{}]", Literal("")),
        Rule::new("control character", r"[\x00-\x08\x0B-\x1F\x7F-\x9F]", Literal("")),
        Rule::new("smart double quote", "[\u{201C}\u{201D}\u{201E}\u{201F}]", Literal("\"")),
        Rule::new("smart single quote", "[\u{2018}\u{2019}\u{201A}\u{201B}]", Literal("'")),
        Rule::new("non-breaking space", "\u{00A0}", Literal(" ")),
        Rule::new("whitespace run", r"[ \t]{2,}", Literal(" ")),
        Rule::new("trailing whitespace", r"(?m)[ \t]+$", Literal("")),
    ]
});

fn decode_hex_escape(caps: &Captures) -> String {
    let Ok(byte) = u8::from_str_radix(&caps[1], 16) else {
        return String::new();
    };
    let bytes = [byte];
    let (decoded, _, _) = WINDOWS_1252.decode(&bytes);
    decoded.into_owned()
}

fn decode_unicode_escape(caps: &Captures) -> String {
    // RTF writes code points above 32767 as negative 16-bit values
    let Ok(value) = caps[1].parse::<i32>() else {
        return String::new();
    };
    let code = if value < 0 { value + 65536 } else { value };
    u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .map(String::from)
        .unwrap_or_default()
}

/// Applies every artifact rule in order. Never fails.
pub fn clean(raw: &str) -> String {
    RULES.iter().fold(raw.to_string(), |text, rule| {
        let cleaned = rule.apply(&text);
        if cleaned != text {
            tracing::trace!(rule = rule.name, "legacy artifact removed");
        }
        cleaned
    })
}
