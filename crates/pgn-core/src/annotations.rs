//! Annotation payload parser.
//!
//! The site ships per-move comments as a flat list-like payload,
//! `[0,"text",7,"text",...]`. The quotes around each comment may be literal
//! or entity-escaped (`&quot;`, `&#34;`), and payloads that went through one
//! more round of escaping use `&amp;quot;`. Index and text are captured
//! separately because comment text routinely contains commas and escaped
//! quotes.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::PgnError;

/// Longest index the site ever sends.
const MAX_INDEX_DIGITS: usize = 4;

/// One alternative per delimiter kind, so an entry only closes on the same
/// delimiter that opened it.
static ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?s)\b(\d+)\s*,\s*(?:"#,
        r#""((?:\\.|[^"\\])*)""#,
        r#"|&quot;((?:\\.|[^\\])*?)&quot;"#,
        r#"|&#34;((?:\\.|[^\\])*?)&#34;"#,
        r#"|&amp;quot;((?:\\.|[^\\])*?)&amp;quot;)"#,
    ))
    .unwrap()
});

/// A comment addressed to a ply by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub index: usize,
    pub text: String,
}

/// Parse an annotation payload into entries, in payload order.
///
/// `[]` and blank payloads give no entries. Text between entries that is not
/// a separator comes back as [`PgnError::MalformedAnnotation`] so callers can
/// skip just that entry. So does an entry whose index runs past four digits.
pub fn parse_annotations(payload: &str) -> Vec<Result<Annotation, PgnError>> {
    let inner = strip_brackets(payload.trim());
    let mut entries = Vec::new();
    let mut cursor = 0;

    for caps in ENTRY_RE.captures_iter(inner) {
        let (Some(whole), Some(index)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        // Text under `&amp;quot;` carries one extra layer of entities
        let text = if let Some(text) = caps.get(5) {
            decode_comment(text.as_str(), 2)
        } else if let Some(text) = caps.get(2).or_else(|| caps.get(3)).or_else(|| caps.get(4)) {
            decode_comment(text.as_str(), 1)
        } else {
            continue;
        };
        push_gap(&inner[cursor..whole.start()], &mut entries);
        cursor = whole.end();

        let digits = index.as_str();
        match digits.parse() {
            Ok(index) if digits.len() <= MAX_INDEX_DIGITS => {
                entries.push(Ok(Annotation { index, text }))
            }
            _ => entries.push(Err(PgnError::MalformedAnnotation {
                fragment: whole.as_str().to_string(),
            })),
        }
    }
    push_gap(&inner[cursor..], &mut entries);

    entries
}

fn strip_brackets(payload: &str) -> &str {
    let payload = payload.strip_prefix('[').unwrap_or(payload);
    payload.strip_suffix(']').unwrap_or(payload)
}

fn push_gap(gap: &str, entries: &mut Vec<Result<Annotation, PgnError>>) {
    let fragment = gap.trim_matches(|c: char| c == ',' || c.is_whitespace());
    if !fragment.is_empty() {
        entries.push(Err(PgnError::MalformedAnnotation {
            fragment: fragment.to_string(),
        }));
    }
}

/// Decode one comment: `passes` rounds of HTML entities, then backslash
/// escapes. Braces become parentheses so the text cannot close the PGN
/// comment.
fn decode_comment(raw: &str, passes: usize) -> String {
    let mut decoded = raw.to_string();
    for _ in 0..passes {
        decoded = html_escape::decode_html_entities(&decoded).into_owned();
    }
    let mut text = String::with_capacity(decoded.len());
    let mut chars = decoded.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('n' | 'r' | 't') => text.push(' '),
                Some('u') => {
                    let hex: String = chars.by_ref().take(4).collect();
                    match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                        Some(ch) => text.push(ch),
                        None => {
                            text.push('u');
                            text.push_str(&hex);
                        }
                    }
                }
                Some(escaped) => text.push(escaped),
                None => {}
            },
            '{' => text.push('('),
            '}' => text.push(')'),
            c => text.push(c),
        }
    }

    text.trim().to_string()
}
