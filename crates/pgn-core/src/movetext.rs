//! Header/movetext split and result-token detection.

use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[(\w+)\s+"([^"]*)"\]"#).unwrap());

static RESULT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)(1-0|0-1|1/2-1/2|\*)\s*$").unwrap());

/// A PGN string cut into its three verbatim parts.
///
/// `header + body + tail` always reproduces the input exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Movetext<'a> {
    /// Tag-pair lines plus the blank line(s) after them. Empty when absent.
    pub header: &'a str,
    /// Moves, comments and whitespace before the result token.
    pub body: &'a str,
    /// The result token and whatever trails it. Empty when there is no result.
    pub tail: &'a str,
    pub result: Option<&'a str>,
}

impl<'a> Movetext<'a> {
    pub fn parse(pgn: &'a str) -> Self {
        let (header, movetext) = split_header(pgn);

        match RESULT_RE.captures(movetext).and_then(|caps| caps.get(1)) {
            Some(result) => Movetext {
                header,
                body: &movetext[..result.start()],
                tail: &movetext[result.start()..],
                result: Some(result.as_str()),
            },
            None => Movetext {
                header,
                body: movetext,
                tail: "",
                result: None,
            },
        }
    }

    /// Value of a header tag such as `White` or `PlyCount`.
    pub fn tag(&self, name: &str) -> Option<&'a str> {
        TAG_RE
            .captures_iter(self.header)
            .find(|cap| &cap[1] == name)
            .and_then(|cap| cap.get(2))
            .map(|m| m.as_str())
    }

    pub fn ply_count(&self) -> Option<usize> {
        self.tag("PlyCount")?.trim().parse().ok()
    }
}

/// Split leading `[Tag "value"]` lines (and the blank lines after them)
/// from the movetext. Without tag lines the whole input is movetext.
pub fn split_header(pgn: &str) -> (&str, &str) {
    let mut offset = 0;
    let mut saw_tag = false;

    for line in pgn.split_inclusive('\n') {
        let trimmed = line.trim();
        let is_tag = trimmed.starts_with('[') && trimmed.ends_with(']');
        if !is_tag && !(saw_tag && trimmed.is_empty()) {
            break;
        }
        saw_tag |= is_tag;
        offset += line.len();
    }

    if saw_tag {
        pgn.split_at(offset)
    } else {
        ("", pgn)
    }
}
