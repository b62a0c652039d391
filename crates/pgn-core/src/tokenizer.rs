//! Movetext tokenizer.
//!
//! Tokenizing runs in two phases. The lexer splits movetext into move
//! numbers, SAN words, NAGs and the result, skipping comments, variations
//! and escape lines. The assembler then folds those lexemes into a single
//! ply sequence: white move 1, black move 1, white move 2, and so on.
//!
//! Two move-number conventions occur in the wild: `1. e4` (spaced) and
//! `1.e4` (glued). Both are recognised everywhere so no move is ever lost;
//! the game's convention is reported by [`tokenize`].

use std::iter::Peekable;
use std::ops::Range;

use tracing::debug;

use crate::error::PgnError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    White,
    Black,
}

impl Side {
    fn opposite(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveNumberStyle {
    /// `1. e4`
    Spaced,
    /// `1.e4`
    Glued,
}

/// One half-move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveToken {
    /// Zero-based half-move index within the game.
    pub ply: usize,
    pub side: Side,
    pub number: Option<u32>,
    /// Display text: `1. e4`, `2.Nf3`, `12... Nf6` or a bare `e5`.
    pub text: String,
    /// Byte range of `text` in the tokenized movetext.
    pub span: Range<usize>,
    /// Where a comment for this move goes: the end of the move, or of the
    /// NAGs written directly after it.
    pub insert_at: usize,
}

/// Eagerly tokenized movetext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokenized {
    pub tokens: Vec<MoveToken>,
    pub style: MoveNumberStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lexeme {
    /// `12.` on its own, or `12...` when `black` is set.
    Number { value: u32, black: bool },
    /// `12.Nf3`; the move itself starts at `san_start`.
    GluedNumber {
        value: u32,
        black: bool,
        san_start: usize,
    },
    San,
    Nag,
    Result,
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn skip_past(&mut self, terminator: u8) {
        let src = self.src;
        self.pos = match src.as_bytes()[self.pos..]
            .iter()
            .position(|&b| b == terminator)
        {
            Some(offset) => self.pos + offset + 1,
            None => self.src.len(),
        };
    }

    /// Skip a `( ... )` variation, including nested ones and any comments
    /// inside it.
    fn skip_variation(&mut self) {
        let src = self.src;
        let bytes = src.as_bytes();
        let mut depth = 0usize;

        while let Some(&b) = bytes.get(self.pos) {
            match b {
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos += 1;
                        return;
                    }
                }
                b'{' => {
                    self.skip_past(b'}');
                    continue;
                }
                b';' => {
                    self.skip_past(b'\n');
                    continue;
                }
                _ => {}
            }
            self.pos += 1;
        }
    }

    fn at_line_start(&self) -> bool {
        self.pos == 0 || self.src.as_bytes()[self.pos - 1] == b'\n'
    }

    fn word(&mut self) -> (Lexeme, Range<usize>) {
        let src = self.src;
        let start = self.pos;
        let bytes = src.as_bytes();
        while let Some(&b) = bytes.get(self.pos) {
            if b.is_ascii_whitespace() || matches!(b, b'{' | b'}' | b'(' | b')' | b';') {
                break;
            }
            self.pos += 1;
        }
        (classify(&src[start..self.pos], start), start..self.pos)
    }
}

impl Iterator for Lexer<'_> {
    type Item = (Lexeme, Range<usize>);

    fn next(&mut self) -> Option<Self::Item> {
        let src = self.src;
        let bytes = src.as_bytes();
        loop {
            let b = *bytes.get(self.pos)?;
            match b {
                b if b.is_ascii_whitespace() => self.pos += 1,
                b'{' => self.skip_past(b'}'),
                b';' => self.skip_past(b'\n'),
                b'%' if self.at_line_start() => self.skip_past(b'\n'),
                b'(' => self.skip_variation(),
                b')' | b'}' => self.pos += 1,
                _ => return Some(self.word()),
            }
        }
    }
}

fn classify(word: &str, start: usize) -> Lexeme {
    if matches!(word, "1-0" | "0-1" | "1/2-1/2" | "*") {
        return Lexeme::Result;
    }
    if let Some(code) = word.strip_prefix('$') {
        if !code.is_empty() && code.bytes().all(|b| b.is_ascii_digit()) {
            return Lexeme::Nag;
        }
    }
    if word.bytes().all(|b| matches!(b, b'!' | b'?' | b'+' | b'-' | b'=')) {
        return Lexeme::Nag;
    }

    let digits = word.bytes().take_while(|b| b.is_ascii_digit()).count();
    let dots = word[digits..].bytes().take_while(|&b| b == b'.').count();
    if digits == 0 || dots == 0 {
        return Lexeme::San;
    }
    let Ok(value) = word[..digits].parse::<u32>() else {
        return Lexeme::San;
    };

    let black = dots >= 3;
    if digits + dots == word.len() {
        Lexeme::Number { value, black }
    } else {
        Lexeme::GluedNumber {
            value,
            black,
            san_start: start + digits + dots,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingNumber {
    value: u32,
    side: Side,
    start: usize,
}

/// Lazy ply sequence over a movetext body. Stops at the result token.
pub struct MoveTokens<'a> {
    src: &'a str,
    lexer: Peekable<Lexer<'a>>,
    pending: Option<PendingNumber>,
    next_side: Side,
    number: Option<u32>,
    ply: usize,
}

/// Tokenize lazily. Recreate the iterator to walk the moves again.
pub fn move_tokens(movetext: &str) -> MoveTokens<'_> {
    MoveTokens {
        src: movetext,
        lexer: Lexer::new(movetext).peekable(),
        pending: None,
        next_side: Side::White,
        number: None,
        ply: 0,
    }
}

impl MoveTokens<'_> {
    fn emit(&mut self, pending: Option<PendingNumber>, san: Range<usize>) -> MoveToken {
        let (side, start) = match pending {
            Some(p) => {
                self.number = Some(p.value);
                (p.side, p.start)
            }
            None => {
                if self.next_side == Side::White {
                    debug!(
                        ply = self.ply,
                        san = &self.src[san.clone()],
                        "White move without a move number"
                    );
                }
                (self.next_side, san.start)
            }
        };

        let mut insert_at = san.end;
        while let Some((Lexeme::Nag, range)) = self.lexer.peek() {
            insert_at = range.end;
            self.lexer.next();
        }

        let token = MoveToken {
            ply: self.ply,
            side,
            number: self.number,
            text: self.src[start..san.end].to_string(),
            span: start..san.end,
            insert_at,
        };
        self.ply += 1;
        self.next_side = side.opposite();
        token
    }
}

impl Iterator for MoveTokens<'_> {
    type Item = MoveToken;

    fn next(&mut self) -> Option<MoveToken> {
        loop {
            let (lexeme, range) = self.lexer.next()?;
            match lexeme {
                Lexeme::Result => return None,
                Lexeme::Nag => {}
                Lexeme::Number { value, black } => {
                    self.pending = Some(PendingNumber {
                        value,
                        side: if black { Side::Black } else { Side::White },
                        start: range.start,
                    });
                }
                Lexeme::GluedNumber {
                    value,
                    black,
                    san_start,
                } => {
                    let pending = PendingNumber {
                        value,
                        side: if black { Side::Black } else { Side::White },
                        start: range.start,
                    };
                    self.pending = None;
                    return Some(self.emit(Some(pending), san_start..range.end));
                }
                Lexeme::San => {
                    let pending = self.pending.take();
                    return Some(self.emit(pending, range));
                }
            }
        }
    }
}

/// Pick the game's move-number convention: spaced first, glued as fallback.
fn detect_style(movetext: &str) -> Option<MoveNumberStyle> {
    let (mut spaced, mut glued) = (0usize, 0usize);
    let mut lexer = Lexer::new(movetext).peekable();

    while let Some((lexeme, _)) = lexer.next() {
        match lexeme {
            Lexeme::Number { .. } if matches!(lexer.peek(), Some((Lexeme::San, _))) => {
                spaced += 1
            }
            Lexeme::GluedNumber { .. } => glued += 1,
            Lexeme::Result => break,
            _ => {}
        }
    }

    if spaced > 0 && glued > 0 {
        debug!(spaced, glued, "Mixed move-number styles in one game");
    }
    match (spaced, glued) {
        (0, 0) => None,
        (0, _) => Some(MoveNumberStyle::Glued),
        _ => Some(MoveNumberStyle::Spaced),
    }
}

/// Tokenize a movetext body and check its numbering.
///
/// Fails with [`PgnError::NoMovesFound`] when no numbered white move exists
/// under either convention.
pub fn tokenize(movetext: &str) -> Result<Tokenized, PgnError> {
    let style = detect_style(movetext).ok_or(PgnError::NoMovesFound)?;
    let tokens: Vec<MoveToken> = move_tokens(movetext).collect();

    if !tokens.iter().any(|t| t.side == Side::White) {
        return Err(PgnError::NoMovesFound);
    }

    let mut last = 0;
    for token in tokens.iter().filter(|t| t.side == Side::White) {
        if let Some(number) = token.number {
            if number < last {
                debug!(ply = token.ply, number, last, "Move number goes backwards");
            }
            last = number;
        }
    }

    Ok(Tokenized { tokens, style })
}
