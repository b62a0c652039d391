use std::fmt;

use crate::merge::IndexConvention;

/// A game as fetched: entity-decoded PGN text plus the raw annotation
/// payload, when the page carried one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawGamePayload {
    pub pgn: String,
    pub annotations: Option<String>,
}

impl RawGamePayload {
    pub fn new(pgn: impl Into<String>, annotations: Option<String>) -> Self {
        Self {
            pgn: pgn.into(),
            annotations,
        }
    }
}

/// Final game text: header untouched, comments spliced into the movetext,
/// original result token at the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedGame {
    header: String,
    movetext: String,
    result: Option<String>,
    plies: usize,
    placed: usize,
    convention: IndexConvention,
}

impl AnnotatedGame {
    pub(crate) fn new(
        header: String,
        movetext: String,
        result: Option<String>,
        plies: usize,
        placed: usize,
        convention: IndexConvention,
    ) -> Self {
        Self {
            header,
            movetext,
            result,
            plies,
            placed,
            convention,
        }
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn movetext(&self) -> &str {
        &self.movetext
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    /// Number of half-moves in the game.
    pub fn plies(&self) -> usize {
        self.plies
    }

    /// Number of comments that were placed.
    pub fn placed(&self) -> usize {
        self.placed
    }

    pub fn convention(&self) -> IndexConvention {
        self.convention
    }

    pub fn to_pgn(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AnnotatedGame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.header, self.movetext)
    }
}
