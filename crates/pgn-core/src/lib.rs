//! Annotated PGN assembly.
//!
//! Splits a fetched PGN into header and movetext, tokenizes the movetext into
//! half-moves, parses the site's index-addressed annotation payload and
//! splices the comments back in after the moves they belong to.

pub mod annotations;
pub mod error;
pub mod game_data;
pub mod merge;
pub mod movetext;
pub mod tokenizer;

pub use annotations::{parse_annotations, Annotation};
pub use error::PgnError;
pub use game_data::{AnnotatedGame, RawGamePayload};
pub use merge::{annotate, interleave, IndexConvention, IndexMode};
pub use movetext::Movetext;
pub use tokenizer::{move_tokens, tokenize, MoveNumberStyle, MoveToken, Side, Tokenized};
