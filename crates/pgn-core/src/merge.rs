//! Annotation merge.
//!
//! Comments are spliced into the source movetext right after the move they
//! annotate, so every byte of the original (spacing, line breaks, existing
//! comments) survives. With nothing to place the output equals the input.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, info, warn};

use crate::annotations::{parse_annotations, Annotation};
use crate::error::PgnError;
use crate::game_data::{AnnotatedGame, RawGamePayload};
use crate::movetext::Movetext;
use crate::tokenizer::{tokenize, MoveToken};

/// How an annotation index maps onto a ply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexConvention {
    /// Index equals the ply.
    Direct,
    /// Index is the ply plus two. Ply 0 takes the first unplaced entry
    /// whatever its index, since the opening comment always lands there.
    OffsetByTwo,
}

impl IndexConvention {
    pub fn matches(self, ply: usize, index: usize) -> bool {
        match self {
            IndexConvention::Direct => ply == index,
            IndexConvention::OffsetByTwo => ply == 0 || index == ply + 2,
        }
    }
}

/// Convention selection for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexMode {
    Fixed(IndexConvention),
    /// Try [`IndexConvention::Direct`]; if it places nothing while usable
    /// annotations exist, redo the game with [`IndexConvention::OffsetByTwo`].
    #[default]
    Auto,
}

impl FromStr for IndexMode {
    type Err = PgnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(IndexMode::Fixed(IndexConvention::Direct)),
            "offset-by-two" | "offset" => Ok(IndexMode::Fixed(IndexConvention::OffsetByTwo)),
            "auto" => Ok(IndexMode::Auto),
            _ => Err(PgnError::UnknownIndexMode(s.to_string())),
        }
    }
}

impl fmt::Display for IndexMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndexMode::Fixed(IndexConvention::Direct) => "direct",
            IndexMode::Fixed(IndexConvention::OffsetByTwo) => "offset-by-two",
            IndexMode::Auto => "auto",
        };
        f.write_str(name)
    }
}

/// Movetext with comments spliced in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interleaved {
    pub text: String,
    pub placed: usize,
}

/// Splice `annotations` into `body` under `convention`.
///
/// Each ply takes at most one comment, the first unplaced entry that
/// matches; each entry is placed at most once. Never fails.
pub fn interleave(
    body: &str,
    tokens: &[MoveToken],
    annotations: &[Annotation],
    convention: IndexConvention,
) -> Interleaved {
    let extra: usize = annotations.iter().map(|a| a.text.len() + 3).sum();
    let mut text = String::with_capacity(body.len() + extra);
    let mut used = vec![false; annotations.len()];
    let mut copied = 0;
    let mut placed = 0;

    for token in tokens {
        let hit = annotations
            .iter()
            .enumerate()
            .find(|(i, a)| !used[*i] && convention.matches(token.ply, a.index));
        let Some((i, annotation)) = hit else {
            continue;
        };

        used[i] = true;
        text.push_str(&body[copied..token.insert_at]);
        text.push_str(" {");
        text.push_str(&annotation.text);
        text.push('}');
        copied = token.insert_at;
        placed += 1;
    }
    text.push_str(&body[copied..]);

    if placed < annotations.len() {
        debug!(
            unplaced = annotations.len() - placed,
            ?convention,
            "Annotations left without a matching ply"
        );
    }

    Interleaved { text, placed }
}

/// Usable annotations from a payload; malformed and empty entries are
/// dropped with a log line.
fn usable_annotations(payload: Option<&str>) -> Vec<Annotation> {
    let Some(payload) = payload else {
        return Vec::new();
    };

    parse_annotations(payload)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(annotation) if annotation.text.is_empty() => {
                debug!(index = annotation.index, "Skipping empty annotation");
                None
            }
            Ok(annotation) => Some(annotation),
            Err(e) => {
                warn!("Ignoring annotation: {e}");
                None
            }
        })
        .collect()
}

/// Build the annotated game for one fetched payload.
///
/// Fails only when the movetext has no moves; annotation problems degrade to
/// fewer (or no) comments.
pub fn annotate(payload: &RawGamePayload, mode: IndexMode) -> Result<AnnotatedGame, PgnError> {
    let parts = Movetext::parse(&payload.pgn);
    let tokenized = tokenize(parts.body)?;
    let tokens = &tokenized.tokens;

    if let Some(expected) = parts.ply_count() {
        if expected != tokens.len() {
            warn!(
                expected,
                found = tokens.len(),
                "PlyCount header disagrees with tokenized movetext"
            );
        }
    }

    let annotations = usable_annotations(payload.annotations.as_deref());

    let (convention, merged) = match mode {
        IndexMode::Fixed(convention) => {
            (convention, interleave(parts.body, tokens, &annotations, convention))
        }
        IndexMode::Auto => {
            let direct = interleave(parts.body, tokens, &annotations, IndexConvention::Direct);
            if direct.placed == 0 && !annotations.is_empty() {
                info!(
                    annotations = annotations.len(),
                    "No annotation matched a ply directly, retrying with offset-by-two indices"
                );
                let offset =
                    interleave(parts.body, tokens, &annotations, IndexConvention::OffsetByTwo);
                (IndexConvention::OffsetByTwo, offset)
            } else {
                (IndexConvention::Direct, direct)
            }
        }
    };

    let mut movetext = merged.text;
    movetext.push_str(parts.tail);

    Ok(AnnotatedGame::new(
        parts.header.to_string(),
        movetext,
        parts.result.map(str::to_string),
        tokens.len(),
        merged.placed,
        convention,
    ))
}
