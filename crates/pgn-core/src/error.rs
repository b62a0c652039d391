use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PgnError {
    #[error("No moves found in movetext")]
    NoMovesFound,

    #[error("Malformed annotation entry: {fragment}")]
    MalformedAnnotation { fragment: String },

    #[error("Unknown index mode '{0}' (expected direct, offset-by-two or auto)")]
    UnknownIndexMode(String),
}
