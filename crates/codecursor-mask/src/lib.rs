//! codecursor-mask: comment and string masking for line search
//!
//! Turns raw source lines into a "search view" of the same shape in which
//! comments and string literals are blanked out, so substring searches only
//! ever match real code.

mod delimiter;
mod mask;

pub use delimiter::{Delimiter, Delimiters};
pub use mask::{Masker, FILLER};

/// Rejected delimiter configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MaskError {
    #[error("empty delimiter marker")]
    EmptyMarker,
    #[error("block delimiter needs an open and a close marker, got {0:?}")]
    IncompleteBlock(String),
    #[error("quote character must not be whitespace")]
    WhitespaceQuote,
    #[error("delimiter opener {0:?} is given more than once")]
    DuplicateOpener(String),
}
