//! Error types for the tag codec.

use thiserror::Error;

/// Errors raised while reading or writing a tag tree.
#[derive(Debug, Error)]
pub enum NbtError {
    /// IO errors, including truncated input
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unknown tag kind byte
    #[error("Unknown tag type: {0}")]
    UnknownTagType(u8),

    /// Root of a document was not a compound
    #[error("Root tag must be a compound, found type {0}")]
    InvalidRoot(u8),

    /// A length prefix was negative
    #[error("Negative length: {0}")]
    NegativeLength(i32),

    /// A string was not valid modified UTF-8
    #[error("Invalid modified UTF-8 in string tag")]
    InvalidString,

    /// A string did not fit the 16-bit length prefix
    #[error("String too long: {0} bytes")]
    StringTooLong(usize),

    /// An array or list did not fit the 32-bit length prefix
    #[error("Length overflows the length prefix: {0}")]
    LengthOverflow(usize),

    /// A list mixed element kinds
    #[error("List elements must share one type")]
    MixedList,

    /// Nesting exceeded the depth limit
    #[error("Nesting depth exceeds {0}")]
    DepthLimit(usize),
}

/// Result type alias for codec operations.
pub type NbtResult<T> = Result<T, NbtError>;
