use crate::layout::Field;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Errors recovering a [Payload](crate::Payload) from captured link data.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FrameError {
    #[error("invalid hex text: {0}")]
    InvalidHex(String),

    /// Capture is shorter than the nominal link frame.
    #[error("short frame: got {actual} bytes, expected at least {minimum}")]
    ShortFrame {
        /// Number of bytes captured
        actual: usize,
        /// Nominal frame length
        minimum: usize,
    },

    /// De-escaped data is not exactly 256 bits.
    #[error("expected 64 hex digits after de-escaping, got {digits}")]
    BadWidth { digits: usize },
}

/// A field value that cannot be represented in the payload bits or in its TLE columns.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FieldError {
    #[error("{field} value {value} exceeds limit {limit}")]
    OutOfRange { field: Field, value: u64, limit: u64 },

    #[error("invalid {field} text {text:?}")]
    Syntax { field: Field, text: String },

    #[error("{field} is not a finite number")]
    NotFinite { field: Field },
}

/// TLE text that does not follow the fixed column layout.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FormatError {
    #[error("line {line} must be 69 columns, got {actual}")]
    LineLength { line: u8, actual: usize },

    #[error("line {line} must start with {line}, got {actual:?}")]
    LineNumber { line: u8, actual: char },

    #[error("line {line} checksum is {actual}, computed {expected}")]
    Checksum { line: u8, expected: u8, actual: u8 },

    #[error("catalog number differs between lines: {line1} != {line2}")]
    CatalogMismatch { line1: u32, line2: u32 },

    #[error("invalid {name} column text {text:?}")]
    Column { name: &'static str, text: String },

    #[error("expected 2 or 3 lines of TLE text, got {0}")]
    MissingLines(usize),
}
