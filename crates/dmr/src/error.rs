//! Error types for model mutation, coercion and binary encoding/decoding.

use thiserror::Error;

use crate::model::ModelType;

/// Broad failure categories shared by every error type in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Write attempted on a protected subtree.
    Protected,
    /// No coercion path, undefined source, or an unparsable/out-of-range value.
    Conversion,
    /// The node's current type cannot host the requested child.
    Shape,
    /// A required child is absent.
    NotFound,
    /// A binary stream could not be decoded.
    Malformed,
}

/// Error raised by node operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("node is protected and cannot be modified")]
    Protected,

    // === Conversion ===
    #[error("cannot convert {from} to {to}")]
    NoConversion { from: ModelType, to: ModelType },

    #[error("cannot convert an undefined value to {to}")]
    UndefinedValue { to: ModelType },

    #[error("invalid {to} format: {value:?}")]
    InvalidFormat { to: ModelType, value: String },

    #[error("value {value} is out of range for {to}")]
    OutOfRange { to: ModelType, value: String },

    // === Structure ===
    #[error("a {found} node cannot hold a child at {key}")]
    Shape { found: ModelType, key: String },

    #[error("index {index} is out of range for a list of size {size}")]
    IndexOutOfRange { index: usize, size: usize },

    #[error("no child at {key}")]
    NotFound { key: String },
}

impl ModelError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ModelError::Protected => ErrorKind::Protected,
            ModelError::NoConversion { .. }
            | ModelError::UndefinedValue { .. }
            | ModelError::InvalidFormat { .. }
            | ModelError::OutOfRange { .. } => ErrorKind::Conversion,
            ModelError::Shape { .. } | ModelError::IndexOutOfRange { .. } => ErrorKind::Shape,
            ModelError::NotFound { .. } => ErrorKind::NotFound,
        }
    }
}

/// Error during binary decoding.
///
/// Every variant is a malformed-stream condition; decoding always targets a
/// fresh node, so a failed decode never leaves a partially built tree behind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("unknown type tag 0x{tag:02x}")]
    InvalidTag { tag: u8 },

    #[error("invalid bool value: {value} (expected 0x00 or 0x01)")]
    InvalidBool { value: u8 },

    #[error("negative {field} length {len}")]
    NegativeLength { field: &'static str, len: i32 },

    #[error("{field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("nesting depth exceeds maximum {max}")]
    DepthExceeded { max: usize },

    #[error("invalid modified UTF-8 in {field}")]
    InvalidUtf8 { field: &'static str },

    #[error("{count} trailing bytes after the root node")]
    TrailingBytes { count: usize },

    #[error("invalid base64: {0}")]
    InvalidBase64(String),
}

impl DecodeError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Malformed
    }
}

/// Error during binary encoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("{field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("decimal scale {scale} does not fit in 32 bits")]
    ScaleOutOfRange { scale: i64 },
}
