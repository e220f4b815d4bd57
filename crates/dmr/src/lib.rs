//! DMR: a dynamic model representation for hierarchical management data.
//!
//! This crate provides the in-memory value tree, its type-conversion rules,
//! and its encodings: a compact tagged binary format (with a base64
//! envelope), a JSON export and the DMR text notation.
//!
//! # Overview
//!
//! A [`ModelNode`] is a mutable cell holding exactly one value:
//! - **Scalars**: boolean, int, long, double, big integer, big decimal,
//!   bytes, string, expression and type references
//! - **Structures**: lists, insertion-ordered objects and single-entry
//!   properties, whose children are themselves nodes
//! - **Protection**: [`ModelNode::protect`] makes a subtree read-only
//!
//! # Quick Start
//!
//! ```rust
//! use dmr::{ModelNode, ModelType};
//!
//! let mut op = ModelNode::new();
//! op.get_or_create("operation")?.set("read-resource")?;
//! op.get_or_create("address")?.add_property("subsystem", "logging")?;
//! op.get_or_create("recursive")?.set(true)?;
//!
//! // Encode to binary and decode back
//! let bytes = op.to_bytes().unwrap();
//! let decoded = ModelNode::from_bytes(&bytes).unwrap();
//! assert_eq!(op, decoded);
//!
//! // Values convert on request
//! assert_eq!(decoded.require("recursive")?.as_string(), "true");
//! assert_eq!(decoded.require("address")?.get_type(), ModelType::List);
//! # Ok::<(), dmr::ModelError>(())
//! ```
//!
//! # Modules
//!
//! - [`model`]: Node, value types, properties and the coercion rules
//! - [`codec`]: Binary encoding/decoding, base64, JSON and text output
//! - [`error`]: Error types
//! - [`limits`]: Default limits for decoding
//!
//! # Security
//!
//! The decoder is designed to safely handle untrusted input:
//! - Nesting depth, collection sizes and payload lengths are bounded by
//!   configurable limits ([`DecodeOptions`])
//! - Declared counts are checked against the remaining input before allocating
//! - Invalid data is rejected with descriptive errors
//!
//! # Wire Format
//!
//! Every node is written as one tag byte followed by a type-specific
//! payload, depth first. Integers are big-endian and strings use the
//! modified UTF-8 of `java.io.DataOutput`, so the format is byte compatible
//! with other readers of the same format.

pub mod codec;
pub mod error;
pub mod limits;
pub mod model;

// Re-export commonly used types at crate root
pub use codec::{DecodeOptions, Reader, Writer};
pub use error::{DecodeError, EncodeError, ErrorKind, ModelError};
pub use model::{
    ChildKey, Expression, FAILURE_DESCRIPTION, Key, ModelNode, ModelType, OUTCOME,
    ParseModelTypeError, Property, SUCCESS,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
