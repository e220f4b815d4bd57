//! Encodings of model trees.
//!
//! - `binary`: the tagged binary wire format and its base64 envelope
//! - `json`: one-way JSON export
//! - `text`: DMR text rendering (`Display`)

pub mod binary;
pub mod json;
pub mod primitives;
pub(crate) mod text;

pub use binary::{DecodeOptions, decode_node, encode_node};
pub use primitives::{Reader, Writer};
