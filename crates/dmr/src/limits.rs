//! Default limits applied when decoding untrusted binary input.
//!
//! These are the defaults behind [`DecodeOptions`](crate::codec::DecodeOptions);
//! callers with other requirements override them per decode.

/// Maximum nesting depth of lists, objects and properties.
pub const MAX_DEPTH: usize = 512;

/// Maximum number of children in a single list or object.
pub const MAX_COLLECTION_LEN: usize = 1 << 20;

/// Maximum length of a bytes, big number or long string payload.
pub const MAX_BYTES_LEN: usize = 16 * 1024 * 1024;

/// Maximum encoded length of a modified UTF-8 string (16-bit length prefix).
pub const MAX_UTF_LEN: usize = u16::MAX as usize;
