//! Binary encoding/decoding of model trees, plus the base64 envelope.
//!
//! Depth-first pre-order: every node writes one tag byte (see
//! [`ModelType::tag`]) followed by a type-specific payload.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use num_bigint::BigInt;

use crate::codec::primitives::{Reader, Writer, modified_utf8_len};
use crate::error::{DecodeError, EncodeError};
use crate::limits::{MAX_BYTES_LEN, MAX_COLLECTION_LEN, MAX_DEPTH, MAX_UTF_LEN};
use crate::model::value::ModelValue;
use crate::model::{ModelNode, ModelType, Property};

/// String tag used when the modified UTF-8 form does not fit a 16-bit
/// length. The payload is an i32 byte length followed by UTF-8.
const LONG_STRING_TAG: u8 = b'S';

/// Options for decoding binary model data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Maximum nesting depth of lists, objects and properties.
    pub max_depth: usize,
    /// Maximum number of children in a single list or object.
    pub max_collection_len: usize,
    /// Maximum length of a bytes, big number or long string payload.
    pub max_bytes_len: usize,
    /// Accept input that continues after the root node.
    ///
    /// When disabled (the default) trailing bytes are a malformed stream.
    pub allow_trailing: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            max_collection_len: MAX_COLLECTION_LEN,
            max_bytes_len: MAX_BYTES_LEN,
            allow_trailing: false,
        }
    }
}

impl DecodeOptions {
    /// Creates default decoding options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_collection_len(mut self, max_collection_len: usize) -> Self {
        self.max_collection_len = max_collection_len;
        self
    }

    pub fn with_max_bytes_len(mut self, max_bytes_len: usize) -> Self {
        self.max_bytes_len = max_bytes_len;
        self
    }

    pub fn allow_trailing(mut self, allow: bool) -> Self {
        self.allow_trailing = allow;
        self
    }
}

// =============================================================================
// DECODING
// =============================================================================

/// Decodes one node (and its subtree) from the reader.
pub fn decode_node(reader: &mut Reader<'_>, options: &DecodeOptions) -> Result<ModelNode, DecodeError> {
    decode_at_depth(reader, options, 0).map(ModelNode::from_value)
}

fn decode_at_depth(
    reader: &mut Reader<'_>,
    options: &DecodeOptions,
    depth: usize,
) -> Result<ModelValue, DecodeError> {
    let tag = reader.read_byte("type tag")?;
    let model_type = ModelType::from_tag(tag).ok_or(DecodeError::InvalidTag { tag })?;

    let value = match model_type {
        ModelType::Undefined => ModelValue::Undefined,
        ModelType::Boolean => match reader.read_byte("boolean")? {
            0x00 => ModelValue::Boolean(false),
            0x01 => ModelValue::Boolean(true),
            value => return Err(DecodeError::InvalidBool { value }),
        },
        ModelType::Int => ModelValue::Int(reader.read_i32("int")?),
        ModelType::Long => ModelValue::Long(reader.read_i64("long")?),
        ModelType::Double => ModelValue::Double(reader.read_f64("double")?),
        ModelType::BigInteger => {
            let bytes = reader.read_bytes_prefixed(options.max_bytes_len, "big integer")?;
            ModelValue::BigInteger(BigInt::from_signed_bytes_be(&bytes))
        }
        ModelType::BigDecimal => {
            let bytes = reader.read_bytes_prefixed(options.max_bytes_len, "big decimal")?;
            let scale = reader.read_i32("big decimal scale")?;
            ModelValue::BigDecimal(BigDecimal::new(
                BigInt::from_signed_bytes_be(&bytes),
                i64::from(scale),
            ))
        }
        ModelType::Bytes => ModelValue::Bytes(reader.read_bytes_prefixed(options.max_bytes_len, "bytes")?),
        ModelType::String if tag == LONG_STRING_TAG => {
            ModelValue::String(reader.read_utf_long(options.max_bytes_len, "string")?)
        }
        ModelType::String => ModelValue::String(reader.read_utf("string")?),
        ModelType::Expression => ModelValue::Expression(reader.read_utf("expression")?),
        ModelType::Type => {
            let tag = reader.read_byte("type value")?;
            ModelValue::Type(ModelType::from_tag(tag).ok_or(DecodeError::InvalidTag { tag })?)
        }
        ModelType::List => {
            let depth = enter(depth, options)?;
            let count = read_count(reader, options, "list")?;
            let mut list = Vec::with_capacity(count);
            for _ in 0..count {
                list.push(ModelNode::from_value(decode_at_depth(reader, options, depth)?));
            }
            ModelValue::List(list)
        }
        ModelType::Object => {
            let depth = enter(depth, options)?;
            let count = read_count(reader, options, "object")?;
            let mut map = IndexMap::with_capacity(count);
            for _ in 0..count {
                let key = reader.read_utf("object key")?;
                let child = ModelNode::from_value(decode_at_depth(reader, options, depth)?);
                map.insert(key, child);
            }
            ModelValue::Object(map)
        }
        ModelType::Property => {
            let depth = enter(depth, options)?;
            let name = reader.read_utf("property name")?;
            let value = ModelNode::from_value(decode_at_depth(reader, options, depth)?);
            ModelValue::Property(Box::new(Property { name, value }))
        }
    };
    Ok(value)
}

fn enter(depth: usize, options: &DecodeOptions) -> Result<usize, DecodeError> {
    if depth >= options.max_depth {
        return Err(DecodeError::DepthExceeded {
            max: options.max_depth,
        });
    }
    Ok(depth + 1)
}

/// Reads a child count. Every child takes at least one byte, so a count
/// larger than the remaining input is truncated before allocating.
fn read_count(
    reader: &mut Reader<'_>,
    options: &DecodeOptions,
    field: &'static str,
) -> Result<usize, DecodeError> {
    let count = reader.read_length(options.max_collection_len, field)?;
    if count > reader.remaining_len() {
        return Err(DecodeError::UnexpectedEof { context: field });
    }
    Ok(count)
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes a node (and its subtree) to the writer.
pub fn encode_node(writer: &mut Writer, node: &ModelNode) -> Result<(), EncodeError> {
    encode_value(writer, &node.value)
}

fn encode_value(writer: &mut Writer, value: &ModelValue) -> Result<(), EncodeError> {
    let tag = match value {
        ModelValue::String(s) if modified_utf8_len(s) > MAX_UTF_LEN => LONG_STRING_TAG,
        other => other.model_type().tag(),
    };
    writer.write_byte(tag);
    match value {
        ModelValue::Undefined => {}
        ModelValue::Boolean(v) => writer.write_byte(u8::from(*v)),
        ModelValue::Int(v) => writer.write_i32(*v),
        ModelValue::Long(v) => writer.write_i64(*v),
        ModelValue::Double(v) => writer.write_f64(*v),
        ModelValue::BigInteger(v) => writer.write_bytes_prefixed(&v.to_signed_bytes_be(), "big integer")?,
        ModelValue::BigDecimal(v) => {
            let (unscaled, scale) = v.as_bigint_and_exponent();
            let scale = i32::try_from(scale).map_err(|_| EncodeError::ScaleOutOfRange { scale })?;
            writer.write_bytes_prefixed(&unscaled.to_signed_bytes_be(), "big decimal")?;
            writer.write_i32(scale);
        }
        ModelValue::Bytes(bytes) => writer.write_bytes_prefixed(bytes, "bytes")?,
        ModelValue::String(s) if tag == LONG_STRING_TAG => writer.write_utf_long(s, "string")?,
        ModelValue::String(s) => writer.write_utf(s, "string")?,
        ModelValue::Expression(s) => writer.write_utf(s, "expression")?,
        ModelValue::Type(t) => writer.write_byte(t.tag()),
        ModelValue::List(list) => {
            writer.write_length(list.len(), "list")?;
            for child in list {
                encode_node(writer, child)?;
            }
        }
        ModelValue::Object(map) => {
            writer.write_length(map.len(), "object")?;
            for (key, child) in map {
                writer.write_utf(key, "object key")?;
                encode_node(writer, child)?;
            }
        }
        ModelValue::Property(property) => {
            writer.write_utf(&property.name, "property name")?;
            encode_node(writer, &property.value)?;
        }
    }
    Ok(())
}

// =============================================================================
// NODE API
// =============================================================================

impl ModelNode {
    /// Appends the binary form of this node to a writer.
    pub fn write_external(&self, writer: &mut Writer) -> Result<(), EncodeError> {
        encode_node(writer, self)
    }

    /// Encodes this node to its binary form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        let mut writer = Writer::with_capacity(64);
        encode_node(&mut writer, self)?;
        tracing::trace!(len = writer.len(), "encoded model node");
        Ok(writer.into_bytes())
    }

    /// Decodes a fresh node from its binary form using default limits.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::from_bytes_with_options(bytes, &DecodeOptions::default())
    }

    /// Decodes a fresh node from its binary form.
    pub fn from_bytes_with_options(bytes: &[u8], options: &DecodeOptions) -> Result<Self, DecodeError> {
        tracing::trace!(len = bytes.len(), "decoding model node");
        let mut reader = Reader::new(bytes);
        let result = decode_node(&mut reader, options).and_then(|node| {
            if !options.allow_trailing && !reader.is_empty() {
                return Err(DecodeError::TrailingBytes {
                    count: reader.remaining_len(),
                });
            }
            Ok(node)
        });
        if let Err(err) = &result {
            tracing::debug!(error = %err, position = reader.position(), "rejected malformed model stream");
        }
        result
    }

    /// Encodes this node to base64 of its binary form.
    pub fn to_base64(&self) -> Result<String, EncodeError> {
        Ok(STANDARD.encode(self.to_bytes()?))
    }

    /// Decodes a fresh node from base64 of its binary form.
    pub fn from_base64(encoded: &str) -> Result<Self, DecodeError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| DecodeError::InvalidBase64(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    use proptest::prelude::*;

    use super::*;
    use crate::error::ErrorKind;

    pub(crate) fn arb_scalar() -> impl Strategy<Value = ModelNode> {
        prop_oneof![
            Just(ModelNode::new()),
            any::<bool>().prop_map(ModelNode::from),
            any::<i32>().prop_map(ModelNode::from),
            any::<i64>().prop_map(ModelNode::from),
            any::<f64>().prop_map(ModelNode::from),
            any::<i64>().prop_map(|v| ModelNode::from(BigInt::from(v) * BigInt::from(1_000_000_007i64))),
            (any::<i64>(), -12i64..12).prop_map(|(m, s)| ModelNode::from(BigDecimal::new(BigInt::from(m), s))),
            prop::collection::vec(any::<u8>(), 0..16).prop_map(ModelNode::from),
            "\\PC{0,16}".prop_map(ModelNode::from),
            "\\$\\{[a-z.]{1,8}\\}".prop_map(ModelNode::expression),
            prop::sample::select(ModelType::ALL.to_vec()).prop_map(ModelNode::from),
        ]
    }

    pub(crate) fn arb_node() -> impl Strategy<Value = ModelNode> {
        arb_scalar().prop_recursive(4, 64, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(ModelNode::from),
                prop::collection::vec(("[a-z-]{1,6}", inner.clone()), 0..6).prop_map(|entries| {
                    let mut node = ModelNode::empty_object();
                    for (key, value) in entries {
                        node.get_or_create(key.as_str()).unwrap().set(value).unwrap();
                    }
                    node
                }),
                ("[a-z]{1,6}", inner).prop_map(|(name, value)| ModelNode::from(Property::new(name, value))),
            ]
        })
    }

    fn hash_of(node: &ModelNode) -> u64 {
        let mut hasher = DefaultHasher::new();
        node.hash(&mut hasher);
        hasher.finish()
    }

    proptest! {
        #[test]
        fn prop_binary_roundtrip(node in arb_node()) {
            let bytes = node.to_bytes().unwrap();
            let decoded = ModelNode::from_bytes(&bytes).unwrap();
            prop_assert_eq!(&decoded, &node);
            prop_assert_eq!(decoded.to_bytes().unwrap(), bytes);
        }

        #[test]
        fn prop_base64_roundtrip(node in arb_node()) {
            let encoded = node.to_base64().unwrap();
            prop_assert_eq!(ModelNode::from_base64(&encoded).unwrap(), node);
        }

        #[test]
        fn prop_clone_equal_and_hash_equal(node in arb_node()) {
            let copy = node.clone();
            prop_assert_eq!(&copy, &node);
            prop_assert_eq!(hash_of(&copy), hash_of(&node));
        }

        #[test]
        fn prop_truncated_input_is_rejected(node in arb_node()) {
            let bytes = node.to_bytes().unwrap();
            for len in 0..bytes.len() {
                let err = ModelNode::from_bytes(&bytes[..len]).unwrap_err();
                prop_assert_eq!(err.kind(), ErrorKind::Malformed);
            }
        }
    }

    #[test]
    fn test_scalar_wire_bytes() {
        assert_eq!(ModelNode::new().to_bytes().unwrap(), b"u");
        assert_eq!(ModelNode::from(true).to_bytes().unwrap(), &[b'Z', 1]);
        assert_eq!(ModelNode::from(1).to_bytes().unwrap(), &[b'I', 0, 0, 0, 1]);
        assert_eq!(
            ModelNode::from(-1i64).to_bytes().unwrap(),
            &[b'J', 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
        );
        assert_eq!(
            ModelNode::from(1.0).to_bytes().unwrap(),
            &[b'D', 0x3F, 0xF0, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(ModelNode::from("hi").to_bytes().unwrap(), &[b's', 0, 2, b'h', b'i']);
        assert_eq!(ModelNode::expression("${a}").to_bytes().unwrap(), b"e\x00\x04${a}");
        assert_eq!(ModelNode::from(ModelType::Long).to_bytes().unwrap(), b"tJ");
        assert_eq!(
            ModelNode::from(vec![1u8, 2]).to_bytes().unwrap(),
            &[b'b', 0, 0, 0, 2, 1, 2]
        );
        assert_eq!(
            ModelNode::from(BigInt::from(-1)).to_bytes().unwrap(),
            &[b'i', 0, 0, 0, 1, 0xFF]
        );
        let decimal: BigDecimal = "1.5".parse().unwrap();
        assert_eq!(
            ModelNode::from(decimal).to_bytes().unwrap(),
            &[b'd', 0, 0, 0, 1, 15, 0, 0, 0, 1]
        );
    }

    #[test]
    fn test_structural_wire_bytes() {
        let mut object = ModelNode::new();
        object.get_or_create("a").unwrap().set(true).unwrap();
        assert_eq!(
            object.to_bytes().unwrap(),
            &[b'o', 0, 0, 0, 1, 0, 1, b'a', b'Z', 1]
        );

        let mut list = ModelNode::new();
        list.add(1).unwrap().add(ModelNode::new()).unwrap();
        assert_eq!(
            list.to_bytes().unwrap(),
            &[b'l', 0, 0, 0, 2, b'I', 0, 0, 0, 1, b'u']
        );

        let property = ModelNode::from(Property::new("k", false));
        assert_eq!(property.to_bytes().unwrap(), &[b'p', 0, 1, b'k', b'Z', 0]);
    }

    #[test]
    fn test_long_string_tag() {
        let node = ModelNode::from_bytes(b"S\x00\x00\x00\x05hello").unwrap();
        assert_eq!(node, ModelNode::from("hello"));
        assert_eq!(node.to_bytes().unwrap(), b"s\x00\x05hello");

        assert_eq!(
            ModelNode::from_bytes(b"S\x00\x00\x00\x05hel").unwrap_err(),
            DecodeError::UnexpectedEof { context: "string" }
        );
    }

    #[test]
    fn test_unknown_tag() {
        let err = ModelNode::from_bytes(b"x\x00\x00").unwrap_err();
        assert_eq!(err, DecodeError::InvalidTag { tag: b'x' });
        assert_eq!(err.kind(), ErrorKind::Malformed);

        let err = ModelNode::from_bytes(b"tq").unwrap_err();
        assert_eq!(err, DecodeError::InvalidTag { tag: b'q' });
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(
            ModelNode::from_bytes(&[]).unwrap_err(),
            DecodeError::UnexpectedEof { context: "type tag" }
        );
    }

    #[test]
    fn test_invalid_bool() {
        assert_eq!(
            ModelNode::from_bytes(&[b'Z', 2]).unwrap_err(),
            DecodeError::InvalidBool { value: 2 }
        );
    }

    #[test]
    fn test_trailing_bytes() {
        let data = [b'I', 0, 0, 0, 1, b'u'];
        assert_eq!(
            ModelNode::from_bytes(&data).unwrap_err(),
            DecodeError::TrailingBytes { count: 1 }
        );
        let options = DecodeOptions::new().allow_trailing(true);
        assert_eq!(
            ModelNode::from_bytes_with_options(&data, &options).unwrap(),
            ModelNode::from(1)
        );
    }

    #[test]
    fn test_huge_count_is_truncation_not_allocation() {
        let data = [b'l', 0x00, 0x0F, 0xFF, 0xFF];
        assert_eq!(
            ModelNode::from_bytes(&data).unwrap_err(),
            DecodeError::UnexpectedEof { context: "list" }
        );
        let data = [b'l', 0xFF, 0xFF, 0xFF, 0xFF];
        assert!(matches!(
            ModelNode::from_bytes(&data).unwrap_err(),
            DecodeError::NegativeLength { len: -1, .. }
        ));
    }

    #[test]
    fn test_depth_limit() {
        let mut node = ModelNode::new();
        {
            let mut current = &mut node;
            for _ in 0..5 {
                current = current.get_or_create(0).unwrap();
            }
        }
        let bytes = node.to_bytes().unwrap();
        let options = DecodeOptions::new().with_max_depth(4);
        assert_eq!(
            ModelNode::from_bytes_with_options(&bytes, &options).unwrap_err(),
            DecodeError::DepthExceeded { max: 4 }
        );
        let options = DecodeOptions::new().with_max_depth(5);
        assert!(ModelNode::from_bytes_with_options(&bytes, &options).is_ok());
    }

    #[test]
    fn test_bytes_limit() {
        let node = ModelNode::from(vec![0u8; 32]);
        let bytes = node.to_bytes().unwrap();
        let options = DecodeOptions::new().with_max_bytes_len(16);
        assert!(matches!(
            ModelNode::from_bytes_with_options(&bytes, &options).unwrap_err(),
            DecodeError::LengthExceedsLimit { field: "bytes", .. }
        ));
    }

    #[test]
    fn test_decoded_node_is_unprotected() {
        let mut node = ModelNode::new();
        node.get_or_create("a").unwrap().set(1).unwrap();
        node.protect();
        let mut decoded = ModelNode::from_bytes(&node.to_bytes().unwrap()).unwrap();
        assert!(!decoded.is_protected());
        decoded.get_or_create("a").unwrap().set(2).unwrap();
    }

    #[test]
    fn test_base64() {
        let node = ModelNode::from(1);
        assert_eq!(node.to_base64().unwrap(), "SQAAAAE=");
        assert_eq!(ModelNode::from_base64("SQAAAAE=").unwrap(), node);
        assert!(matches!(
            ModelNode::from_base64("not base64!").unwrap_err(),
            DecodeError::InvalidBase64(_)
        ));
    }

    #[test]
    fn test_long_string_roundtrip() {
        let node = ModelNode::from("x".repeat(70_000));
        let bytes = node.to_bytes().unwrap();
        assert_eq!(bytes[0], b'S');
        assert_eq!(&bytes[1..5], &70_000i32.to_be_bytes());
        assert_eq!(bytes.len(), 5 + 70_000);
        assert_eq!(ModelNode::from_bytes(&bytes).unwrap(), node);

        // Modified UTF-8 length decides, not the character count.
        let node = ModelNode::from("\u{e9}".repeat(40_000));
        let bytes = node.to_bytes().unwrap();
        assert_eq!(bytes[0], b'S');
        assert_eq!(ModelNode::from_base64(&node.to_base64().unwrap()).unwrap(), node);

        let fits = ModelNode::from("x".repeat(MAX_UTF_LEN));
        assert_eq!(fits.to_bytes().unwrap()[0], b's');
    }

    #[test]
    fn test_big_decimal_scale_follows_unscaled_bytes() {
        let decimal: BigDecimal = "-12.345".parse().unwrap();
        let bytes = ModelNode::from(decimal.clone()).to_bytes().unwrap();
        // -12345 = 0xCFC7
        assert_eq!(bytes, &[b'd', 0, 0, 0, 2, 0xCF, 0xC7, 0, 0, 0, 3]);
        assert_eq!(ModelNode::from_bytes(&bytes).unwrap(), ModelNode::from(decimal));
    }
}
