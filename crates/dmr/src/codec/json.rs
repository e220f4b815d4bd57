//! JSON export.
//!
//! One-way projection of a model tree: objects keep insertion order, a
//! property becomes a single-entry object, undefined becomes `null`. Values
//! without a JSON counterpart (bytes, big numbers, expressions, types,
//! non-finite doubles) are written as their quoted string form.
//!
//! [`ModelNode`] implements [`serde::Serialize`] with this mapping, so it can
//! be handed to any serde serializer. [`ModelNode::to_json_string`] renders
//! it with `serde_json`.

use std::fmt;
use std::io;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::ser::{CompactFormatter, Formatter, PrettyFormatter};

use crate::model::ModelNode;
use crate::model::value::ModelValue;

const INDENT: &[u8] = b"    ";

impl Serialize for ModelNode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.value.serialize(serializer)
    }
}

impl Serialize for ModelValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ModelValue::Undefined => serializer.serialize_unit(),
            ModelValue::Boolean(v) => serializer.serialize_bool(*v),
            ModelValue::Int(v) => serializer.serialize_i32(*v),
            ModelValue::Long(v) => serializer.serialize_i64(*v),
            ModelValue::Double(v) if v.is_finite() => serializer.serialize_f64(*v),
            ModelValue::String(s) => serializer.serialize_str(s),
            ModelValue::List(list) => {
                let mut seq = serializer.serialize_seq(Some(list.len()))?;
                for child in list {
                    seq.serialize_element(child)?;
                }
                seq.end()
            }
            ModelValue::Object(map) => {
                let mut entries = serializer.serialize_map(Some(map.len()))?;
                for (key, child) in map {
                    entries.serialize_entry(key, child)?;
                }
                entries.end()
            }
            ModelValue::Property(property) => {
                let mut entries = serializer.serialize_map(Some(1))?;
                entries.serialize_entry(&property.name, &property.value)?;
                entries.end()
            }
            other => serializer.serialize_str(&other.as_string()),
        }
    }
}

/// Pretty layout: four-space indent and `"key" : value` members.
struct DmrPrettyFormatter<'a> {
    inner: PrettyFormatter<'a>,
}

impl DmrPrettyFormatter<'_> {
    fn new() -> Self {
        Self {
            inner: PrettyFormatter::with_indent(INDENT),
        }
    }
}

impl Formatter for DmrPrettyFormatter<'_> {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.inner.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.inner.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b" : ")
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object_value(writer)
    }
}

/// Adapts a `fmt::Formatter` to the `io::Write` that `serde_json` emits to.
struct FmtWriter<'a, 'b> {
    inner: &'a mut fmt::Formatter<'b>,
}

impl io::Write for FmtWriter<'_, '_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // serde_json only ever emits whole UTF-8 sequences.
        let s = std::str::from_utf8(buf).map_err(io::Error::other)?;
        self.inner.write_str(s).map_err(io::Error::other)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// JSON rendering of a node, see [`ModelNode::json`].
#[derive(Debug, Clone, Copy)]
pub struct Json<'a> {
    node: &'a ModelNode,
    compact: bool,
}

impl fmt::Display for Json<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let writer = FmtWriter { inner: f };
        let result = if self.compact {
            self.node
                .serialize(&mut serde_json::Serializer::with_formatter(writer, CompactFormatter))
        } else {
            self.node
                .serialize(&mut serde_json::Serializer::with_formatter(writer, DmrPrettyFormatter::new()))
        };
        result.map_err(|_| fmt::Error)
    }
}

impl ModelNode {
    /// Returns a `Display` adapter writing this node as JSON.
    pub fn json(&self, compact: bool) -> Json<'_> {
        Json {
            node: self,
            compact,
        }
    }

    /// Renders this node as JSON.
    ///
    /// Compact output is a single line with minimal separators. Otherwise
    /// every entry goes on its own line, indented four spaces per level.
    pub fn to_json_string(&self, compact: bool) -> String {
        self.json(compact).to_string()
    }
}

#[cfg(test)]
mod tests {
    use bigdecimal::BigDecimal;
    use num_bigint::BigInt;
    use proptest::prelude::*;
    use serde_json::{Value, json};

    use super::*;
    use crate::codec::binary::tests::arb_node;
    use crate::model::{ModelType, Property};

    fn parse(node: &ModelNode, compact: bool) -> Value {
        serde_json::from_str(&node.to_json_string(compact)).unwrap()
    }

    fn sample() -> ModelNode {
        let mut node = ModelNode::new();
        node.get_or_create("name").unwrap().set("x").unwrap();
        node.get_or_create("value").unwrap().set(1).unwrap();
        node.get_or_create("list").unwrap().add(true).unwrap().add(2.5).unwrap();
        node.get_or_create("missing").unwrap();
        node
    }

    #[test]
    fn test_compact_layout() {
        assert_eq!(
            sample().to_json_string(true),
            r#"{"name":"x","value":1,"list":[true,2.5],"missing":null}"#
        );
    }

    #[test]
    fn test_pretty_layout() {
        let expected = "{\n    \"name\" : \"x\",\n    \"value\" : 1,\n    \"list\" : [\n        true,\n        2.5\n    ],\n    \"missing\" : null\n}";
        assert_eq!(sample().to_json_string(false), expected);
    }

    #[test]
    fn test_layouts_parse_to_same_value() {
        let expected = json!({"name": "x", "value": 1, "list": [true, 2.5], "missing": null});
        assert_eq!(parse(&sample(), true), expected);
        assert_eq!(parse(&sample(), false), expected);
    }

    #[test]
    fn test_empty_containers() {
        assert_eq!(ModelNode::empty_object().to_json_string(false), "{}");
        assert_eq!(ModelNode::empty_list().to_json_string(false), "[]");
    }

    #[test]
    fn test_property_is_single_entry_object() {
        let node = ModelNode::from(Property::new("k", 5i64));
        assert_eq!(node.to_json_string(true), r#"{"k":5}"#);
        assert_eq!(parse(&node, false), json!({"k": 5}));
    }

    #[test]
    fn test_quoted_scalars() {
        assert_eq!(ModelNode::from(BigInt::from(7)).to_json_string(true), r#""7""#);
        let decimal: BigDecimal = "2.50".parse().unwrap();
        assert_eq!(ModelNode::from(decimal).to_json_string(true), r#""2.50""#);
        assert_eq!(ModelNode::expression("${a}").to_json_string(true), r#""${a}""#);
        assert_eq!(ModelNode::from(ModelType::Int).to_json_string(true), r#""INT""#);
        assert_eq!(ModelNode::from(f64::INFINITY).to_json_string(true), r#""Infinity""#);
        assert_eq!(ModelNode::from(vec![1u8]).to_json_string(true), r#""bytes { 0x01 }""#);
    }

    #[test]
    fn test_serializes_through_serde() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value, json!({"name": "x", "value": 1, "list": [true, 2.5], "missing": null}));
        assert_eq!(sample().json(true).to_string(), sample().to_json_string(true));
    }

    #[test]
    fn test_escaping() {
        let node = ModelNode::from("a\"b\\c\nd\te\u{1}");
        assert_eq!(node.to_json_string(true), r#""a\"b\\c\nd\te\u0001""#);
        assert_eq!(parse(&node, true), json!("a\"b\\c\nd\te\u{1}"));
    }

    proptest! {
        #[test]
        fn prop_output_is_valid_json(node in arb_node()) {
            let compact: Value = serde_json::from_str(&node.to_json_string(true)).unwrap();
            let pretty: Value = serde_json::from_str(&node.to_json_string(false)).unwrap();
            prop_assert_eq!(compact, pretty);
        }
    }
}
