//! DMR text rendering.
//!
//! The human-readable notation used by `Display` and by the string
//! coercion of collections: `{"a" => 1L, "b" => [true]}` style, either on
//! one line or indented four spaces per level.

use std::fmt;

use crate::model::value::ModelValue;
use crate::model::{ModelNode, format_double};

const INDENT: &str = "    ";

/// Renders a value as DMR text.
pub(crate) fn format_value(value: &ModelValue, multi_line: bool) -> String {
    let mut out = String::new();
    write_value(&mut out, value, 0, multi_line);
    out
}

fn write_value(out: &mut String, value: &ModelValue, level: usize, multi_line: bool) {
    match value {
        ModelValue::Undefined => out.push_str("undefined"),
        ModelValue::Boolean(v) => out.push_str(if *v { "true" } else { "false" }),
        ModelValue::Int(v) => out.push_str(&v.to_string()),
        ModelValue::Long(v) => {
            out.push_str(&v.to_string());
            out.push('L');
        }
        ModelValue::Double(v) => out.push_str(&format_double(*v)),
        ModelValue::BigInteger(v) => {
            out.push_str("big integer ");
            out.push_str(&v.to_string());
        }
        ModelValue::BigDecimal(v) => {
            out.push_str("big decimal ");
            out.push_str(&v.to_string());
        }
        ModelValue::Bytes(bytes) => write_bytes(out, bytes),
        ModelValue::String(s) => write_quoted(out, s),
        ModelValue::Expression(s) => {
            out.push_str("expression ");
            write_quoted(out, s);
        }
        ModelValue::Type(t) => out.push_str(t.name()),
        ModelValue::List(list) => {
            let entries = list.iter().map(|child| (None, &child.value));
            write_entries(out, ('[', ']'), entries, level, multi_line);
        }
        ModelValue::Object(map) => {
            let entries = map.iter().map(|(key, child)| (Some(key.as_str()), &child.value));
            write_entries(out, ('{', '}'), entries, level, multi_line);
        }
        ModelValue::Property(property) => {
            out.push('(');
            write_quoted(out, &property.name);
            out.push_str(" => ");
            write_value(out, &property.value.value, level, multi_line);
            out.push(')');
        }
    }
}

fn write_entries<'a>(
    out: &mut String,
    (open, close): (char, char),
    entries: impl ExactSizeIterator<Item = (Option<&'a str>, &'a ModelValue)>,
    level: usize,
    multi_line: bool,
) {
    out.push(open);
    if entries.len() == 0 {
        out.push(close);
        return;
    }
    for (i, (key, value)) in entries.enumerate() {
        if i > 0 {
            out.push(',');
        }
        if multi_line {
            newline(out, level + 1);
        }
        if let Some(key) = key {
            write_quoted(out, key);
            out.push_str(" => ");
        }
        write_value(out, value, level + 1, multi_line);
    }
    if multi_line {
        newline(out, level);
    }
    out.push(close);
}

fn write_bytes(out: &mut String, bytes: &[u8]) {
    if bytes.is_empty() {
        out.push_str("bytes {}");
        return;
    }
    out.push_str("bytes { ");
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&format!("0x{b:02x}"));
    }
    out.push_str(" }");
}

fn write_quoted(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
}

fn newline(out: &mut String, level: usize) {
    out.push('\n');
    for _ in 0..level {
        out.push_str(INDENT);
    }
}

impl ModelNode {
    /// Renders this node as DMR text, on one line when `compact`.
    pub fn to_dmr_string(&self, compact: bool) -> String {
        format_value(&self.value, !compact)
    }
}

/// Multi-line DMR text.
impl fmt::Display for ModelNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_value(&self.value, true))
    }
}

#[cfg(test)]
mod tests {
    use bigdecimal::BigDecimal;
    use num_bigint::BigInt;

    use super::*;
    use crate::model::{ModelType, Property};

    #[test]
    fn test_scalar_literals() {
        assert_eq!(ModelNode::new().to_string(), "undefined");
        assert_eq!(ModelNode::from(true).to_string(), "true");
        assert_eq!(ModelNode::from(1).to_string(), "1");
        assert_eq!(ModelNode::from(1i64).to_string(), "1L");
        assert_eq!(ModelNode::from(1.0).to_string(), "1.0");
        assert_eq!(ModelNode::from(f64::NAN).to_string(), "NaN");
        assert_eq!(ModelNode::from(BigInt::from(12)).to_string(), "big integer 12");
        let decimal: BigDecimal = "1.5".parse().unwrap();
        assert_eq!(ModelNode::from(decimal).to_string(), "big decimal 1.5");
        assert_eq!(ModelNode::from(vec![1u8, 0xAB]).to_string(), "bytes { 0x01, 0xab }");
        assert_eq!(ModelNode::from(Vec::<u8>::new()).to_string(), "bytes {}");
        assert_eq!(ModelNode::from("say \"hi\"\\").to_string(), r#""say \"hi\"\\""#);
        assert_eq!(ModelNode::expression("${x}").to_string(), "expression \"${x}\"");
        assert_eq!(ModelNode::from(ModelType::BigDecimal).to_string(), "BIG_DECIMAL");
    }

    #[test]
    fn test_compact_collections() {
        let mut node = ModelNode::new();
        node.get_or_create("a").unwrap().set(1i64).unwrap();
        node.get_or_create("b").unwrap().add(true).unwrap().add("x").unwrap();
        node.get_or_create("c").unwrap().set_property("p", 2).unwrap();
        node.get_or_create("d").unwrap().set_empty_list().unwrap();
        assert_eq!(
            node.to_dmr_string(true),
            r#"{"a" => 1L,"b" => [true,"x"],"c" => ("p" => 2),"d" => []}"#
        );
    }

    #[test]
    fn test_multi_line_layout() {
        let mut node = ModelNode::new();
        node.get_or_create("outcome").unwrap().set("success").unwrap();
        node.get_or_create("result").unwrap().add(1).unwrap().add(2).unwrap();
        node.get_or_create("empty").unwrap().set_empty_object().unwrap();
        let expected = "{\n    \"outcome\" => \"success\",\n    \"result\" => [\n        1,\n        2\n    ],\n    \"empty\" => {}\n}";
        assert_eq!(node.to_string(), expected);
    }

    #[test]
    fn test_property_layout() {
        let mut inner = ModelNode::new();
        inner.add(1).unwrap();
        let node = ModelNode::from(Property::new("k", inner));
        assert_eq!(node.to_dmr_string(true), r#"("k" => [1])"#);
        assert_eq!(node.to_string(), "(\"k\" => [\n    1\n])");
    }

    #[test]
    fn test_collection_as_string_is_compact() {
        let mut node = ModelNode::new();
        node.add(1).unwrap().add(2).unwrap();
        assert_eq!(node.as_string(), "[1,2]");
    }
}
