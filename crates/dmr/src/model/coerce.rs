//! The coercion matrix: converting a stored value to a requested type.
//!
//! Every `as_*` request dispatches on the stored variant. Numeric kinds
//! convert between each other directly, strings are parsed, collections
//! report their size, and any pair without an entry fails with
//! [`ModelError::NoConversion`].

use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive, Zero};

use crate::error::ModelError;
use crate::model::value::ModelValue;
use crate::model::{ModelNode, ModelType, Property};

fn no_conversion(from: &ModelValue, to: ModelType) -> ModelError {
    match from {
        ModelValue::Undefined => ModelError::UndefinedValue { to },
        other => ModelError::NoConversion {
            from: other.model_type(),
            to,
        },
    }
}

fn invalid_format(to: ModelType, value: &str) -> ModelError {
    ModelError::InvalidFormat {
        to,
        value: value.to_string(),
    }
}

fn out_of_range(to: ModelType, value: impl ToString) -> ModelError {
    ModelError::OutOfRange {
        to,
        value: value.to_string(),
    }
}

/// Reads the trailing `N` bytes as a big-endian unsigned number.
fn trailing_be(bytes: &[u8], n: usize) -> u64 {
    let start = bytes.len().saturating_sub(n);
    bytes[start..]
        .iter()
        .fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
}

/// Renders a double in the management text form.
///
/// Magnitudes in `[1e-3, 1e7)` and zero are plain decimals (`1.0`, `0.001`).
/// Everything else uses scientific notation with an upper-case exponent and
/// at least one fractional digit (`1.0E20`, `1.5E-7`).
pub(crate) fn format_double(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let magnitude = value.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        return format!("{value:?}");
    }
    let scientific = format!("{value:e}");
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    if mantissa.contains('.') {
        format!("{mantissa}E{exponent}")
    } else {
        format!("{mantissa}.0E{exponent}")
    }
}

impl ModelValue {
    pub(crate) fn as_long(&self) -> Result<i64, ModelError> {
        match self {
            ModelValue::Boolean(v) => Ok(i64::from(*v)),
            ModelValue::Int(v) => Ok(i64::from(*v)),
            ModelValue::Long(v) => Ok(*v),
            // Saturating, NaN becomes zero.
            ModelValue::Double(v) => Ok(*v as i64),
            ModelValue::BigInteger(v) => v
                .to_i64()
                .ok_or_else(|| out_of_range(ModelType::Long, v)),
            ModelValue::BigDecimal(v) => v
                .with_scale(0)
                .to_i64()
                .ok_or_else(|| out_of_range(ModelType::Long, v)),
            ModelValue::Bytes(bytes) => Ok(trailing_be(bytes, 8) as i64),
            ModelValue::String(s) | ModelValue::Expression(s) => {
                s.parse().map_err(|_| invalid_format(ModelType::Long, s))
            }
            _ => match self.child_count() {
                Some(count) => Ok(count as i64),
                None => Err(no_conversion(self, ModelType::Long)),
            },
        }
    }

    pub(crate) fn as_int(&self) -> Result<i32, ModelError> {
        match self {
            ModelValue::Boolean(v) => Ok(i32::from(*v)),
            ModelValue::Int(v) => Ok(*v),
            // Two's complement truncation.
            ModelValue::Long(v) => Ok(*v as i32),
            ModelValue::Double(v) => Ok(*v as i32),
            ModelValue::BigInteger(v) => v
                .to_i32()
                .ok_or_else(|| out_of_range(ModelType::Int, v)),
            ModelValue::BigDecimal(v) => v
                .with_scale(0)
                .to_i32()
                .ok_or_else(|| out_of_range(ModelType::Int, v)),
            ModelValue::Bytes(bytes) => Ok(trailing_be(bytes, 4) as u32 as i32),
            ModelValue::String(s) | ModelValue::Expression(s) => {
                s.parse().map_err(|_| invalid_format(ModelType::Int, s))
            }
            _ => match self.child_count() {
                Some(count) => i32::try_from(count).map_err(|_| out_of_range(ModelType::Int, count)),
                None => Err(no_conversion(self, ModelType::Int)),
            },
        }
    }

    pub(crate) fn as_double(&self) -> Result<f64, ModelError> {
        match self {
            ModelValue::Boolean(v) => Ok(if *v { 1.0 } else { 0.0 }),
            ModelValue::Int(v) => Ok(f64::from(*v)),
            ModelValue::Long(v) => Ok(*v as f64),
            ModelValue::Double(v) => Ok(*v),
            ModelValue::BigInteger(v) => v
                .to_f64()
                .ok_or_else(|| out_of_range(ModelType::Double, v)),
            ModelValue::BigDecimal(v) => v
                .to_f64()
                .ok_or_else(|| out_of_range(ModelType::Double, v)),
            ModelValue::Bytes(bytes) => Ok(f64::from_bits(trailing_be(bytes, 8))),
            ModelValue::String(s) | ModelValue::Expression(s) => {
                s.parse().map_err(|_| invalid_format(ModelType::Double, s))
            }
            _ => match self.child_count() {
                Some(count) => Ok(count as f64),
                None => Err(no_conversion(self, ModelType::Double)),
            },
        }
    }

    pub(crate) fn as_boolean(&self) -> Result<bool, ModelError> {
        match self {
            ModelValue::Boolean(v) => Ok(*v),
            ModelValue::Int(v) => Ok(*v != 0),
            ModelValue::Long(v) => Ok(*v != 0),
            ModelValue::Double(v) => Ok(*v != 0.0),
            ModelValue::BigInteger(v) => Ok(!v.is_zero()),
            ModelValue::BigDecimal(v) => Ok(!v.is_zero()),
            ModelValue::Bytes(bytes) => Ok(bytes.iter().any(|b| *b != 0)),
            ModelValue::String(s) | ModelValue::Expression(s) => {
                if s.eq_ignore_ascii_case("true") {
                    Ok(true)
                } else if s.eq_ignore_ascii_case("false") {
                    Ok(false)
                } else {
                    Err(invalid_format(ModelType::Boolean, s))
                }
            }
            _ => match self.child_count() {
                Some(count) => Ok(count != 0),
                None => Err(no_conversion(self, ModelType::Boolean)),
            },
        }
    }

    /// Never fails: undefined renders as `"undefined"` and collections as
    /// their compact text form.
    pub(crate) fn as_string(&self) -> String {
        match self {
            ModelValue::Undefined => "undefined".to_string(),
            ModelValue::Boolean(v) => v.to_string(),
            ModelValue::Int(v) => v.to_string(),
            ModelValue::Long(v) => v.to_string(),
            ModelValue::Double(v) => format_double(*v),
            ModelValue::BigInteger(v) => v.to_string(),
            ModelValue::BigDecimal(v) => v.to_string(),
            ModelValue::String(s) | ModelValue::Expression(s) => s.clone(),
            ModelValue::Type(t) => t.name().to_string(),
            ModelValue::Bytes(_)
            | ModelValue::List(_)
            | ModelValue::Object(_)
            | ModelValue::Property(_) => crate::codec::text::format_value(self, false),
        }
    }

    pub(crate) fn as_big_integer(&self) -> Result<BigInt, ModelError> {
        match self {
            ModelValue::Boolean(v) => Ok(BigInt::from(u8::from(*v))),
            ModelValue::Int(v) => Ok(BigInt::from(*v)),
            ModelValue::Long(v) => Ok(BigInt::from(*v)),
            ModelValue::Double(v) => {
                BigInt::from_f64(*v).ok_or_else(|| out_of_range(ModelType::BigInteger, format_double(*v)))
            }
            ModelValue::BigInteger(v) => Ok(v.clone()),
            ModelValue::BigDecimal(v) => Ok(v.with_scale(0).into_bigint_and_exponent().0),
            ModelValue::Bytes(bytes) => Ok(BigInt::from_signed_bytes_be(bytes)),
            ModelValue::String(s) | ModelValue::Expression(s) => {
                s.parse().map_err(|_| invalid_format(ModelType::BigInteger, s))
            }
            _ => match self.child_count() {
                Some(count) => Ok(BigInt::from(count)),
                None => Err(no_conversion(self, ModelType::BigInteger)),
            },
        }
    }

    pub(crate) fn as_big_decimal(&self) -> Result<BigDecimal, ModelError> {
        match self {
            ModelValue::Boolean(v) => Ok(BigDecimal::from(i32::from(*v))),
            ModelValue::Int(v) => Ok(BigDecimal::from(*v)),
            ModelValue::Long(v) => Ok(BigDecimal::from(*v)),
            ModelValue::Double(v) => BigDecimal::from_f64(*v)
                .ok_or_else(|| out_of_range(ModelType::BigDecimal, format_double(*v))),
            ModelValue::BigInteger(v) => Ok(BigDecimal::new(v.clone(), 0)),
            ModelValue::BigDecimal(v) => Ok(v.clone()),
            ModelValue::Bytes(bytes) => Ok(BigDecimal::new(BigInt::from_signed_bytes_be(bytes), 0)),
            ModelValue::String(s) | ModelValue::Expression(s) => {
                s.parse().map_err(|_| invalid_format(ModelType::BigDecimal, s))
            }
            _ => match self.child_count() {
                Some(count) => Ok(BigDecimal::from(count as u64)),
                None => Err(no_conversion(self, ModelType::BigDecimal)),
            },
        }
    }

    pub(crate) fn as_bytes(&self) -> Result<Vec<u8>, ModelError> {
        match self {
            ModelValue::Boolean(v) => Ok(vec![u8::from(*v)]),
            ModelValue::Int(v) => Ok(v.to_be_bytes().to_vec()),
            ModelValue::Long(v) => Ok(v.to_be_bytes().to_vec()),
            ModelValue::Double(v) => Ok(v.to_bits().to_be_bytes().to_vec()),
            ModelValue::BigInteger(v) => Ok(v.to_signed_bytes_be()),
            ModelValue::BigDecimal(v) => {
                let (unscaled, scale) = v.as_bigint_and_exponent();
                let scale = i32::try_from(scale).map_err(|_| out_of_range(ModelType::Bytes, v))?;
                let mut bytes = unscaled.to_signed_bytes_be();
                bytes.extend_from_slice(&scale.to_be_bytes());
                Ok(bytes)
            }
            ModelValue::Bytes(bytes) => Ok(bytes.clone()),
            ModelValue::String(s) | ModelValue::Expression(s) => Ok(s.as_bytes().to_vec()),
            _ => Err(no_conversion(self, ModelType::Bytes)),
        }
    }

    pub(crate) fn as_type(&self) -> Result<ModelType, ModelError> {
        match self {
            ModelValue::Type(t) => Ok(*t),
            ModelValue::String(s) | ModelValue::Expression(s) => {
                s.parse().map_err(|_| invalid_format(ModelType::Type, s))
            }
            _ => Err(no_conversion(self, ModelType::Type)),
        }
    }

    pub(crate) fn as_property(&self) -> Result<Property, ModelError> {
        match self {
            ModelValue::Property(property) => Ok(Property::clone(property)),
            ModelValue::List(list) if list.len() == 2 => {
                Ok(Property::new(list[0].as_string(), list[1].clone()))
            }
            ModelValue::Object(map) if map.len() == 1 => {
                let (name, value) = map.first().ok_or_else(|| no_conversion(self, ModelType::Property))?;
                Ok(Property::new(name.clone(), value.clone()))
            }
            _ => Err(no_conversion(self, ModelType::Property)),
        }
    }

    /// Object entries in insertion order; a list is read as property entries
    /// and `(key, value)` pairs of consecutive non-property entries.
    pub(crate) fn as_property_list(&self) -> Result<Vec<Property>, ModelError> {
        match self {
            ModelValue::Object(map) => Ok(map
                .iter()
                .map(|(name, value)| Property::new(name.clone(), value.clone()))
                .collect()),
            ModelValue::Property(property) => Ok(vec![Property::clone(property)]),
            ModelValue::List(list) => {
                let mut properties = Vec::with_capacity(list.len());
                let mut iter = list.iter();
                while let Some(node) = iter.next() {
                    if let ModelValue::Property(property) = &node.value {
                        properties.push(Property::clone(property));
                    } else if let Some(value) = iter.next() {
                        properties.push(Property::new(node.as_string(), value.clone()));
                    }
                }
                Ok(properties)
            }
            _ => Err(no_conversion(self, ModelType::Property)),
        }
    }

    /// Returns a fresh object node. Duplicate keys from a list keep the last value.
    pub(crate) fn as_object(&self) -> Result<ModelNode, ModelError> {
        match self {
            ModelValue::Object(_) => Ok(ModelNode::from_value(self.clone())),
            ModelValue::Property(_) | ModelValue::List(_) => {
                let map: IndexMap<String, ModelNode> = self
                    .as_property_list()?
                    .into_iter()
                    .map(Property::into_parts)
                    .collect();
                Ok(ModelNode::from_value(ModelValue::Object(map)))
            }
            _ => Err(no_conversion(self, ModelType::Object)),
        }
    }

    pub(crate) fn as_list(&self) -> Result<Vec<ModelNode>, ModelError> {
        match self {
            ModelValue::List(list) => Ok(list.clone()),
            ModelValue::Object(map) => Ok(map
                .iter()
                .map(|(name, value)| ModelNode::from(Property::new(name.clone(), value.clone())))
                .collect()),
            ModelValue::Property(property) => Ok(vec![ModelNode::from(Property::clone(property))]),
            _ => Err(no_conversion(self, ModelType::List)),
        }
    }

    /// Generic dispatch over the `as_*` family.
    ///
    /// Returns `None` for [`ModelType::Undefined`], otherwise a fresh value
    /// of the requested type.
    pub(crate) fn coerce(&self, target: ModelType) -> Result<Option<ModelValue>, ModelError> {
        let value = match target {
            ModelType::Undefined => return Ok(None),
            ModelType::Boolean => ModelValue::Boolean(self.as_boolean()?),
            ModelType::Int => ModelValue::Int(self.as_int()?),
            ModelType::Long => ModelValue::Long(self.as_long()?),
            ModelType::Double => ModelValue::Double(self.as_double()?),
            ModelType::BigInteger => ModelValue::BigInteger(self.as_big_integer()?),
            ModelType::BigDecimal => ModelValue::BigDecimal(self.as_big_decimal()?),
            ModelType::Bytes => ModelValue::Bytes(self.as_bytes()?),
            ModelType::String => ModelValue::String(self.as_string()),
            ModelType::Expression => ModelValue::Expression(self.as_string()),
            ModelType::Type => ModelValue::Type(self.as_type()?),
            ModelType::List => ModelValue::List(self.as_list()?),
            ModelType::Object => self.as_object()?.value,
            ModelType::Property => ModelValue::Property(Box::new(self.as_property()?)),
        };
        Ok(Some(value))
    }
}
