//! The value variants a model node can hold.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use num_bigint::BigInt;

use crate::model::{ChildKey, ModelNode, ModelType, Property};

/// Current value of a node. Structural variants own their children outright.
#[derive(Debug, Clone, Default)]
pub(crate) enum ModelValue {
    #[default]
    Undefined,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    BigInteger(BigInt),
    BigDecimal(BigDecimal),
    Bytes(Vec<u8>),
    String(String),
    Expression(String),
    Type(ModelType),
    List(Vec<ModelNode>),
    Object(IndexMap<String, ModelNode>),
    Property(Box<Property>),
}

impl ModelValue {
    /// Returns the type tag of this value.
    pub(crate) fn model_type(&self) -> ModelType {
        match self {
            ModelValue::Undefined => ModelType::Undefined,
            ModelValue::Boolean(_) => ModelType::Boolean,
            ModelValue::Int(_) => ModelType::Int,
            ModelValue::Long(_) => ModelType::Long,
            ModelValue::Double(_) => ModelType::Double,
            ModelValue::BigInteger(_) => ModelType::BigInteger,
            ModelValue::BigDecimal(_) => ModelType::BigDecimal,
            ModelValue::Bytes(_) => ModelType::Bytes,
            ModelValue::String(_) => ModelType::String,
            ModelValue::Expression(_) => ModelType::Expression,
            ModelValue::Type(_) => ModelType::Type,
            ModelValue::List(_) => ModelType::List,
            ModelValue::Object(_) => ModelType::Object,
            ModelValue::Property(_) => ModelType::Property,
        }
    }

    /// Protects every reachable child. Scalars are immutable already.
    pub(crate) fn protect(&mut self) {
        match self {
            ModelValue::List(list) => list.iter_mut().for_each(ModelNode::protect),
            ModelValue::Object(map) => map.values_mut().for_each(ModelNode::protect),
            ModelValue::Property(property) => property.value.protect(),
            _ => {}
        }
    }

    /// Clears the protection latch on every reachable child.
    pub(crate) fn release(&mut self) {
        match self {
            ModelValue::List(list) => list.iter_mut().for_each(ModelNode::release),
            ModelValue::Object(map) => map.values_mut().for_each(ModelNode::release),
            ModelValue::Property(property) => property.value.release(),
            _ => {}
        }
    }

    /// Number of direct children of a structural value.
    pub(crate) fn child_count(&self) -> Option<usize> {
        match self {
            ModelValue::List(list) => Some(list.len()),
            ModelValue::Object(map) => Some(map.len()),
            ModelValue::Property(_) => Some(1),
            _ => None,
        }
    }

    // =========================================================================
    // Structural access
    // =========================================================================

    /// Looks up an existing child.
    ///
    /// A property answers only to index `0` and to its own name.
    pub(crate) fn child(&self, key: ChildKey<'_>) -> Option<&ModelNode> {
        match (self, key) {
            (ModelValue::List(list), ChildKey::Index(index)) => list.get(index),
            (ModelValue::Object(map), ChildKey::Name(name)) => map.get(name),
            (ModelValue::Property(property), ChildKey::Index(0)) => Some(&property.value),
            (ModelValue::Property(property), ChildKey::Name(name)) if property.name == name => {
                Some(&property.value)
            }
            _ => None,
        }
    }

    /// Mutable variant of [`child`](Self::child).
    pub(crate) fn child_mut(&mut self, key: ChildKey<'_>) -> Option<&mut ModelNode> {
        match (self, key) {
            (ModelValue::List(list), ChildKey::Index(index)) => list.get_mut(index),
            (ModelValue::Object(map), ChildKey::Name(name)) => map.get_mut(name),
            (ModelValue::Property(property), ChildKey::Index(0)) => Some(&mut property.value),
            (ModelValue::Property(property), ChildKey::Name(name)) if property.name == name => {
                Some(&mut property.value)
            }
            _ => None,
        }
    }

    /// Returns true if this value can create a child at `key`.
    ///
    /// Lists grow to any index and objects accept any name; a property only
    /// ever has its single existing child.
    pub(crate) fn can_host(&self, key: ChildKey<'_>) -> bool {
        matches!(
            (self, key),
            (ModelValue::List(_), ChildKey::Index(_)) | (ModelValue::Object(_), ChildKey::Name(_))
        )
    }

    /// Returns the child at `key`, creating it (and padding lists) if absent.
    ///
    /// Callers check [`can_host`](Self::can_host) and protection first.
    pub(crate) fn child_or_insert(&mut self, key: ChildKey<'_>) -> Option<&mut ModelNode> {
        match (self, key) {
            (ModelValue::List(list), ChildKey::Index(index)) => {
                if index >= list.len() {
                    list.resize_with(index + 1, ModelNode::new);
                }
                list.get_mut(index)
            }
            (ModelValue::Object(map), ChildKey::Name(name)) => {
                Some(map.entry(name.to_string()).or_default())
            }
            (value, key) => value.child_mut(key),
        }
    }
}

impl PartialEq for ModelValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ModelValue::Undefined, ModelValue::Undefined) => true,
            (ModelValue::Boolean(a), ModelValue::Boolean(b)) => a == b,
            (ModelValue::Int(a), ModelValue::Int(b)) => a == b,
            (ModelValue::Long(a), ModelValue::Long(b)) => a == b,
            // Bitwise, so that NaN equals itself and equality agrees with hashing.
            (ModelValue::Double(a), ModelValue::Double(b)) => a.to_bits() == b.to_bits(),
            (ModelValue::BigInteger(a), ModelValue::BigInteger(b)) => a == b,
            (ModelValue::BigDecimal(a), ModelValue::BigDecimal(b)) => a == b,
            (ModelValue::Bytes(a), ModelValue::Bytes(b)) => a == b,
            (ModelValue::String(a), ModelValue::String(b)) => a == b,
            (ModelValue::Expression(a), ModelValue::Expression(b)) => a == b,
            (ModelValue::Type(a), ModelValue::Type(b)) => a == b,
            (ModelValue::List(a), ModelValue::List(b)) => a == b,
            (ModelValue::Object(a), ModelValue::Object(b)) => a == b,
            (ModelValue::Property(a), ModelValue::Property(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ModelValue {}

impl Hash for ModelValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.model_type().hash(state);
        match self {
            ModelValue::Undefined => {}
            ModelValue::Boolean(v) => v.hash(state),
            ModelValue::Int(v) => v.hash(state),
            ModelValue::Long(v) => v.hash(state),
            ModelValue::Double(v) => v.to_bits().hash(state),
            ModelValue::BigInteger(v) => v.hash(state),
            ModelValue::BigDecimal(v) => v.hash(state),
            ModelValue::Bytes(v) => v.hash(state),
            ModelValue::String(v) | ModelValue::Expression(v) => v.hash(state),
            ModelValue::Type(v) => v.hash(state),
            ModelValue::List(list) => list.hash(state),
            ModelValue::Object(map) => {
                // Object equality ignores entry order, so the hash must too.
                let combined = map.iter().fold(0u64, |acc, entry| {
                    let mut hasher = DefaultHasher::new();
                    entry.hash(&mut hasher);
                    acc.wrapping_add(hasher.finish())
                });
                map.len().hash(state);
                combined.hash(state);
            }
            ModelValue::Property(property) => property.hash(state),
        }
    }
}
