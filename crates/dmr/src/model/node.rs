//! The model node: a mutable cell holding exactly one value.
//!
//! # Reads versus writes
//!
//! Child access comes in two flavours. [`ModelNode::get`] and
//! [`ModelNode::require`] are pure reads. [`ModelNode::get_or_create`]
//! auto-vivifies: an undefined node first becomes an object (for a name) or
//! a list (for an index), and a missing child is created as undefined.
//!
//! # Protection
//!
//! [`ModelNode::protect`] latches a node and its whole subtree read-only.
//! Every write, including handing out mutable access to children, fails
//! afterwards with [`ModelError::Protected`]. [`Clone`] always produces an
//! unprotected deep copy.

use std::hash::{Hash, Hasher};

use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use num_bigint::BigInt;

use crate::error::ModelError;
use crate::model::value::ModelValue;
use crate::model::{ChildKey, Expression, Key, ModelType, Property};

/// Child key carrying the outcome of a management operation.
pub const OUTCOME: &str = "outcome";
/// Outcome value of a successful management operation.
pub const SUCCESS: &str = "success";
/// Child key carrying the failure description of a management operation.
pub const FAILURE_DESCRIPTION: &str = "failure-description";

const NO_FAILURE_DESCRIPTION: &str = "No failure-description provided";

/// A node in a dynamic model tree.
///
/// # Example
///
/// ```rust
/// use dmr::ModelNode;
///
/// let mut node = ModelNode::new();
/// node.get_or_create("a")?.get_or_create("b")?.set("x")?;
///
/// assert!(node.has_defined_path(&["a", "b"]));
/// assert_eq!(node.get_path(&["a", "b"]).unwrap().as_string(), "x");
/// # Ok::<(), dmr::ModelError>(())
/// ```
#[derive(Debug, Default)]
pub struct ModelNode {
    protected: bool,
    pub(crate) value: ModelValue,
}

impl ModelNode {
    /// Creates an undefined node.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_value(value: ModelValue) -> Self {
        Self {
            protected: false,
            value,
        }
    }

    /// Creates an expression node.
    pub fn expression(expression: impl Into<String>) -> Self {
        Self::from_value(ModelValue::Expression(expression.into()))
    }

    /// Creates an empty list node.
    pub fn empty_list() -> Self {
        Self::from_value(ModelValue::List(Vec::new()))
    }

    /// Creates an empty object node.
    pub fn empty_object() -> Self {
        Self::from_value(ModelValue::Object(IndexMap::new()))
    }

    /// Returns the type of the current value.
    pub fn get_type(&self) -> ModelType {
        self.value.model_type()
    }

    /// Returns true unless the node is undefined.
    pub fn is_defined(&self) -> bool {
        !matches!(self.value, ModelValue::Undefined)
    }

    // =========================================================================
    // Protection
    // =========================================================================

    /// Makes this node and its whole subtree read-only. Idempotent.
    pub fn protect(&mut self) {
        if !self.protected {
            self.protected = true;
            self.value.protect();
        }
    }

    /// Returns true if [`protect`](Self::protect) has been called on this node
    /// or one of its ancestors.
    pub fn is_protected(&self) -> bool {
        self.protected
    }

    pub(crate) fn release(&mut self) {
        self.protected = false;
        self.value.release();
    }

    /// Returns this node with the protection latch cleared on the whole subtree.
    pub(crate) fn released(mut self) -> Self {
        self.release();
        self
    }

    fn check_protect(&self) -> Result<(), ModelError> {
        if self.protected {
            tracing::debug!(model_type = %self.get_type(), "rejected write to protected node");
            return Err(ModelError::Protected);
        }
        Ok(())
    }

    fn replace(&mut self, value: ModelValue) -> Result<&mut Self, ModelError> {
        self.check_protect()?;
        self.value = value;
        Ok(self)
    }

    // =========================================================================
    // Setters
    // =========================================================================

    /// Replaces the current value.
    ///
    /// Passing a node moves its value in (a `&ModelNode` is deep-copied);
    /// the stored subtree is always unprotected.
    pub fn set(&mut self, value: impl Into<ModelNode>) -> Result<&mut Self, ModelError> {
        let node = value.into().released();
        self.replace(node.value)
    }

    /// Replaces the current value with an expression.
    pub fn set_expression(&mut self, expression: impl Into<String>) -> Result<&mut Self, ModelError> {
        self.replace(ModelValue::Expression(expression.into()))
    }

    /// Replaces the current value with a property.
    pub fn set_property(
        &mut self,
        name: impl Into<String>,
        value: impl Into<ModelNode>,
    ) -> Result<&mut Self, ModelError> {
        self.replace(ModelValue::Property(Box::new(Property::new(name, value))))
    }

    /// Replaces the current value with a list of the given nodes.
    pub fn set_list(&mut self, nodes: impl IntoIterator<Item = ModelNode>) -> Result<&mut Self, ModelError> {
        self.check_protect()?;
        let list = nodes.into_iter().map(ModelNode::released).collect();
        self.replace(ModelValue::List(list))
    }

    /// Replaces the current value with an empty list.
    pub fn set_empty_list(&mut self) -> Result<&mut Self, ModelError> {
        self.replace(ModelValue::List(Vec::new()))
    }

    /// Replaces the current value with an empty object.
    pub fn set_empty_object(&mut self) -> Result<&mut Self, ModelError> {
        self.replace(ModelValue::Object(IndexMap::new()))
    }

    /// Resets the node to undefined.
    pub fn clear(&mut self) -> Result<&mut Self, ModelError> {
        self.replace(ModelValue::Undefined)
    }

    // =========================================================================
    // Child access
    // =========================================================================

    /// Returns the existing child at `key`, never creating one.
    pub fn get<K: Key>(&self, key: K) -> Option<&ModelNode> {
        self.value.child(key.child_key())
    }

    /// Follows a path of names, never creating anything.
    pub fn get_path(&self, names: &[&str]) -> Option<&ModelNode> {
        names.iter().try_fold(self, |node, name| node.get(*name))
    }

    /// Returns the child at `key`, creating it if absent.
    ///
    /// An undefined node first becomes an object (name keys) or a list
    /// (index keys); a list is padded with undefined entries up to `index`.
    /// Fails if the node is protected or its type cannot host the key.
    pub fn get_or_create<K: Key>(&mut self, key: K) -> Result<&mut ModelNode, ModelError> {
        self.check_protect()?;
        let key = key.child_key();
        if !self.is_defined() {
            self.value = match key.container() {
                ModelType::List => ModelValue::List(Vec::new()),
                _ => ModelValue::Object(IndexMap::new()),
            };
        }
        let found = self.get_type();
        if self.value.child(key).is_none() && !self.value.can_host(key) {
            return Err(ModelError::Shape {
                found,
                key: key.to_string(),
            });
        }
        self.value
            .child_or_insert(key)
            .ok_or_else(|| ModelError::Shape {
                found,
                key: key.to_string(),
            })
    }

    /// Follows a path of names, creating every missing segment.
    pub fn get_or_create_path(&mut self, names: &[&str]) -> Result<&mut ModelNode, ModelError> {
        let mut current = self;
        for name in names {
            current = current.get_or_create(*name)?;
        }
        Ok(current)
    }

    /// Returns the child at `key`, failing if it is absent.
    pub fn require<K: Key>(&self, key: K) -> Result<&ModelNode, ModelError> {
        let key = key.child_key();
        self.value.child(key).ok_or_else(|| ModelError::NotFound {
            key: key.to_string(),
        })
    }

    /// Mutable variant of [`require`](Self::require). Fails on a protected node.
    pub fn require_mut<K: Key>(&mut self, key: K) -> Result<&mut ModelNode, ModelError> {
        self.check_protect()?;
        let key = key.child_key();
        self.value.child_mut(key).ok_or_else(|| ModelError::NotFound {
            key: key.to_string(),
        })
    }

    /// Removes and returns the child at `key`.
    ///
    /// An absent name yields `Ok(None)`; an absent index fails with
    /// [`ModelError::NotFound`].
    pub fn remove<K: Key>(&mut self, key: K) -> Result<Option<ModelNode>, ModelError> {
        self.check_protect()?;
        match (&mut self.value, key.child_key()) {
            (ModelValue::Object(map), ChildKey::Name(name)) => Ok(map.shift_remove(name)),
            (_, ChildKey::Name(_)) => Ok(None),
            (ModelValue::List(list), ChildKey::Index(index)) if index < list.len() => {
                Ok(Some(list.remove(index)))
            }
            (_, key @ ChildKey::Index(_)) => Err(ModelError::NotFound {
                key: key.to_string(),
            }),
        }
    }

    /// Returns true if a child exists at `key`.
    pub fn has<K: Key>(&self, key: K) -> bool {
        self.get(key).is_some()
    }

    /// Returns true if a defined child exists at `key`.
    pub fn has_defined<K: Key>(&self, key: K) -> bool {
        self.get(key).is_some_and(ModelNode::is_defined)
    }

    /// Returns true if every name along the path exists.
    pub fn has_path(&self, names: &[&str]) -> bool {
        self.get_path(names).is_some()
    }

    /// Returns true if every name along the path exists and is defined.
    pub fn has_defined_path(&self, names: &[&str]) -> bool {
        let mut current = self;
        for name in names {
            match current.get(*name) {
                Some(child) if child.is_defined() => current = child,
                _ => return false,
            }
        }
        true
    }

    /// Returns the names of an object's entries in insertion order, or the
    /// name of a property.
    pub fn keys(&self) -> Result<Vec<&str>, ModelError> {
        match &self.value {
            ModelValue::Object(map) => Ok(map.keys().map(String::as_str).collect()),
            ModelValue::Property(property) => Ok(vec![property.name.as_str()]),
            other => Err(ModelError::NoConversion {
                from: other.model_type(),
                to: ModelType::Object,
            }),
        }
    }

    // =========================================================================
    // List operations
    // =========================================================================

    fn list_mut(&mut self) -> Result<&mut Vec<ModelNode>, ModelError> {
        self.check_protect()?;
        if !self.is_defined() {
            self.value = ModelValue::List(Vec::new());
        }
        let found = self.get_type();
        match &mut self.value {
            ModelValue::List(list) => Ok(list),
            _ => Err(ModelError::Shape {
                found,
                key: "[]".to_string(),
            }),
        }
    }

    /// Appends an undefined child and returns it.
    pub fn add_child(&mut self) -> Result<&mut ModelNode, ModelError> {
        let list = self.list_mut()?;
        list.push(ModelNode::new());
        let last = list.len() - 1;
        Ok(&mut list[last])
    }

    /// Inserts an undefined child at `index` (`0..=len`) and returns it.
    ///
    /// A failed insert leaves the node unchanged.
    pub fn insert_child(&mut self, index: usize) -> Result<&mut ModelNode, ModelError> {
        let size = match &self.value {
            ModelValue::List(list) => list.len(),
            _ => 0,
        };
        if index > size && matches!(self.value, ModelValue::Undefined | ModelValue::List(_)) {
            self.check_protect()?;
            return Err(ModelError::IndexOutOfRange { index, size });
        }
        let list = self.list_mut()?;
        list.insert(index, ModelNode::new());
        Ok(&mut list[index])
    }

    /// Appends a value to this list.
    pub fn add(&mut self, value: impl Into<ModelNode>) -> Result<&mut Self, ModelError> {
        let node = value.into().released();
        self.list_mut()?.push(node);
        Ok(self)
    }

    /// Appends a property to this list.
    pub fn add_property(
        &mut self,
        name: impl Into<String>,
        value: impl Into<ModelNode>,
    ) -> Result<&mut Self, ModelError> {
        self.add(Property::new(name, value))
    }

    /// Inserts a value at `index` (`0..=len`).
    pub fn insert(&mut self, value: impl Into<ModelNode>, index: usize) -> Result<&mut Self, ModelError> {
        let node = value.into().released();
        *self.insert_child(index)? = node;
        Ok(self)
    }

    /// Appends an empty list and returns it.
    pub fn add_empty_list(&mut self) -> Result<&mut ModelNode, ModelError> {
        let child = self.add_child()?;
        child.value = ModelValue::List(Vec::new());
        Ok(child)
    }

    /// Appends an empty object and returns it.
    pub fn add_empty_object(&mut self) -> Result<&mut ModelNode, ModelError> {
        let child = self.add_child()?;
        child.value = ModelValue::Object(IndexMap::new());
        Ok(child)
    }

    // =========================================================================
    // Conversions
    // =========================================================================

    pub fn as_long(&self) -> Result<i64, ModelError> {
        self.value.as_long()
    }

    /// Returns `default` when undefined, otherwise [`as_long`](Self::as_long).
    pub fn as_long_or(&self, default: i64) -> Result<i64, ModelError> {
        if self.is_defined() { self.as_long() } else { Ok(default) }
    }

    pub fn as_int(&self) -> Result<i32, ModelError> {
        self.value.as_int()
    }

    pub fn as_int_or(&self, default: i32) -> Result<i32, ModelError> {
        if self.is_defined() { self.as_int() } else { Ok(default) }
    }

    pub fn as_double(&self) -> Result<f64, ModelError> {
        self.value.as_double()
    }

    pub fn as_double_or(&self, default: f64) -> Result<f64, ModelError> {
        if self.is_defined() { self.as_double() } else { Ok(default) }
    }

    pub fn as_boolean(&self) -> Result<bool, ModelError> {
        self.value.as_boolean()
    }

    pub fn as_boolean_or(&self, default: bool) -> Result<bool, ModelError> {
        if self.is_defined() { self.as_boolean() } else { Ok(default) }
    }

    /// Textual form of the value; an undefined node yields `"undefined"`.
    pub fn as_string(&self) -> String {
        self.value.as_string()
    }

    pub fn as_string_or(&self, default: &str) -> String {
        if self.is_defined() { self.as_string() } else { default.to_string() }
    }

    pub fn as_big_integer(&self) -> Result<BigInt, ModelError> {
        self.value.as_big_integer()
    }

    pub fn as_big_decimal(&self) -> Result<BigDecimal, ModelError> {
        self.value.as_big_decimal()
    }

    pub fn as_bytes(&self) -> Result<Vec<u8>, ModelError> {
        self.value.as_bytes()
    }

    pub fn as_type(&self) -> Result<ModelType, ModelError> {
        self.value.as_type()
    }

    /// Reads the node as a property.
    ///
    /// Lists must have exactly two entries (name, value) and objects exactly one entry.
    pub fn as_property(&self) -> Result<Property, ModelError> {
        self.value.as_property()
    }

    pub fn as_property_list(&self) -> Result<Vec<Property>, ModelError> {
        self.value.as_property_list()
    }

    pub fn as_object(&self) -> Result<ModelNode, ModelError> {
        self.value.as_object()
    }

    pub fn as_list(&self) -> Result<Vec<ModelNode>, ModelError> {
        self.value.as_list()
    }

    /// Converts to the requested type. `Undefined` yields `Ok(None)`.
    pub fn coerce(&self, target: ModelType) -> Result<Option<ModelNode>, ModelError> {
        Ok(self.value.coerce(target)?.map(ModelNode::from_value))
    }

    // =========================================================================
    // Operation results
    // =========================================================================

    /// True if the `outcome` child is defined and is not `"success"`.
    pub fn is_failure(&self) -> bool {
        self.get(OUTCOME)
            .is_some_and(|outcome| outcome.is_defined() && outcome.as_string() != SUCCESS)
    }

    /// Pretty JSON of the `failure-description` child, or a fixed message.
    pub fn failure_description(&self) -> String {
        match self.get(FAILURE_DESCRIPTION) {
            Some(description) if description.is_defined() => description.to_json_string(false),
            _ => NO_FAILURE_DESCRIPTION.to_string(),
        }
    }
}

impl Clone for ModelNode {
    /// Deep copy; the copy is never protected.
    fn clone(&self) -> Self {
        Self::from_value(self.value.clone())
    }
}

impl PartialEq for ModelNode {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for ModelNode {}

/// Hashes the current value. The hash changes whenever the value does, so
/// only protected nodes are suitable as map keys.
impl Hash for ModelNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

// =============================================================================
// CONVERSIONS INTO NODES
// =============================================================================

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for ModelNode {
                fn from(value: $ty) -> Self {
                    Self::from_value(ModelValue::$variant(value.into()))
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => Boolean,
    i32 => Int,
    i64 => Long,
    f64 => Double,
    BigInt => BigInteger,
    BigDecimal => BigDecimal,
    Vec<u8> => Bytes,
    &[u8] => Bytes,
    String => String,
    &str => String,
    &String => String,
    ModelType => Type,
}

impl From<Expression> for ModelNode {
    fn from(value: Expression) -> Self {
        Self::from_value(ModelValue::Expression(value.into_string()))
    }
}

impl From<Property> for ModelNode {
    fn from(value: Property) -> Self {
        Self::from_value(ModelValue::Property(Box::new(value)))
    }
}

impl From<Vec<ModelNode>> for ModelNode {
    fn from(value: Vec<ModelNode>) -> Self {
        Self::from_value(ModelValue::List(value.into_iter().map(ModelNode::released).collect()))
    }
}

impl From<&ModelNode> for ModelNode {
    fn from(value: &ModelNode) -> Self {
        value.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;

    use super::*;
    use crate::error::ErrorKind;

    fn hash_of(node: &ModelNode) -> u64 {
        let mut hasher = DefaultHasher::new();
        node.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_new_is_undefined() {
        let node = ModelNode::new();
        assert_eq!(node.get_type(), ModelType::Undefined);
        assert!(!node.is_defined());
        assert_eq!(node.as_string(), "undefined");
    }

    #[test]
    fn test_set_replaces_value() {
        let mut node = ModelNode::new();
        node.set(5).unwrap();
        assert_eq!(node.get_type(), ModelType::Int);
        node.set("text").unwrap();
        assert_eq!(node.get_type(), ModelType::String);
        node.set_expression("${x}").unwrap();
        assert_eq!(node.get_type(), ModelType::Expression);
        node.clear().unwrap();
        assert!(!node.is_defined());
    }

    #[test]
    fn test_auto_vivification_by_name() {
        let mut node = ModelNode::new();
        node.get_or_create("a").unwrap().get_or_create("b").unwrap().set("x").unwrap();
        assert_eq!(node.get_type(), ModelType::Object);
        assert!(node.has_defined_path(&["a", "b"]));
        assert_eq!(node.get_path(&["a", "b"]).unwrap().as_string(), "x");
    }

    #[test]
    fn test_auto_vivification_by_index_pads() {
        let mut node = ModelNode::new();
        node.get_or_create(2).unwrap().set(true).unwrap();
        assert_eq!(node.get_type(), ModelType::List);
        assert_eq!(node.as_long(), Ok(3));
        assert!(!node.has_defined(0));
        assert!(node.has_defined(2));
    }

    #[test]
    fn test_get_or_create_shape_errors() {
        let mut node = ModelNode::from("scalar");
        assert_eq!(node.get_or_create(0).unwrap_err().kind(), ErrorKind::Shape);
        assert_eq!(node.get_or_create("a").unwrap_err().kind(), ErrorKind::Shape);

        let mut list = ModelNode::empty_list();
        assert_eq!(list.get_or_create("a").unwrap_err().kind(), ErrorKind::Shape);

        let mut object = ModelNode::empty_object();
        assert_eq!(object.get_or_create(0).unwrap_err().kind(), ErrorKind::Shape);
    }

    #[test]
    fn test_property_children() {
        let mut node = ModelNode::new();
        node.set_property("name", 1).unwrap();
        assert_eq!(node.get(0), Some(&ModelNode::from(1)));
        assert_eq!(node.get("name"), Some(&ModelNode::from(1)));
        assert!(node.get(1).is_none());
        assert!(node.get("other").is_none());

        node.get_or_create("name").unwrap().set(2).unwrap();
        assert_eq!(node.require(0), Ok(&ModelNode::from(2)));
        assert_eq!(node.get_or_create("other").unwrap_err().kind(), ErrorKind::Shape);
        assert_eq!(node.get_or_create(1).unwrap_err().kind(), ErrorKind::Shape);
        assert_eq!(node.keys().unwrap(), vec!["name"]);
    }

    #[test]
    fn test_require_does_not_create() {
        let node = ModelNode::empty_object();
        let err = node.require("missing").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "no child at \"missing\"");
        assert!(!node.has("missing"));
    }

    #[test]
    fn test_has_never_vivifies() {
        let node = ModelNode::new();
        assert!(!node.has("a"));
        assert!(!node.has_path(&["a", "b"]));
        assert!(!node.has_defined_path(&["a"]));
        assert!(!node.is_defined());
    }

    #[test]
    fn test_has_path_short_circuits_on_undefined() {
        let mut node = ModelNode::new();
        node.get_or_create("a").unwrap();
        assert!(node.has_path(&["a"]));
        assert!(!node.has_defined_path(&["a"]));
        assert!(!node.has_path(&["a", "b"]));
    }

    #[test]
    fn test_remove() {
        let mut node = ModelNode::new();
        node.get_or_create("a").unwrap().set(1).unwrap();
        node.get_or_create("b").unwrap().set(2).unwrap();
        assert_eq!(node.remove("a").unwrap(), Some(ModelNode::from(1)));
        assert_eq!(node.remove("a").unwrap(), None);
        assert_eq!(node.keys().unwrap(), vec!["b"]);

        let mut list = ModelNode::new();
        list.add(1).unwrap().add(2).unwrap();
        assert_eq!(list.remove(0).unwrap(), Some(ModelNode::from(1)));
        assert_eq!(list.remove(5).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_add_and_insert() {
        let mut node = ModelNode::new();
        node.add(1).unwrap().add("two").unwrap();
        node.insert(0i64, 0).unwrap();
        node.insert(3.5, 3).unwrap();
        assert_eq!(node.as_int(), Ok(4));
        assert_eq!(node.require(0).unwrap().get_type(), ModelType::Long);
        assert_eq!(node.require(3).unwrap().as_double(), Ok(3.5));

        let err = node.insert(9, 6).unwrap_err();
        assert_eq!(err, ModelError::IndexOutOfRange { index: 6, size: 4 });
        assert_eq!(node.as_int(), Ok(4));
    }

    #[test]
    fn test_failed_insert_leaves_node_unchanged() {
        let mut node = ModelNode::new();
        let err = node.insert(1, 5).unwrap_err();
        assert_eq!(err, ModelError::IndexOutOfRange { index: 5, size: 0 });
        assert_eq!(node.get_type(), ModelType::Undefined);
        assert!(node.insert_child(1).is_err());
        assert!(!node.is_defined());

        let mut text = ModelNode::from("x");
        assert_eq!(text.insert(1, 3).unwrap_err().kind(), ErrorKind::Shape);
        assert_eq!(text, ModelNode::from("x"));

        node.insert(1, 0).unwrap();
        assert_eq!(node.get_type(), ModelType::List);
        assert_eq!(node.as_int(), Ok(1));
    }

    #[test]
    fn test_add_on_non_list_fails() {
        let mut node = ModelNode::from(1);
        assert_eq!(node.add(2).unwrap_err().kind(), ErrorKind::Shape);
        assert_eq!(node, ModelNode::from(1));

        let mut object = ModelNode::empty_object();
        assert!(object.add_child().is_err());
    }

    #[test]
    fn test_add_helpers() {
        let mut node = ModelNode::new();
        node.add_empty_object().unwrap().get_or_create("k").unwrap().set(1).unwrap();
        node.add_empty_list().unwrap().add(true).unwrap();
        node.add_property("p", "v").unwrap();
        assert_eq!(node.require(0).unwrap().get_type(), ModelType::Object);
        assert_eq!(node.require(1).unwrap().get_type(), ModelType::List);
        assert_eq!(node.require(2).unwrap().get_type(), ModelType::Property);
    }

    #[test]
    fn test_protect_blocks_mutation() {
        let mut node = ModelNode::new();
        node.get_or_create("a").unwrap().set(1).unwrap();
        node.protect();

        assert_eq!(node.set_property("a", 2).unwrap_err(), ModelError::Protected);
        assert_eq!(node.get_or_create("a").unwrap_err(), ModelError::Protected);
        assert_eq!(node.require_mut("a").unwrap_err(), ModelError::Protected);
        assert_eq!(node.remove("a").unwrap_err(), ModelError::Protected);
        assert_eq!(node.clear().unwrap_err(), ModelError::Protected);
        assert_eq!(node.require("a").unwrap().as_int(), Ok(1));
        assert!(node.require("a").unwrap().is_protected());
    }

    #[test]
    fn test_protect_is_idempotent() {
        let mut node = ModelNode::new();
        node.add(1).unwrap();
        node.protect();
        let before = node.clone();
        node.protect();
        assert!(node.is_protected());
        assert_eq!(node, before);
    }

    #[test]
    fn test_clone_is_unprotected_deep_copy() {
        let mut node = ModelNode::new();
        node.get_or_create("a").unwrap().add(1).unwrap();
        node.protect();

        let mut copy = node.clone();
        assert!(!copy.is_protected());
        assert_eq!(copy, node);
        copy.get_or_create("a").unwrap().add(2).unwrap();
        assert_ne!(copy, node);
        assert_eq!(node.require("a").unwrap().as_int(), Ok(1));
    }

    #[test]
    fn test_set_node_releases_protection() {
        let mut source = ModelNode::new();
        source.get_or_create("a").unwrap().set(1).unwrap();
        source.protect();

        let mut target = ModelNode::new();
        target.set(&source).unwrap();
        target.get_or_create("a").unwrap().set(2).unwrap();

        let mut moved = ModelNode::new();
        moved.set(source).unwrap();
        assert!(!moved.require("a").unwrap().is_protected());
    }

    #[test]
    fn test_defaults() {
        let node = ModelNode::new();
        assert_eq!(node.as_long_or(9), Ok(9));
        assert_eq!(node.as_int_or(9), Ok(9));
        assert_eq!(node.as_double_or(1.5), Ok(1.5));
        assert_eq!(node.as_boolean_or(true), Ok(true));
        assert_eq!(node.as_string_or("fallback"), "fallback");
        assert!(node.as_long().is_err());

        let defined = ModelNode::from("abc");
        assert!(defined.as_long_or(9).is_err());
        assert_eq!(defined.as_string_or("fallback"), "abc");
    }

    #[test]
    fn test_equality_and_hash() {
        let build = || {
            let mut node = ModelNode::new();
            node.get_or_create("name").unwrap().set("x").unwrap();
            node.get_or_create("list").unwrap().add(1).unwrap().add(2.5).unwrap();
            node
        };
        let a = build();
        let b = build();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(ModelNode::from(1), ModelNode::from(1i64));
    }

    #[test]
    fn test_coerce() {
        let node = ModelNode::from("7");
        assert_eq!(node.coerce(ModelType::Long), Ok(Some(ModelNode::from(7i64))));
        assert_eq!(node.coerce(ModelType::Undefined), Ok(None));
        assert!(ModelNode::from(true).coerce(ModelType::Object).is_err());
    }

    #[test]
    fn test_failure_outcome_and_description() {
        let mut ok = ModelNode::new();
        ok.get_or_create(OUTCOME).unwrap().set(SUCCESS).unwrap();
        assert!(!ok.is_failure());
        assert_eq!(ok.failure_description(), "No failure-description provided");

        let mut failed = ModelNode::new();
        failed.get_or_create(OUTCOME).unwrap().set("failed").unwrap();
        failed.get_or_create(FAILURE_DESCRIPTION).unwrap().set("boom").unwrap();
        assert!(failed.is_failure());
        assert_eq!(failed.failure_description(), "\"boom\"");

        assert!(!ModelNode::new().is_failure());
    }

    #[test]
    fn test_set_list_and_from_vec() {
        let mut node = ModelNode::new();
        node.set_list(vec![ModelNode::from(1), ModelNode::new()]).unwrap();
        assert_eq!(node.as_int(), Ok(2));
        assert_eq!(node, ModelNode::from(vec![ModelNode::from(1), ModelNode::new()]));
    }
}
