//! Name/value pairs and unresolved expressions.

use crate::model::ModelNode;

/// An immutable name/value pair.
///
/// Properties are held by property nodes and are what
/// [`ModelNode::as_property`] and [`ModelNode::as_property_list`] hand out.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Property {
    pub(crate) name: String,
    pub(crate) value: ModelNode,
}

impl Property {
    /// Creates a property. The value is moved in; pass a clone to keep the original.
    pub fn new(name: impl Into<String>, value: impl Into<ModelNode>) -> Self {
        Self {
            name: name.into(),
            value: value.into().released(),
        }
    }

    /// Returns the property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the property value.
    pub fn value(&self) -> &ModelNode {
        &self.value
    }

    /// Splits the property into its name and value.
    pub fn into_parts(self) -> (String, ModelNode) {
        (self.name, self.value)
    }
}

/// A string carrying unresolved `${...}` placeholders.
///
/// Stored as its own model type so it is never confused with plain text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expression(String);

impl Expression {
    pub fn new(expression: impl Into<String>) -> Self {
        Self(expression.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for Expression {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Expression {
    fn from(value: String) -> Self {
        Self(value)
    }
}
