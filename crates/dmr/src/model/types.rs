//! The closed set of value kinds a model node can hold.

use std::fmt;
use std::str::FromStr;

/// Kind of value held by a [`ModelNode`](crate::ModelNode).
///
/// The declaration order is the total order of the kinds. Each kind also
/// owns a single-character tag that leads its binary encoding; those tag
/// bytes are part of the wire contract and must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModelType {
    Undefined,
    Boolean,
    Int,
    Long,
    Double,
    BigInteger,
    BigDecimal,
    Bytes,
    String,
    Expression,
    List,
    Object,
    Property,
    Type,
}

impl ModelType {
    /// All kinds, in their total order.
    pub const ALL: [ModelType; 14] = [
        ModelType::Undefined,
        ModelType::Boolean,
        ModelType::Int,
        ModelType::Long,
        ModelType::Double,
        ModelType::BigInteger,
        ModelType::BigDecimal,
        ModelType::Bytes,
        ModelType::String,
        ModelType::Expression,
        ModelType::List,
        ModelType::Object,
        ModelType::Property,
        ModelType::Type,
    ];

    /// Returns the wire tag character for this kind.
    pub const fn type_char(self) -> char {
        match self {
            ModelType::Undefined => 'u',
            ModelType::Boolean => 'Z',
            ModelType::Int => 'I',
            ModelType::Long => 'J',
            ModelType::Double => 'D',
            ModelType::BigInteger => 'i',
            ModelType::BigDecimal => 'd',
            ModelType::Bytes => 'b',
            ModelType::String => 's',
            ModelType::Expression => 'e',
            ModelType::List => 'l',
            ModelType::Object => 'o',
            ModelType::Property => 'p',
            ModelType::Type => 't',
        }
    }

    /// Returns the wire tag byte for this kind.
    pub const fn tag(self) -> u8 {
        self.type_char() as u8
    }

    /// Resolves a wire tag byte back to its kind.
    ///
    /// Besides the canonical tags this also accepts `'S'`, the string tag
    /// used for text whose modified UTF-8 form exceeds the 16-bit length prefix.
    pub fn from_tag(tag: u8) -> Option<ModelType> {
        match tag {
            b'u' => Some(ModelType::Undefined),
            b'Z' => Some(ModelType::Boolean),
            b'I' => Some(ModelType::Int),
            b'J' => Some(ModelType::Long),
            b'D' => Some(ModelType::Double),
            b'i' => Some(ModelType::BigInteger),
            b'd' => Some(ModelType::BigDecimal),
            b'b' => Some(ModelType::Bytes),
            b's' | b'S' => Some(ModelType::String),
            b'e' => Some(ModelType::Expression),
            b'l' => Some(ModelType::List),
            b'o' => Some(ModelType::Object),
            b'p' => Some(ModelType::Property),
            b't' => Some(ModelType::Type),
            _ => None,
        }
    }

    /// Returns the upper-case name used in text renderings (`"BIG_DECIMAL"`).
    pub const fn name(self) -> &'static str {
        match self {
            ModelType::Undefined => "UNDEFINED",
            ModelType::Boolean => "BOOLEAN",
            ModelType::Int => "INT",
            ModelType::Long => "LONG",
            ModelType::Double => "DOUBLE",
            ModelType::BigInteger => "BIG_INTEGER",
            ModelType::BigDecimal => "BIG_DECIMAL",
            ModelType::Bytes => "BYTES",
            ModelType::String => "STRING",
            ModelType::Expression => "EXPRESSION",
            ModelType::List => "LIST",
            ModelType::Object => "OBJECT",
            ModelType::Property => "PROPERTY",
            ModelType::Type => "TYPE",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a string does not name a [`ModelType`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown model type name: {0:?}")]
pub struct ParseModelTypeError(pub String);

impl FromStr for ModelType {
    type Err = ParseModelTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelType::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| ParseModelTypeError(s.to_string()))
    }
}
