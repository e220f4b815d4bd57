//! Data model types for dynamic model trees.
//!
//! This module contains the in-memory representation:
//! - Type tags (the closed set of value kinds)
//! - Nodes (mutable cells with auto-vivifying child access and protection)
//! - Properties and expressions
//! - The coercion matrix behind the `as_*` family

mod coerce;
pub mod key;
pub mod node;
pub mod property;
pub mod types;
pub(crate) mod value;

pub(crate) use coerce::format_double;
pub use key::{ChildKey, Key};
pub use node::{FAILURE_DESCRIPTION, ModelNode, OUTCOME, SUCCESS};
pub use property::{Expression, Property};
pub use types::{ModelType, ParseModelTypeError};
