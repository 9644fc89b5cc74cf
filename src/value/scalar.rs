use std::fmt;

use derive_more::with_trait::From;
use serde::{Serialize, Serializer};

use crate::types::scalars::{EnumValue, ID};

/// Leaf value of a [`Value`](super::Value) tree.
///
/// Covers every scalar kind a schema object can hand to the executor. Custom
/// scalars are expected to be converted into one of these kinds by their
/// [`IntoValue`](crate::IntoValue) implementation.
#[derive(Clone, Debug, From, PartialEq)]
pub enum ScalarValue {
    /// `Boolean` scalar.
    Boolean(bool),

    /// `Int` scalar, a signed 32-bit integer.
    Int(i32),

    /// `Float` scalar, always finite.
    Float(f64),

    /// `String` scalar.
    String(String),

    /// `ID` scalar, an opaque identifier.
    Id(ID),

    /// Symbol of an enum type.
    Enum(EnumValue),
}

impl ScalarValue {
    /// Returns the name of the built-in scalar kind of this value.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "Boolean",
            Self::Int(_) => "Int",
            Self::Float(_) => "Float",
            Self::String(_) => "String",
            Self::Id(_) => "ID",
            Self::Enum(_) => "Enum",
        }
    }

    /// Views this value as a [`bool`], if it is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Views this value as an [`i32`], if it is one.
    #[must_use]
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Views this value as an [`f64`].
    ///
    /// Integers are widened, as GraphQL allows an `Int` wherever a `Float` is
    /// expected.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(f64::from(*i)),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Views this value as a string slice.
    ///
    /// `ID`s and enum symbols are string-like too.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Id(id) => Some(id),
            Self::Enum(e) => Some(e.symbol()),
            _ => None,
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Id(id) => write!(f, "{:?}", &**id),
            Self::Enum(e) => write!(f, "{e}"),
        }
    }
}

impl Serialize for ScalarValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Boolean(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i32(*i),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::String(s) => serializer.serialize_str(s),
            Self::Id(id) => serializer.serialize_str(id),
            Self::Enum(e) => serializer.serialize_str(e.symbol()),
        }
    }
}
