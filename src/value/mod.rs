#[macro_use]
mod macros;
mod object;
mod scalar;

use std::fmt;

use serde::{
    Serialize, Serializer,
    ser::{Error as _, SerializeMap as _, SerializeSeq as _},
};

use crate::{executor::FieldResult, types::base::ObjectRef};

pub use self::{object::Object, scalar::ScalarValue};

/// Serializable value returned from query and field execution.
///
/// Used by the execution engine and resolvers to build up the response
/// structure. Similar to the `Json` type found in the `serialize` crate.
///
/// It is also similar to the `InputValue` type, but can not contain enum
/// values or variables. Also, lists and objects do not contain any location
/// information since they are generated by resolving fields and values rather
/// than parsing a source query.
///
/// [`Value::Instance`] is a placeholder for a schema object whose fields have
/// not been resolved yet. The executor replaces every placeholder with an
/// [`Object`] built from the requested selection, so placeholders never appear
/// in a completed response.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// `null` value.
    Null,

    /// Leaf value.
    Scalar(ScalarValue),

    /// Ordered list of values.
    List(Vec<Value>),

    /// Map of response keys to values.
    Object(Object),

    /// Unresolved schema object.
    Instance(ObjectRef),
}

impl Value {
    // CONSTRUCTORS

    /// Constructs a null value.
    #[must_use]
    pub fn null() -> Self {
        Self::Null
    }

    /// Constructs a scalar value.
    pub fn scalar<T: Into<ScalarValue>>(s: T) -> Self {
        Self::Scalar(s.into())
    }

    /// Constructs a list value.
    #[must_use]
    pub fn list(l: Vec<Self>) -> Self {
        Self::List(l)
    }

    /// Constructs an object value.
    #[must_use]
    pub fn object(o: Object) -> Self {
        Self::Object(o)
    }

    /// Converts a typed value into a [`Value`].
    ///
    /// Shortcut for [`IntoValue::into_value()`].
    pub fn from_typed<T: IntoValue>(value: T) -> FieldResult<Self> {
        value.into_value()
    }

    // DISCRIMINATORS

    /// Checks whether this value is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Checks whether this value still contains unresolved placeholders.
    #[must_use]
    pub fn has_instances(&self) -> bool {
        match self {
            Self::Instance(_) => true,
            Self::List(l) => l.iter().any(Self::has_instances),
            Self::Object(o) => o.iter().any(|(_, v)| v.has_instances()),
            Self::Null | Self::Scalar(_) => false,
        }
    }

    /// Views the underlying scalar value, if present.
    #[must_use]
    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Views the underlying string value, if present.
    #[must_use]
    pub fn as_string_value(&self) -> Option<&str> {
        self.as_scalar().and_then(ScalarValue::as_str)
    }

    /// Views the underlying integer value, if present.
    #[must_use]
    pub fn as_int_value(&self) -> Option<i32> {
        self.as_scalar().and_then(ScalarValue::as_int)
    }

    /// Views the underlying float value, if present.
    #[must_use]
    pub fn as_float_value(&self) -> Option<f64> {
        self.as_scalar().and_then(ScalarValue::as_float)
    }

    /// Views the underlying boolean value, if present.
    #[must_use]
    pub fn as_boolean_value(&self) -> Option<bool> {
        self.as_scalar().and_then(ScalarValue::as_bool)
    }

    /// Views the underlying list, if present.
    #[must_use]
    pub fn as_list_value(&self) -> Option<&Vec<Self>> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    /// Views the underlying object, if present.
    #[must_use]
    pub fn as_object_value(&self) -> Option<&Object> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Converts this value into an [`Object`], if it is one.
    #[must_use]
    pub fn into_object(self) -> Option<Object> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Views the underlying unresolved schema object, if present.
    #[must_use]
    pub fn as_instance(&self) -> Option<&ObjectRef> {
        match self {
            Self::Instance(i) => Some(i),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Scalar(s) => write!(f, "{s}"),
            Self::List(list) => {
                write!(f, "[")?;
                for (idx, item) in list.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Object(obj) => {
                write!(f, "{{")?;
                for (idx, (key, value)) in obj.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "\"{key}\": {value}")?;
                }
                write!(f, "}}")
            }
            Self::Instance(i) => write!(f, "<{}>", i.type_name()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Scalar(s) => s.serialize(serializer),
            Self::List(list) => {
                let mut seq = serializer.serialize_seq(Some(list.len()))?;
                for item in list {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(obj) => {
                let mut map = serializer.serialize_map(Some(obj.field_count()))?;
                for (key, value) in obj.iter() {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Self::Instance(i) => Err(S::Error::custom(format!(
                "unresolved `{}` instance cannot be serialized",
                i.type_name(),
            ))),
        }
    }
}

impl From<Option<Self>> for Value {
    fn from(v: Option<Self>) -> Self {
        v.unwrap_or(Self::Null)
    }
}

impl From<ScalarValue> for Value {
    fn from(s: ScalarValue) -> Self {
        Self::Scalar(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::scalar(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::scalar(s)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::scalar(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::scalar(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::scalar(b)
    }
}

impl From<Vec<Self>> for Value {
    fn from(l: Vec<Self>) -> Self {
        Self::List(l)
    }
}

/// Conversion of a statically typed accessor result into a [`Value`].
///
/// Implemented for every type a schema object may return from a field.
/// Conversions are fallible: a value with no GraphQL representation (an
/// out-of-range integer, a non-finite float) fails instead of being coerced.
pub trait IntoValue {
    /// Converts `self` into a [`Value`].
    fn into_value(self) -> FieldResult<Value>;
}

impl IntoValue for Value {
    fn into_value(self) -> FieldResult<Value> {
        Ok(self)
    }
}
