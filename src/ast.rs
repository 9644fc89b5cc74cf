use std::fmt;

use indexmap::IndexMap;

use crate::{
    executor::{FieldError, FieldResult},
    types::{
        base::Arguments,
        scalars::{EnumValue, ID},
    },
    value::ScalarValue,
};

/// A constant, already coerced argument value.
///
/// Arguments reach resolvers after an external collaborator has parsed and
/// coerced them, so no variables or source locations are kept here.
#[expect(missing_docs, reason = "self-explanatory")]
#[derive(Clone, Debug, PartialEq)]
pub enum InputValue {
    Null,
    Scalar(ScalarValue),
    List(Vec<InputValue>),
    Object(IndexMap<String, InputValue>),
}

impl InputValue {
    /// Constructs a null value.
    #[must_use]
    pub fn null() -> Self {
        Self::Null
    }

    /// Constructs a scalar value.
    pub fn scalar<T: Into<ScalarValue>>(v: T) -> Self {
        Self::Scalar(v.into())
    }

    /// Constructs a list value.
    #[must_use]
    pub fn list(l: Vec<Self>) -> Self {
        Self::List(l)
    }

    /// Constructs an object value from key-value pairs.
    pub fn object<K, I>(o: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Self)>,
    {
        Self::Object(o.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Checks whether this value is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Views the underlying scalar value, if present.
    #[must_use]
    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Converts this value into the provided type.
    pub fn convert<T: FromInputValue>(&self) -> FieldResult<T> {
        T::from_input_value(self)
    }
}

impl fmt::Display for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Scalar(s) => write!(f, "{s}"),
            Self::List(l) => {
                write!(f, "[")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Self::Object(o) => {
                write!(f, "{{")?;
                for (i, (k, v)) in o.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty),+ $(,)?) => {$(
        impl From<$ty> for InputValue {
            fn from(v: $ty) -> Self {
                Self::Scalar(v.into())
            }
        }
    )+};
}

impl_from_scalar!(ScalarValue, bool, i32, f64, &str, String, ID, EnumValue);

impl<T: Into<Self>> From<Option<T>> for InputValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Self>> From<Vec<T>> for InputValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

/// Parsing of an already coerced [`InputValue`] into a Rust type.
///
/// Coercion itself happens outside of this crate, so a mismatch here means the
/// argument bag does not match the declared argument type and is reported as
/// a request-level [`FieldError`].
pub trait FromInputValue: Sized {
    /// Performs the conversion.
    fn from_input_value(v: &InputValue) -> FieldResult<Self>;
}

fn mismatch(expected: &str, v: &InputValue) -> FieldError {
    FieldError::invalid_argument(format!("Expected `{expected}`, found: {v}"))
}

impl FromInputValue for InputValue {
    fn from_input_value(v: &InputValue) -> FieldResult<Self> {
        Ok(v.clone())
    }
}

impl FromInputValue for bool {
    fn from_input_value(v: &InputValue) -> FieldResult<Self> {
        v.as_scalar()
            .and_then(ScalarValue::as_bool)
            .ok_or_else(|| mismatch("Boolean", v))
    }
}

impl FromInputValue for i32 {
    fn from_input_value(v: &InputValue) -> FieldResult<Self> {
        v.as_scalar()
            .and_then(ScalarValue::as_int)
            .ok_or_else(|| mismatch("Int", v))
    }
}

impl FromInputValue for f64 {
    fn from_input_value(v: &InputValue) -> FieldResult<Self> {
        v.as_scalar()
            .and_then(ScalarValue::as_float)
            .ok_or_else(|| mismatch("Float", v))
    }
}

impl FromInputValue for String {
    fn from_input_value(v: &InputValue) -> FieldResult<Self> {
        match v {
            InputValue::Scalar(ScalarValue::String(s)) => Ok(s.clone()),
            _ => Err(mismatch("String", v)),
        }
    }
}

impl FromInputValue for ID {
    fn from_input_value(v: &InputValue) -> FieldResult<Self> {
        match v {
            InputValue::Scalar(ScalarValue::Id(id)) => Ok(id.clone()),
            InputValue::Scalar(ScalarValue::String(s)) => Ok(ID::new(s.as_str())),
            InputValue::Scalar(ScalarValue::Int(i)) => Ok(ID::new(i.to_string())),
            _ => Err(mismatch("ID", v)),
        }
    }
}

impl FromInputValue for EnumValue {
    fn from_input_value(v: &InputValue) -> FieldResult<Self> {
        match v {
            InputValue::Scalar(ScalarValue::Enum(e)) => Ok(e.clone()),
            _ => Err(mismatch("enum symbol", v)),
        }
    }
}

impl<T: FromInputValue> FromInputValue for Option<T> {
    fn from_input_value(v: &InputValue) -> FieldResult<Self> {
        match v {
            InputValue::Null => Ok(None),
            v => v.convert().map(Some),
        }
    }
}

impl<T: FromInputValue> FromInputValue for Vec<T> {
    fn from_input_value(v: &InputValue) -> FieldResult<Self> {
        match v {
            InputValue::List(l) => l.iter().map(T::from_input_value).collect(),
            // Input coercion wraps a single item into a list.
            other => other.convert().map(|e| vec![e]),
        }
    }
}

/// Field of a selection set.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    /// Response key override.
    pub alias: Option<String>,

    /// Name of the field in the schema.
    pub name: String,

    /// Coerced arguments of this field.
    pub arguments: Arguments,

    /// Sub-selection, empty for leaf fields.
    pub selection_set: Vec<Selection>,
}

impl Field {
    /// Creates a new leaf [`Field`] selection without arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            alias: None,
            name: name.into(),
            arguments: Arguments::new(),
            selection_set: Vec::new(),
        }
    }

    /// Sets the response key of this [`Field`].
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Adds an argument to this [`Field`].
    #[must_use]
    pub fn argument(mut self, name: impl Into<String>, value: impl Into<InputValue>) -> Self {
        self.arguments = self.arguments.with(name, value);
        self
    }

    /// Appends sub-selections to this [`Field`].
    #[must_use]
    pub fn select<I, S>(mut self, selections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Selection>,
    {
        self.selection_set
            .extend(selections.into_iter().map(Into::into));
        self
    }

    /// Returns the key under which this [`Field`] appears in the response.
    #[must_use]
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Inline fragment of a selection set, optionally restricted to a type.
#[derive(Clone, Debug, PartialEq)]
pub struct InlineFragment {
    /// Concrete type name this fragment applies to, if any.
    pub type_condition: Option<String>,

    /// Selections applied when the condition matches.
    pub selection_set: Vec<Selection>,
}

impl InlineFragment {
    /// Creates a new [`InlineFragment`] applying to the given type only.
    pub fn on(type_name: impl Into<String>) -> Self {
        Self {
            type_condition: Some(type_name.into()),
            selection_set: Vec::new(),
        }
    }

    /// Appends selections to this [`InlineFragment`].
    #[must_use]
    pub fn select<I, S>(mut self, selections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Selection>,
    {
        self.selection_set
            .extend(selections.into_iter().map(Into::into));
        self
    }
}

/// Entry in a selection set.
#[expect(missing_docs, reason = "self-explanatory")]
#[derive(Clone, Debug, PartialEq)]
pub enum Selection {
    Field(Field),
    InlineFragment(InlineFragment),
}

impl From<Field> for Selection {
    fn from(f: Field) -> Self {
        Self::Field(f)
    }
}

impl From<InlineFragment> for Selection {
    fn from(f: InlineFragment) -> Self {
        Self::InlineFragment(f)
    }
}

impl From<&str> for Selection {
    fn from(name: &str) -> Self {
        Self::Field(Field::new(name))
    }
}
