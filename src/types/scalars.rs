use std::sync::Arc;

use derive_more::with_trait::{Deref, Display, From, Into};
use serde::{Deserialize, Serialize};

use crate::{
    executor::{FieldError, FieldResult},
    value::{IntoValue, ScalarValue, Value},
};

/// An ID as defined by the GraphQL specification
///
/// Represented as a string, but can be converted _to_ from an integer as well.
#[derive(
    Clone, Debug, Deref, Deserialize, Display, Eq, From, Hash, Into, PartialEq, Serialize,
)]
#[deref(forward)]
#[from(Box<str>, String)]
#[into(Box<str>, String)]
pub struct ID(Box<str>);

impl ID {
    /// Construct a new [`ID`] from anything implementing [`Into`]`<`[`String`]`>`.
    #[must_use]
    pub fn new<S: Into<String>>(value: S) -> Self {
        ID(value.into().into())
    }
}

/// Symbol of a schema enum type, e.g. `ADMIN`.
///
/// Rust enums exposed through the schema implement [`IntoValue`] by mapping
/// each variant onto its symbol.
#[derive(Clone, Debug, Display, Eq, Hash, PartialEq)]
#[display("{_0}")]
pub struct EnumValue(Arc<str>);

impl EnumValue {
    /// Creates a new [`EnumValue`] from the given symbol.
    #[must_use]
    pub fn new(symbol: impl AsRef<str>) -> Self {
        Self(symbol.as_ref().into())
    }

    /// Returns the symbol of this [`EnumValue`].
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.0
    }
}

impl IntoValue for bool {
    fn into_value(self) -> FieldResult<Value> {
        Ok(Value::scalar(self))
    }
}

impl IntoValue for i32 {
    fn into_value(self) -> FieldResult<Value> {
        Ok(Value::scalar(self))
    }
}

impl IntoValue for i64 {
    fn into_value(self) -> FieldResult<Value> {
        i32::try_from(self)
            .map(Value::scalar)
            .map_err(|_| FieldError::from(format!("Int cannot represent value: {self}")))
    }
}

impl IntoValue for usize {
    fn into_value(self) -> FieldResult<Value> {
        i32::try_from(self)
            .map(Value::scalar)
            .map_err(|_| FieldError::from(format!("Int cannot represent value: {self}")))
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> FieldResult<Value> {
        if self.is_finite() {
            Ok(Value::scalar(self))
        } else {
            Err(format!("Float cannot represent non-finite value: {self}").into())
        }
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> FieldResult<Value> {
        f64::from(self).into_value()
    }
}

impl IntoValue for String {
    fn into_value(self) -> FieldResult<Value> {
        Ok(Value::scalar(self))
    }
}

impl IntoValue for &str {
    fn into_value(self) -> FieldResult<Value> {
        Ok(Value::scalar(self))
    }
}

impl IntoValue for ID {
    fn into_value(self) -> FieldResult<Value> {
        Ok(Value::Scalar(ScalarValue::Id(self)))
    }
}

impl IntoValue for EnumValue {
    fn into_value(self) -> FieldResult<Value> {
        Ok(Value::Scalar(ScalarValue::Enum(self)))
    }
}

impl IntoValue for ScalarValue {
    fn into_value(self) -> FieldResult<Value> {
        Ok(Value::Scalar(self))
    }
}
