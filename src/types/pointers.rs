use std::sync::Arc;

use crate::{
    executor::FieldResult,
    types::base::{GraphQLObject, ObjectRef},
    value::{IntoValue, Value},
};

/// Objects convert into placeholders, their fields are resolved lazily by the
/// executor.
impl<T: GraphQLObject> IntoValue for Arc<T> {
    fn into_value(self) -> FieldResult<Value> {
        Ok(Value::Instance(ObjectRef::new(self)))
    }
}

impl<T: GraphQLObject> IntoValue for Box<T> {
    fn into_value(self) -> FieldResult<Value> {
        Arc::<T>::from(self).into_value()
    }
}

impl IntoValue for ObjectRef {
    fn into_value(self) -> FieldResult<Value> {
        Ok(Value::Instance(self))
    }
}
