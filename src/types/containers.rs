use crate::{
    executor::FieldResult,
    value::{IntoValue, Value},
};

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> FieldResult<Value> {
        match self {
            Some(v) => v.into_value(),
            None => Ok(Value::null()),
        }
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> FieldResult<Value> {
        self.into_iter()
            .map(IntoValue::into_value)
            .collect::<FieldResult<Vec<_>>>()
            .map(Value::list)
    }
}
