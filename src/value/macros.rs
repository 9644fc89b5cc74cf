/// Construct JSON-like [`Value`]s by using JSON syntax.
///
/// Mostly used for building expected results in tests and `extensions` data
/// of [`FieldError`]s.
///
/// ```rust
/// # use juniper_service::{graphql_value, Value};
/// #
/// # let _: Value =
/// graphql_value!(null);
/// # let _: Value =
/// graphql_value!(1234);
/// # let _: Value =
/// graphql_value!("test");
/// # let _: Value =
/// graphql_value!([1234, "test", true]);
/// # let _: Value =
/// graphql_value!({"key": "value", "foo": 1234});
/// ```
///
/// [`FieldError`]: crate::FieldError
/// [`Value`]: crate::Value
#[macro_export]
macro_rules! graphql_value {
    (null) => {
        $crate::Value::Null
    };

    ([]) => {
        $crate::Value::list(::std::vec::Vec::new())
    };

    ([ $($elem:tt),+ $(,)? ]) => {
        $crate::Value::list(::std::vec![ $( $crate::graphql_value!($elem) ),+ ])
    };

    ({}) => {
        $crate::Value::object($crate::Object::with_capacity(0))
    };

    ({ $($key:literal : $val:tt),+ $(,)? }) => {
        $crate::Value::object(
            [ $( ($key, $crate::graphql_value!($val)) ),+ ]
                .into_iter()
                .collect::<$crate::Object>(),
        )
    };

    ($e:expr) => {
        $crate::Value::from($e)
    };
}
