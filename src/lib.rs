#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

use derive_more::with_trait::{Display, Error};
use serde::{Serialize, Serializer};

// Used by the code of implementors and by this crate's own test fixtures.
#[doc(hidden)]
pub use {async_trait::async_trait, futures, serde, static_assertions as sa};

#[doc(inline)]
pub use futures::future::BoxFuture;

mod ast;
pub mod executor;
pub(crate) mod schema;
mod types;
mod value;



pub use crate::{
    ast::{Field, FromInputValue, InlineFragment, InputValue, Selection},
    executor::{
        Cancellation, ErrorKind, ExecutionConfig, ExecutionError, ExecutionResult, Executor,
        FieldError, FieldPath, FieldResult, PathSegment, ResolutionContext, Severity, execute,
    },
    schema::{
        meta::{self, TypeRef},
        model::{Registry, RegistryBuilder},
    },
    types::{
        async_await::FieldFuture,
        base::{
            Arguments, DispatchTable, FieldBuilder, Fields, GraphQLObject, ObjectRef,
            TYPENAME_FIELD,
        },
        connection::{Connection, ConnectionArgs, ConnectionNode, Cursor, Edge, PageInfo},
        scalars::{EnumValue, ID},
    },
    value::{IntoValue, Object, ScalarValue, Value},
};

/// An error that prevented query execution
#[derive(Clone, Debug, Display, Eq, Error, PartialEq)]
pub enum GraphQLError {
    /// A framework invariant was violated while executing, e.g. an instance
    /// of an unregistered type was reached.
    #[display("Invariant violated: {_0}")]
    Invariant(#[error(not(source))] String),

    /// Two distinct types were registered under the same name.
    #[display("Type `{name}` is registered more than once")]
    DuplicateType {
        /// The contested type name.
        name: &'static str,
    },
}

impl Serialize for GraphQLError {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Helper {
            message: String,
        }

        [Helper {
            message: self.to_string(),
        }]
        .serialize(ser)
    }
}
