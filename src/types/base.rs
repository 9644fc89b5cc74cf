use std::{
    any::{Any, TypeId},
    fmt,
    sync::Arc,
};

use indexmap::IndexMap;

use crate::{
    ast::{FromInputValue, InputValue},
    executor::{FieldError, FieldResult, ResolutionContext},
    schema::meta::{ArgumentMeta, DeprecationStatus, FieldMeta, ObjectMeta, TypeRef},
    types::async_await::FieldFuture,
    value::Value,
};

/// Name of the field every object answers with its own type name.
pub const TYPENAME_FIELD: &str = "__typename";

/**
Primary trait used to expose Rust types as schema objects

An implementor declares its schema type name and registers one resolver per
field into a [`Fields`] builder. The resulting [`DispatchTable`] is built once
by the [`Registry`](crate::Registry) and shared by every instance of the type.

Each resolver receives the instance and the [`ResolutionContext`] of the
field, calls a typed accessor and converts its [`FieldFuture`] into a
[`Value`] with [`FieldFuture::into_value()`]. Arguments declared with a
non-null type are checked for presence before the resolver runs.

## Example

```rust
use juniper_service::{
    FieldFuture, Fields, GraphQLObject, ResolutionContext, TypeRef,
};

struct User {
    name: String,
}

impl User {
    fn name(&self, _: &ResolutionContext) -> FieldFuture<'_, &str> {
        FieldFuture::ok(self.name.as_str())
    }

    fn greeting<'a>(&'a self, ctx: &'a ResolutionContext) -> FieldFuture<'a, String> {
        let greeting = ctx.arguments().require::<String>("greeting");
        FieldFuture::pending(async move { Ok(format!("{}, {}!", greeting?, self.name)) })
    }
}

impl GraphQLObject for User {
    const NAME: &'static str = "User";

    fn register(fields: &mut Fields<Self>) {
        fields.field("name", TypeRef::named("String").non_null(), |u, ctx| {
            u.name(ctx).into_value()
        });
        fields
            .field("greeting", TypeRef::named("String"), |u, ctx| {
                u.greeting(ctx).into_value()
            })
            .argument("greeting", TypeRef::named("String").non_null());
    }
}
```
*/
pub trait GraphQLObject: Send + Sync + 'static {
    /// Name of the schema type, as reported by `__typename`.
    const NAME: &'static str;

    /// Registers resolvers of every field of this type.
    fn register(fields: &mut Fields<Self>)
    where
        Self: Sized;
}

/// Type-erased shared reference to an instance of a [`GraphQLObject`].
///
/// Cloning is cheap. Two [`ObjectRef`]s are equal when they point to the very
/// same instance.
#[derive(Clone)]
pub struct ObjectRef {
    type_id: TypeId,
    type_name: &'static str,
    instance: Arc<dyn Any + Send + Sync>,
}

impl ObjectRef {
    /// Erases the provided instance.
    pub fn new<T: GraphQLObject>(instance: Arc<T>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: T::NAME,
            instance,
        }
    }

    /// Returns the schema type name of the instance.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the [`TypeId`] of the concrete Rust type of the instance.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Views the instance as the provided concrete type, if it is one.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.instance.downcast_ref()
    }

    /// Returns a typed shared reference to the instance, if it is a `T`.
    #[must_use]
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.instance.clone().downcast().ok()
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && Arc::ptr_eq(&self.instance, &other.instance)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("type_name", &self.type_name)
            .field("instance", &Arc::as_ptr(&self.instance))
            .finish()
    }
}

/// Field argument container
///
/// Holds arguments already coerced to their declared types, keyed by name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Arguments {
    args: IndexMap<String, InputValue>,
}

impl Arguments {
    /// Creates an empty argument container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an argument to this container, replacing a previous one with the
    /// same name.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<InputValue>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }

    /// Get and convert an argument into the desired type.
    ///
    /// Returns `None` if the argument is absent or `null`, and fails if it is
    /// present but cannot be converted into `T`.
    pub fn get<T: FromInputValue>(&self, name: &str) -> FieldResult<Option<T>> {
        match self.args.get(name) {
            None | Some(InputValue::Null) => Ok(None),
            Some(v) => v
                .convert()
                .map(Some)
                .map_err(|e| FieldError::invalid_argument(format!("`{name}`: {}", e.message()))),
        }
    }

    /// Same as [`Arguments::get()`], but fails if the argument is absent or
    /// `null`.
    pub fn require<T: FromInputValue>(&self, name: &str) -> FieldResult<T> {
        self.get(name)?
            .ok_or_else(|| FieldError::missing_argument(name))
    }

    /// Checks whether a non-`null` argument with the given name is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.args.get(name).is_some_and(|v| !v.is_null())
    }

    /// Returns the raw value of an argument.
    #[must_use]
    pub fn raw(&self, name: &str) -> Option<&InputValue> {
        self.args.get(name)
    }

    /// Iterates over the arguments, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &InputValue)> {
        self.args.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Checks whether there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Arguments
where
    K: Into<String>,
    V: Into<InputValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            args: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

type Resolver<T> =
    Box<dyn for<'a> Fn(&'a T, &'a ResolutionContext) -> FieldFuture<'a, Value> + Send + Sync>;

struct FieldEntry<T> {
    meta: FieldMeta,
    resolver: Resolver<T>,
}

/// Builder of the [`DispatchTable`] of a [`GraphQLObject`].
pub struct Fields<T> {
    description: Option<String>,
    entries: IndexMap<&'static str, FieldEntry<T>>,
}

impl<T: GraphQLObject> Fields<T> {
    fn new() -> Self {
        Self {
            description: None,
            entries: IndexMap::new(),
        }
    }

    /// Sets the description of the object type.
    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    /// Registers a field of the provided declared type, resolved by the
    /// provided `resolver`.
    ///
    /// Registering a field under an already used name replaces it.
    pub fn field<F>(
        &mut self,
        name: &'static str,
        field_type: TypeRef,
        resolver: F,
    ) -> FieldBuilder<'_>
    where
        F: for<'a> Fn(&'a T, &'a ResolutionContext) -> FieldFuture<'a, Value>
            + Send
            + Sync
            + 'static,
    {
        let entry = FieldEntry {
            meta: FieldMeta::new(name, field_type),
            resolver: Box::new(resolver),
        };
        let (idx, _) = self.entries.insert_full(name, entry);
        FieldBuilder {
            meta: &mut self.entries[idx].meta,
        }
    }

    fn into_table(mut self) -> DispatchTable<T> {
        // Reserved, so it overrides whatever was registered under its name.
        let typename = FieldEntry {
            meta: FieldMeta::new(TYPENAME_FIELD, TypeRef::named("String").non_null()),
            resolver: Box::new(|_, _| FieldFuture::ok(Value::scalar(T::NAME))),
        };
        self.entries.insert(TYPENAME_FIELD, typename);

        let (fields, resolvers): (IndexMap<_, _>, IndexMap<_, _>) = self
            .entries
            .into_iter()
            .map(|(name, e)| ((name, e.meta), (name, e.resolver)))
            .unzip();

        DispatchTable {
            meta: ObjectMeta {
                name: T::NAME,
                description: self.description,
                fields,
            },
            resolvers,
        }
    }
}

/// Refines a field registered with [`Fields::field()`].
#[derive(Debug)]
pub struct FieldBuilder<'f> {
    meta: &'f mut FieldMeta,
}

impl FieldBuilder<'_> {
    /// Declares an argument of this field.
    pub fn argument(self, name: &'static str, arg_type: TypeRef) -> Self {
        self.meta.arguments.push(ArgumentMeta { name, arg_type });
        self
    }

    /// Sets the description of this field.
    pub fn description(self, description: impl Into<String>) -> Self {
        self.meta.description = Some(description.into());
        self
    }

    /// Marks this field as deprecated, with an optional reason.
    pub fn deprecated(self, reason: Option<&str>) -> Self {
        self.meta.deprecation_status = DeprecationStatus::Deprecated(reason.map(Into::into));
        self
    }
}

/// Field resolvers of a [`GraphQLObject`], keyed by field name.
///
/// Built once per type and never mutated afterwards.
pub struct DispatchTable<T> {
    meta: ObjectMeta,
    resolvers: IndexMap<&'static str, Resolver<T>>,
}

impl<T: GraphQLObject> DispatchTable<T> {
    /// Builds the [`DispatchTable`] of `T` by running its
    /// [`GraphQLObject::register()`].
    #[must_use]
    pub fn build() -> Self {
        let mut fields = Fields::new();
        T::register(&mut fields);
        fields.into_table()
    }

    /// Returns the declared shape of `T`.
    #[must_use]
    pub fn meta(&self) -> &ObjectMeta {
        &self.meta
    }

    /// Resolves the named field of the provided `instance`.
    ///
    /// Unknown fields and absent non-null arguments fail without running any
    /// resolver.
    pub fn resolve<'a>(
        &'a self,
        instance: &'a T,
        field_name: &str,
        ctx: &'a ResolutionContext,
    ) -> FieldFuture<'a, Value> {
        let (Some(resolver), Some(meta)) = (
            self.resolvers.get(field_name),
            self.meta.field_by_name(field_name),
        ) else {
            return FieldFuture::err(FieldError::unknown_field(T::NAME, field_name));
        };

        let args = ctx.arguments();
        if let Some(missing) = meta
            .arguments
            .iter()
            .find(|a| a.is_required() && !args.contains(a.name))
        {
            return FieldFuture::err(FieldError::missing_argument(missing.name));
        }

        resolver(instance, ctx)
    }
}

impl<T> fmt::Debug for DispatchTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTable")
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

/// [`DispatchTable`] with its instance type erased, as stored in a
/// [`Registry`](crate::Registry).
pub(crate) trait ErasedTable: Send + Sync {
    fn object_meta(&self) -> &ObjectMeta;

    fn resolve_erased<'a>(
        &'a self,
        instance: &'a ObjectRef,
        field_name: &str,
        ctx: &'a ResolutionContext,
    ) -> FieldFuture<'a, Value>;
}

impl<T: GraphQLObject> ErasedTable for DispatchTable<T> {
    fn object_meta(&self) -> &ObjectMeta {
        &self.meta
    }

    fn resolve_erased<'a>(
        &'a self,
        instance: &'a ObjectRef,
        field_name: &str,
        ctx: &'a ResolutionContext,
    ) -> FieldFuture<'a, Value> {
        match instance.downcast_ref::<T>() {
            Some(i) => self.resolve(i, field_name, ctx),
            None => FieldFuture::err(FieldError::invariant(format!(
                "dispatch table of `{}` received an instance of `{}`",
                T::NAME,
                instance.type_name(),
            ))),
        }
    }
}
