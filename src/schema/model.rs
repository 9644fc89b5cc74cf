use std::any::TypeId;

use fnv::FnvHashMap;
use tracing::debug;

use crate::{
    GraphQLError,
    executor::{FieldError, ResolutionContext},
    schema::meta::{FieldMeta, ObjectMeta},
    types::{
        async_await::FieldFuture,
        base::{DispatchTable, ErasedTable, GraphQLObject, ObjectRef},
        connection::{Connection, ConnectionNode, Edge, PageInfo},
    },
    value::Value,
};

/// Dispatch tables of every object type of a schema.
///
/// Built once at startup with a [`RegistryBuilder`] and read-only afterwards,
/// so it may be shared freely between concurrently executing requests.
pub struct Registry {
    tables: FnvHashMap<TypeId, Box<dyn ErasedTable>>,
    names: FnvHashMap<&'static str, TypeId>,
}

crate::sa::assert_impl_all!(Registry: Send, Sync);

impl Registry {
    /// Starts building a new [`Registry`].
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Checks whether an object type with the provided name is registered.
    #[must_use]
    pub fn is_registered(&self, type_name: &str) -> bool {
        self.names.contains_key(type_name)
    }

    /// Returns the declared shape of the named object type.
    #[must_use]
    pub fn meta(&self, type_name: &str) -> Option<&ObjectMeta> {
        let id = self.names.get(type_name)?;
        self.tables.get(id).map(|t| t.object_meta())
    }

    /// Returns the declared shape of the object type of the provided
    /// instance.
    #[must_use]
    pub fn meta_of(&self, instance: &ObjectRef) -> Option<&ObjectMeta> {
        self.tables
            .get(&instance.type_id())
            .map(|t| t.object_meta())
    }

    /// Returns the declared shape of a field of the named object type.
    #[must_use]
    pub fn field_meta(&self, type_name: &str, field_name: &str) -> Option<&FieldMeta> {
        self.meta(type_name)?.field_by_name(field_name)
    }

    /// Returns the names of all registered object types, sorted.
    #[must_use]
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names = self.names.keys().copied().collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    /// Resolves the named field of the provided instance.
    ///
    /// An instance of an unregistered type fails with an
    /// [`ErrorKind::Invariant`](crate::ErrorKind::Invariant) error.
    pub fn resolve_field<'a>(
        &'a self,
        instance: &'a ObjectRef,
        field_name: &str,
        ctx: &'a ResolutionContext,
    ) -> FieldFuture<'a, Value> {
        match self.tables.get(&instance.type_id()) {
            Some(table) => table.resolve_erased(instance, field_name, ctx),
            None => FieldFuture::err(FieldError::invariant(format!(
                "type `{}` is not registered",
                instance.type_name(),
            ))),
        }
    }
}

/// Builder of a [`Registry`].
///
/// ```rust
/// # use juniper_service::{Fields, GraphQLObject, Registry};
/// struct Query;
///
/// impl GraphQLObject for Query {
///     const NAME: &'static str = "Query";
///
///     fn register(_: &mut Fields<Self>) {}
/// }
///
/// let registry = Registry::builder()
///     .register::<Query>()
///     .and_then(|b| b.register::<Query>())
///     .map(|b| b.build())
///     .unwrap();
/// assert_eq!(registry.type_names(), ["Query"]);
/// ```
#[derive(Default)]
pub struct RegistryBuilder {
    tables: FnvHashMap<TypeId, Box<dyn ErasedTable>>,
    names: FnvHashMap<&'static str, TypeId>,
}

impl RegistryBuilder {
    /// Registers the [`DispatchTable`] of `T`.
    ///
    /// Registering the same type again does nothing, while registering
    /// another type under an already taken name fails.
    pub fn register<T: GraphQLObject>(mut self) -> Result<Self, GraphQLError> {
        let id = TypeId::of::<T>();
        match self.names.get(T::NAME) {
            Some(existing) if *existing == id => return Ok(self),
            Some(_) => return Err(GraphQLError::DuplicateType { name: T::NAME }),
            None => {}
        }

        self.names.insert(T::NAME, id);
        self.tables.insert(id, Box::new(DispatchTable::<T>::build()));
        Ok(self)
    }

    /// Registers the connection, edge and page info types of the provided
    /// node type.
    pub fn register_connection<N: ConnectionNode>(self) -> Result<Self, GraphQLError> {
        self.register::<Connection<N>>()?
            .register::<Edge<N>>()?
            .register::<PageInfo>()
    }

    /// Finishes building the [`Registry`].
    #[must_use]
    pub fn build(self) -> Registry {
        for table in self.tables.values() {
            let meta = table.object_meta();
            debug!(
                object = meta.name,
                fields = meta.fields.len(),
                "registered object type",
            );
        }
        Registry {
            tables: self.tables,
            names: self.names,
        }
    }
}
