#![allow(missing_docs)]

use std::sync::Arc;

use indexmap::IndexMap;

use crate::{
    executor::ResolutionContext,
    schema::meta::TypeRef,
    types::{
        async_await::FieldFuture,
        base::{FieldBuilder, Fields, GraphQLObject},
        connection::{Connection, ConnectionArgs, ConnectionNode},
        scalars::ID,
    },
};

use super::store::FileStore;

fn declare_connection_args(field: FieldBuilder<'_>) {
    field
        .argument("first", TypeRef::named("Int"))
        .argument("after", TypeRef::named("String"))
        .argument("last", TypeRef::named("Int"))
        .argument("before", TypeRef::named("String"));
}

/// The root query object of the schema
pub struct Query {
    folders: IndexMap<ID, Arc<Folder>>,
    nested: Arc<NestedType>,
}

impl Query {
    pub fn new(folders: impl IntoIterator<Item = (ID, Folder)>, nested: NestedType) -> Self {
        Self {
            folders: folders
                .into_iter()
                .map(|(id, f)| (id, Arc::new(f)))
                .collect(),
            nested: Arc::new(nested),
        }
    }

    fn folder(&self, ctx: &ResolutionContext) -> FieldFuture<'_, Option<Arc<Folder>>> {
        let id = ctx.arguments().require::<ID>("id");
        FieldFuture::from_result(id.map(|id| self.folders.get(&id).cloned()))
    }

    fn folders(&self, ctx: &ResolutionContext) -> FieldFuture<'_, Connection<Folder>> {
        let page = ConnectionArgs::from_arguments(ctx.arguments())
            .and_then(|args| Connection::paginate_by_index(self.folders.values().cloned(), &args));
        FieldFuture::from_result(page)
    }

    fn nested(&self, _: &ResolutionContext) -> FieldFuture<'_, Arc<NestedType>> {
        FieldFuture::ok(self.nested.clone())
    }
}

impl GraphQLObject for Query {
    const NAME: &'static str = "Query";

    fn register(fields: &mut Fields<Self>) {
        fields
            .field("folder", TypeRef::named("Folder"), |q, ctx| {
                q.folder(ctx).into_value()
            })
            .argument("id", TypeRef::named("ID").non_null());
        declare_connection_args(fields.field(
            "folders",
            TypeRef::named("FolderConnection").non_null(),
            |q, ctx| q.folders(ctx).into_value(),
        ));
        fields.field("nested", TypeRef::named("NestedType").non_null(), |q, ctx| {
            q.nested(ctx).into_value()
        });
    }
}

/// Accessors of the `Folder` type.
pub trait FolderFields: Send + Sync + 'static {
    fn id(&self, ctx: &ResolutionContext) -> FieldFuture<'_, ID>;

    fn name(&self, ctx: &ResolutionContext) -> FieldFuture<'_, String>;

    fn unread_count(&self, ctx: &ResolutionContext) -> FieldFuture<'_, i32>;

    fn files<'a>(&'a self, ctx: &'a ResolutionContext) -> FieldFuture<'a, Connection<File>>;
}

/// A folder of files, served by any [`FolderFields`] implementation.
pub struct Folder(Box<dyn FolderFields>);

impl Folder {
    pub fn new(fields: impl FolderFields) -> Self {
        Self(Box::new(fields))
    }
}

impl GraphQLObject for Folder {
    const NAME: &'static str = "Folder";

    fn register(fields: &mut Fields<Self>) {
        fields.description("A folder of files");
        fields.field("id", TypeRef::named("ID").non_null(), |f, ctx| {
            f.0.id(ctx).into_value()
        });
        fields.field("name", TypeRef::named("String").non_null(), |f, ctx| {
            f.0.name(ctx).into_value()
        });
        fields.field("unreadCount", TypeRef::named("Int").non_null(), |f, ctx| {
            f.0.unread_count(ctx).into_value()
        });
        declare_connection_args(fields.field(
            "files",
            TypeRef::named("FileConnection").non_null(),
            |f, ctx| f.0.files(ctx).into_value(),
        ));
    }
}

impl ConnectionNode for Folder {
    const CONNECTION_NAME: &'static str = "FolderConnection";
    const EDGE_NAME: &'static str = "FolderEdge";
}

/// Folder holding its files in memory.
pub struct LocalFolder {
    pub id: ID,
    pub name: String,
    pub unread_count: i32,
    pub files: Vec<Arc<File>>,
}

impl FolderFields for LocalFolder {
    fn id(&self, _: &ResolutionContext) -> FieldFuture<'_, ID> {
        FieldFuture::ok(self.id.clone())
    }

    fn name(&self, _: &ResolutionContext) -> FieldFuture<'_, String> {
        FieldFuture::ok(self.name.clone())
    }

    fn unread_count(&self, _: &ResolutionContext) -> FieldFuture<'_, i32> {
        FieldFuture::ok(self.unread_count)
    }

    fn files<'a>(&'a self, ctx: &'a ResolutionContext) -> FieldFuture<'a, Connection<File>> {
        FieldFuture::from_result(ConnectionArgs::from_arguments(ctx.arguments()).and_then(
            |args| Connection::paginate(self.files.iter().cloned(), &args, |f| f.id.clone()),
        ))
    }
}

/// Folder listing its files from a [`FileStore`].
///
/// The store keeps no unread counters, so `unreadCount` is not served.
pub struct StoredFolder {
    pub id: ID,
    pub name: String,
    pub store: Arc<dyn FileStore>,
}

impl FolderFields for StoredFolder {
    fn id(&self, _: &ResolutionContext) -> FieldFuture<'_, ID> {
        FieldFuture::ok(self.id.clone())
    }

    fn name(&self, _: &ResolutionContext) -> FieldFuture<'_, String> {
        FieldFuture::ok(self.name.clone())
    }

    fn unread_count(&self, _: &ResolutionContext) -> FieldFuture<'_, i32> {
        FieldFuture::not_implemented("Folder.unreadCount")
    }

    fn files<'a>(&'a self, ctx: &'a ResolutionContext) -> FieldFuture<'a, Connection<File>> {
        FieldFuture::pending(async move {
            let args = ConnectionArgs::from_arguments(ctx.arguments())?;
            let files = self.store.list_files(&self.id).await?;
            Connection::paginate(files, &args, |f| f.id.clone())
        })
    }
}

/// A file inside a [`Folder`].
#[derive(Clone, Debug, PartialEq)]
pub struct File {
    pub id: ID,
    pub name: String,
    pub size: i64,
}

impl GraphQLObject for File {
    const NAME: &'static str = "File";

    fn register(fields: &mut Fields<Self>) {
        fields.field("id", TypeRef::named("ID").non_null(), |f, _| {
            FieldFuture::ok(f.id.clone()).into_value()
        });
        fields.field("name", TypeRef::named("String").non_null(), |f, _| {
            FieldFuture::ok(f.name.as_str()).into_value()
        });
        fields.field("size", TypeRef::named("Int").non_null(), |f, _| {
            FieldFuture::ok(f.size).into_value()
        });
    }
}

impl ConnectionNode for File {
    const CONNECTION_NAME: &'static str = "FileConnection";
    const EDGE_NAME: &'static str = "FileEdge";
}

/// Accessors of the `NestedType` type.
pub trait NestedFields: Send + Sync + 'static {
    fn depth(&self, ctx: &ResolutionContext) -> FieldFuture<'_, i32>;

    fn nested(&self, ctx: &ResolutionContext) -> FieldFuture<'_, Option<Arc<NestedType>>>;
}

/// Object referencing another object of its own type.
pub struct NestedType(Box<dyn NestedFields>);

impl NestedType {
    pub fn new(fields: impl NestedFields) -> Self {
        Self(Box::new(fields))
    }
}

impl GraphQLObject for NestedType {
    const NAME: &'static str = "NestedType";

    fn register(fields: &mut Fields<Self>) {
        fields.field("depth", TypeRef::named("Int").non_null(), |n, ctx| {
            n.0.depth(ctx).into_value()
        });
        fields.field("nested", TypeRef::named("NestedType"), |n, ctx| {
            n.0.nested(ctx).into_value()
        });
    }
}

/// Chain of [`NestedType`]s, ending once `max_depth` is reached.
#[derive(Clone, Copy, Debug)]
pub struct Nesting {
    pub depth: i32,
    pub max_depth: i32,
}

impl NestedFields for Nesting {
    fn depth(&self, _: &ResolutionContext) -> FieldFuture<'_, i32> {
        FieldFuture::ok(self.depth)
    }

    fn nested(&self, _: &ResolutionContext) -> FieldFuture<'_, Option<Arc<NestedType>>> {
        let next = Self {
            depth: self.depth + 1,
            max_depth: self.max_depth,
        };
        FieldFuture::ok((next.depth <= self.max_depth).then(|| Arc::new(NestedType::new(next))))
    }
}
