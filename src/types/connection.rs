//! Cursor-based pagination of object collections.
//!
//! A [`Connection`] exposes one page of an ordered sequence of nodes as
//! `edges`, each carrying an opaque [`Cursor`], along with a [`PageInfo`]
//! telling whether the sequence continues on either side of the page.

use std::{fmt, sync::Arc};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

use crate::{
    ast::{FromInputValue, InputValue},
    executor::{FieldError, FieldResult},
    schema::meta::TypeRef,
    types::{
        async_await::FieldFuture,
        base::{Arguments, Fields, GraphQLObject},
    },
    value::{IntoValue, Value},
};

const CURSOR_PREFIX: &str = "cursor:";

/// Opaque position of a node in a paginated sequence.
///
/// Encodes a stable key of the node, so a cursor stays valid as long as the
/// ordering of the sequence does not change.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Cursor(String);

impl Cursor {
    /// Creates the [`Cursor`] of the node with the provided stable key.
    #[must_use]
    pub fn encode(key: impl fmt::Display) -> Self {
        Self(URL_SAFE_NO_PAD.encode(format!("{CURSOR_PREFIX}{key}")))
    }

    /// Wraps a cursor received from a client, without validating it.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the key encoded in this [`Cursor`].
    pub fn decode(&self) -> FieldResult<String> {
        URL_SAFE_NO_PAD
            .decode(&self.0)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .and_then(|s| s.strip_prefix(CURSOR_PREFIX).map(str::to_owned))
            .ok_or_else(|| FieldError::invalid_cursor(&self.0))
    }

    /// Returns the encoded form of this [`Cursor`].
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromInputValue for Cursor {
    fn from_input_value(v: &InputValue) -> FieldResult<Self> {
        v.convert::<String>().map(Self)
    }
}

impl IntoValue for Cursor {
    fn into_value(self) -> FieldResult<Value> {
        Ok(Value::scalar(self.0))
    }
}

/// Window of a paginated sequence requested by a client.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConnectionArgs {
    /// Maximum number of nodes to take from the start of the window.
    pub first: Option<i32>,
    /// Only nodes strictly after this cursor are part of the window.
    pub after: Option<Cursor>,
    /// Maximum number of nodes to take from the end of the window.
    pub last: Option<i32>,
    /// Only nodes strictly before this cursor are part of the window.
    pub before: Option<Cursor>,
}

impl ConnectionArgs {
    /// Reads the `first`, `after`, `last` and `before` arguments.
    pub fn from_arguments(args: &Arguments) -> FieldResult<Self> {
        Ok(Self {
            first: args.get("first")?,
            after: args.get("after")?,
            last: args.get("last")?,
            before: args.get("before")?,
        })
    }

    /// Sets `first`.
    #[must_use]
    pub fn first(mut self, n: i32) -> Self {
        self.first = Some(n);
        self
    }

    /// Sets `after`.
    #[must_use]
    pub fn after(mut self, cursor: Cursor) -> Self {
        self.after = Some(cursor);
        self
    }

    /// Sets `last`.
    #[must_use]
    pub fn last(mut self, n: i32) -> Self {
        self.last = Some(n);
        self
    }

    /// Sets `before`.
    #[must_use]
    pub fn before(mut self, cursor: Cursor) -> Self {
        self.before = Some(cursor);
        self
    }
}

/// Node type which may be paginated through a [`Connection`].
pub trait ConnectionNode: GraphQLObject {
    /// Name of the [`Connection`] type, e.g. `FileConnection`.
    const CONNECTION_NAME: &'static str;

    /// Name of the [`Edge`] type, e.g. `FileEdge`.
    const EDGE_NAME: &'static str;
}

/// Information about a page of a [`Connection`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PageInfo {
    /// Whether the sequence continues after the page.
    pub has_next_page: bool,
    /// Whether the sequence continues before the page.
    pub has_previous_page: bool,
    /// Cursor of the first node of the page.
    pub start_cursor: Option<Cursor>,
    /// Cursor of the last node of the page.
    pub end_cursor: Option<Cursor>,
}

impl GraphQLObject for PageInfo {
    const NAME: &'static str = "PageInfo";

    fn register(fields: &mut Fields<Self>) {
        let boolean = || TypeRef::named("Boolean").non_null();

        fields.field("hasNextPage", boolean(), |p, _| {
            FieldFuture::ok(p.has_next_page).into_value()
        });
        fields.field("hasPreviousPage", boolean(), |p, _| {
            FieldFuture::ok(p.has_previous_page).into_value()
        });
        fields.field("startCursor", TypeRef::named("String"), |p, _| {
            FieldFuture::ok(p.start_cursor.clone()).into_value()
        });
        fields.field("endCursor", TypeRef::named("String"), |p, _| {
            FieldFuture::ok(p.end_cursor.clone()).into_value()
        });
    }
}

impl IntoValue for PageInfo {
    fn into_value(self) -> FieldResult<Value> {
        Arc::new(self).into_value()
    }
}

/// Node of a [`Connection`] along with its [`Cursor`].
#[derive(Debug)]
pub struct Edge<N> {
    cursor: Cursor,
    node: Arc<N>,
}

impl<N> Edge<N> {
    /// Creates a new [`Edge`].
    #[must_use]
    pub fn new(cursor: Cursor, node: Arc<N>) -> Self {
        Self { cursor, node }
    }

    /// Returns the [`Cursor`] of this [`Edge`].
    #[must_use]
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// Returns the node of this [`Edge`].
    #[must_use]
    pub fn node(&self) -> &Arc<N> {
        &self.node
    }
}

impl<N: ConnectionNode> GraphQLObject for Edge<N> {
    const NAME: &'static str = N::EDGE_NAME;

    fn register(fields: &mut Fields<Self>) {
        fields.field("cursor", TypeRef::named("String").non_null(), |e, _| {
            FieldFuture::ok(e.cursor.clone()).into_value()
        });
        fields.field("node", TypeRef::named(N::NAME), |e, _| {
            FieldFuture::ok(e.node.clone()).into_value()
        });
    }
}

impl<N: ConnectionNode> IntoValue for Edge<N> {
    fn into_value(self) -> FieldResult<Value> {
        Arc::new(self).into_value()
    }
}

/// Page of an ordered sequence of nodes.
#[derive(Debug)]
pub struct Connection<N> {
    edges: Vec<Arc<Edge<N>>>,
    page_info: Arc<PageInfo>,
}

impl<N: ConnectionNode> Connection<N> {
    /// Cuts the window requested by `args` out of `items`, identifying each
    /// node by the stable key returned by `key_fn`.
    ///
    /// A cursor matching no node fails with an
    /// [`ErrorKind::InvalidCursor`](crate::ErrorKind::InvalidCursor) error,
    /// and a negative count with an
    /// [`ErrorKind::InvalidArgument`](crate::ErrorKind::InvalidArgument) one.
    pub fn paginate<I, K, F>(items: I, args: &ConnectionArgs, key_fn: F) -> FieldResult<Self>
    where
        I: IntoIterator<Item = Arc<N>>,
        K: fmt::Display,
        F: Fn(&N) -> K,
    {
        let edges = items
            .into_iter()
            .map(|node| Edge::new(Cursor::encode(key_fn(&node)), node))
            .collect();
        Self::window(edges, args)
    }

    /// Same as [`Connection::paginate()`], using the position of each node
    /// in `items` as its key.
    pub fn paginate_by_index<I>(items: I, args: &ConnectionArgs) -> FieldResult<Self>
    where
        I: IntoIterator<Item = Arc<N>>,
    {
        let edges = items
            .into_iter()
            .enumerate()
            .map(|(i, node)| Edge::new(Cursor::encode(i), node))
            .collect();
        Self::window(edges, args)
    }

    fn window(mut edges: Vec<Edge<N>>, args: &ConnectionArgs) -> FieldResult<Self> {
        let first = args.first.map(|n| count("first", n)).transpose()?;
        let last = args.last.map(|n| count("last", n)).transpose()?;

        let position = |cursor: &Cursor| -> FieldResult<usize> {
            cursor.decode()?;
            edges
                .iter()
                .position(|e| e.cursor == *cursor)
                .ok_or_else(|| FieldError::invalid_cursor(cursor.as_str()))
        };

        let mut start = 0;
        let mut end = edges.len();
        if let Some(after) = &args.after {
            start = position(after)? + 1;
        }
        if let Some(before) = &args.before {
            end = position(before)?;
        }
        end = end.max(start);

        if let Some(first) = first {
            end = end.min(start.saturating_add(first));
        }
        if let Some(last) = last {
            start = start.max(end.saturating_sub(last));
        }

        let page_info = PageInfo {
            has_next_page: end < edges.len(),
            has_previous_page: start > 0,
            start_cursor: (start < end).then(|| edges[start].cursor.clone()),
            end_cursor: (start < end).then(|| edges[end - 1].cursor.clone()),
        };

        edges.truncate(end);
        Ok(Self {
            edges: edges.drain(start..).map(Arc::new).collect(),
            page_info: Arc::new(page_info),
        })
    }

    /// Returns the edges of this page.
    #[must_use]
    pub fn edges(&self) -> &[Arc<Edge<N>>] {
        &self.edges
    }

    /// Returns the [`PageInfo`] of this page.
    #[must_use]
    pub fn page_info(&self) -> &PageInfo {
        &self.page_info
    }
}

fn count(name: &str, n: i32) -> FieldResult<usize> {
    usize::try_from(n)
        .map_err(|_| FieldError::invalid_argument(format!("`{name}` must not be negative, got {n}")))
}

impl<N: ConnectionNode> GraphQLObject for Connection<N> {
    const NAME: &'static str = N::CONNECTION_NAME;

    fn register(fields: &mut Fields<Self>) {
        fields.field(
            "pageInfo",
            TypeRef::named(PageInfo::NAME).non_null(),
            |c, _| FieldFuture::ok(c.page_info.clone()).into_value(),
        );
        fields.field("edges", TypeRef::named(N::EDGE_NAME).list(), |c, _| {
            FieldFuture::ok(c.edges.clone()).into_value()
        });
    }
}

impl<N: ConnectionNode> IntoValue for Connection<N> {
    fn into_value(self) -> FieldResult<Value> {
        Arc::new(self).into_value()
    }
}
